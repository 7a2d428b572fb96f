use std::collections::HashMap;
use std::sync::Arc;

use zarya_dtype::DType;
use zarya_ir::graph::{Arg, Graph, Node, OpKind};
use zarya_ir::pattern::{Match, RuleSet, TraceMode};

use crate::bench::PadContext;
use crate::config::PadConfig;
use crate::rules::register_pad_rules;
use crate::test::helpers::{CountingBackend, cuda_desc, test_ctx};

fn ctx(config: PadConfig) -> Arc<PadContext> {
    Arc::new(test_ctx(config, CountingBackend::a100()))
}

fn decisive_config() -> PadConfig {
    PadConfig::builder()
        .shape_padding(true)
        .allow_tf32(false)
        .skip_benchmark_comparison(true)
        .build()
}

/// Graph with a matched mm candidate; `cut` controls whether a
/// layout-defining operator stands between the candidate and the output.
fn mm_match(cut: bool) -> Match {
    let mut graph = Graph::new();
    let mat1 = graph.insert(Node::placeholder(cuda_desc(&[17, 17], DType::Float32)));
    let mat2 = graph.insert(Node::placeholder(cuda_desc(&[17, 17], DType::Float32)));
    let mm = graph.add(
        OpKind::Mm,
        vec![mat1.clone().into(), mat2.clone().into()],
        Some(cuda_desc(&[17, 17], DType::Float32)),
    );
    let tail = if cut {
        graph.add(OpKind::Contiguous, vec![mm.clone().into()], None)
    } else {
        graph.add(OpKind::Softmax, vec![mm.clone().into()], None)
    };
    graph.mark_output(vec![tail.into()]);

    let kwargs = HashMap::from([("mat1".to_string(), mat1), ("mat2".to_string(), mat2)]);
    Match::new(Arc::new(graph), kwargs, mm)
}

#[test]
fn test_registers_all_six_rules() {
    let mut rules = RuleSet::new();
    register_pad_rules(&mut rules, ctx(PadConfig::default())).unwrap();
    assert_eq!(rules.len(), 6);

    let names: Vec<_> = rules.iter().map(|r| r.name).collect();
    for name in ["pad_mm", "pad_bmm", "pad_addmm"] {
        assert_eq!(names.iter().filter(|n| **n == name).count(), 2, "{name} needs both trace modes");
    }
    for mode in [TraceMode::FwdOnly, TraceMode::JointFwdBwd] {
        assert_eq!(rules.iter().filter(|r| r.trace_mode == mode).count(), 3);
    }
}

#[test]
fn test_traced_patterns_have_expected_structure() {
    let mut rules = RuleSet::new();
    register_pad_rules(&mut rules, ctx(PadConfig::default())).unwrap();

    for rule in rules.iter() {
        let pattern = rule.pattern();
        match rule.name {
            "pad_mm" => {
                assert_eq!(pattern.op, OpKind::Mm);
                assert_eq!(pattern.args.len(), 2);
            }
            "pad_bmm" => {
                assert_eq!(pattern.op, OpKind::Bmm);
                assert_eq!(pattern.args.len(), 2);
            }
            "pad_addmm" => {
                assert_eq!(pattern.op, OpKind::Addmm);
                assert_eq!(pattern.args.len(), 5);
                assert!(!rule.scalar_workaround.is_empty());
            }
            other => panic!("unexpected rule {other}"),
        }
    }
}

#[test]
fn test_guard_rejects_when_disabled() {
    let mut rules = RuleSet::new();
    register_pad_rules(&mut rules, ctx(PadConfig::default())).unwrap();
    let m = mm_match(true);
    for rule in rules.iter().filter(|r| r.name == "pad_mm") {
        assert!(!rule.guard_passes(&m).unwrap());
    }
}

#[test]
fn test_guard_rejects_layout_sensitive_output() {
    // candidate output flows to the graph output through a
    // stride-propagating op only
    let mut rules = RuleSet::new();
    register_pad_rules(&mut rules, ctx(decisive_config())).unwrap();
    let m = mm_match(false);
    for rule in rules.iter().filter(|r| r.name == "pad_mm") {
        assert!(!rule.guard_passes(&m).unwrap());
    }
}

#[test]
fn test_guard_accepts_cut_candidate() {
    let mut rules = RuleSet::new();
    register_pad_rules(&mut rules, ctx(decisive_config())).unwrap();
    let m = mm_match(true);
    for rule in rules.iter().filter(|r| r.name == "pad_mm") {
        assert!(rule.guard_passes(&m).unwrap());
    }
}

#[test]
fn test_guard_skips_layout_check_without_keep_output_stride() {
    let config = PadConfig::builder()
        .shape_padding(true)
        .allow_tf32(false)
        .skip_benchmark_comparison(true)
        .keep_output_stride(false)
        .build();
    let mut rules = RuleSet::new();
    register_pad_rules(&mut rules, ctx(config)).unwrap();
    let m = mm_match(false);
    for rule in rules.iter().filter(|r| r.name == "pad_mm") {
        assert!(rule.guard_passes(&m).unwrap());
    }
}

/// Depth-first search for an operator kind in a replacement subgraph.
fn find_op(node: &Arc<Node>, op: OpKind) -> Option<Arc<Node>> {
    if node.op == op {
        return Some(node.clone());
    }
    fn walk(arg: &Arg, op: OpKind) -> Option<Arc<Node>> {
        match arg {
            Arg::Node(n) => find_op(n, op),
            Arg::List(items) => items.iter().find_map(|a| walk(a, op)),
            _ => None,
        }
    }
    node.args.iter().find_map(|a| walk(a, op))
}

#[test]
fn test_replacement_builds_pad_and_shrink() {
    let mut rules = RuleSet::new();
    register_pad_rules(&mut rules, ctx(decisive_config())).unwrap();
    let m = mm_match(true);

    let rule = rules.iter().find(|r| r.name == "pad_mm").unwrap();
    let replacement = rule.build_replacement(&m).unwrap();

    // all three extents of a 17-cube need padding; the result is sliced back
    let root_desc = replacement.descriptor().unwrap();
    assert_eq!(root_desc.shape_hints().unwrap().as_slice(), &[17, 17]);
    assert_eq!(replacement.op, OpKind::Shrink);
    assert!(find_op(&replacement, OpKind::ConstantPad).is_some());
    let mm = find_op(&replacement, OpKind::Mm).unwrap();
    assert_eq!(mm.descriptor().unwrap().shape_hints().unwrap().as_slice(), &[20, 20]);
}

#[test]
fn test_replacement_recovers_addmm_scalars() {
    let mut graph = Graph::new();
    let bias = graph.insert(Node::placeholder(cuda_desc(&[17, 17], DType::Float32)));
    let mat1 = graph.insert(Node::placeholder(cuda_desc(&[17, 17], DType::Float32)));
    let mat2 = graph.insert(Node::placeholder(cuda_desc(&[17, 17], DType::Float32)));
    let addmm = graph.add(
        OpKind::Addmm,
        vec![
            bias.clone().into(),
            mat1.clone().into(),
            mat2.clone().into(),
            Arg::Float(0.25),
            Arg::Float(0.75),
        ],
        Some(cuda_desc(&[17, 17], DType::Float32)),
    );
    let contiguous = graph.add(OpKind::Contiguous, vec![addmm.clone().into()], None);
    graph.mark_output(vec![contiguous.into()]);

    let kwargs = HashMap::from([
        ("input".to_string(), bias),
        ("mat1".to_string(), mat1),
        ("mat2".to_string(), mat2),
    ]);
    let m = Match::new(Arc::new(graph), kwargs, addmm);

    let mut rules = RuleSet::new();
    register_pad_rules(&mut rules, ctx(decisive_config())).unwrap();
    let rule = rules.iter().find(|r| r.name == "pad_addmm").unwrap();
    let replacement = rule.build_replacement(&m).unwrap();

    let inner = find_op(&replacement, OpKind::Addmm).unwrap();
    let floats: Vec<f64> = inner
        .args
        .iter()
        .filter_map(|a| match a {
            Arg::Float(v) => Some(*v),
            _ => None,
        })
        .collect();
    assert_eq!(floats, vec![0.25, 0.75]);
}
