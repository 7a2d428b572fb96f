use std::collections::HashMap;
use std::sync::Arc;

use zarya_dtype::{DType, DeviceKind};

use crate::graph::{Graph, Node, OpKind};
use crate::pattern::*;
use crate::{Dim, TensorDescriptor};

fn desc(shape: &[usize]) -> TensorDescriptor {
    TensorDescriptor::contiguous(
        shape.iter().map(|&d| Dim::from(d)),
        DType::Float32,
        DeviceKind::Cuda(0),
    )
}

fn mm_pattern() -> TemplateFn {
    Arc::new(|args| {
        let [mat1, mat2] = args else {
            return crate::error::ExampleAritySnafu { rule: "mm", expected: 2usize, got: args.len() }.fail();
        };
        Ok(Node::new(OpKind::Mm, vec![mat1.clone().into(), mat2.clone().into()], None))
    })
}

#[test]
fn test_register_traces_pattern_once() {
    let mut rules = RuleSet::new();
    let replacement: ReplacementFn = Arc::new(|m| Ok(m.output_node().clone()));
    let guard: GuardFn = Arc::new(|_| Ok(true));

    register_replacement(
        &mut rules,
        "mm",
        mm_pattern(),
        replacement,
        &[desc(&[4, 4]), desc(&[4, 4])],
        TraceMode::FwdOnly,
        guard,
        Vec::new(),
    )
    .unwrap();

    assert_eq!(rules.len(), 1);
    let rule = rules.iter().next().unwrap();
    assert_eq!(rule.pattern().op, OpKind::Mm);
    assert_eq!(rule.pattern().args.len(), 2);
}

#[test]
fn test_register_rejects_wrong_arity() {
    let mut rules = RuleSet::new();
    let replacement: ReplacementFn = Arc::new(|m| Ok(m.output_node().clone()));
    let guard: GuardFn = Arc::new(|_| Ok(true));

    let result = register_replacement(
        &mut rules,
        "mm",
        mm_pattern(),
        replacement,
        &[desc(&[4, 4])],
        TraceMode::FwdOnly,
        guard,
        Vec::new(),
    );
    assert!(result.is_err());
    assert!(rules.is_empty());
}

#[test]
fn test_guard_sees_match_kwargs() {
    let mut graph = Graph::new();
    let mat1 = graph.insert(Node::placeholder(desc(&[6, 8])));
    let mat2 = graph.insert(Node::placeholder(desc(&[8, 6])));
    let mm = graph.add(OpKind::Mm, vec![mat1.clone().into(), mat2.clone().into()], Some(desc(&[6, 6])));
    graph.mark_output(vec![mm.clone().into()]);

    let kwargs = HashMap::from([("mat1".to_string(), mat1), ("mat2".to_string(), mat2)]);
    let m = Match::new(Arc::new(graph), kwargs, mm);

    let guard: GuardFn = Arc::new(|m| {
        let mat1 = m.kwarg_descriptor("mat1").expect("mat1 capture");
        Ok(mat1.shape[0].as_concrete() == Some(6))
    });
    assert!(guard(&m).unwrap());
    assert_eq!(m.output_node().op, OpKind::Mm);
}
