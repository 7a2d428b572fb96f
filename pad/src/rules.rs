//! Rewrite-rule registration for the matmul family.
//!
//! Registers mm, bmm and addmm pattern/replacement pairs, each in both the
//! joint forward+backward and forward-only tracing contexts. Example
//! descriptors establish structure only; the guard re-evaluates the full
//! eligibility + layout + benchmark decision against every concrete match
//! before a substitution is applied.

use std::sync::Arc;

use zarya_dtype::{DType, DeviceKind};
use zarya_ir::error::{ExampleAritySnafu, MissingCaptureSnafu};
use zarya_ir::graph::{Arg, Node, OpKind};
use zarya_ir::pattern::{
    GuardFn, GuardResult, Match, ReplacementFn, RuleSet, TemplateFn, TraceMode, register_replacement,
};
use zarya_ir::{Dim, TensorDescriptor};

use crate::bench::{PadContext, should_pad_bench};
use crate::eligibility::should_pad_common;
use crate::error::*;
use crate::layout::result_layout_affects_graph_output;
use crate::trace::TraceNode;
use crate::transform::{MatmulKind, PaddingPlan, pad_matmul};

// Scalar captures cannot be recovered structurally from the trace; these
// magic sentinel values stand in for beta/alpha so the engine can map them
// back to the original arguments.
const ADDMM_BETA_SENTINEL: f64 = 0.213377;
const ADDMM_ALPHA_SENTINEL: f64 = 0.113377;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Register all six padding rules against a rule set.
pub fn register_pad_rules(rule_set: &mut RuleSet, ctx: Arc<PadContext>) -> Result<()> {
    for kind in [MatmulKind::Mm, MatmulKind::Bmm, MatmulKind::Addmm] {
        for trace_mode in [TraceMode::JointFwdBwd, TraceMode::FwdOnly] {
            register_replacement(
                rule_set,
                rule_name(kind),
                pattern_for(kind),
                replacement_for(kind, ctx.clone()),
                &example_args(kind),
                trace_mode,
                guard_for(kind, ctx.clone()),
                scalar_workaround(kind),
            )
            .map_err(|source| Error::Registration { source })?;
        }
    }
    Ok(())
}

fn rule_name(kind: MatmulKind) -> &'static str {
    match kind {
        MatmulKind::Mm => "pad_mm",
        MatmulKind::Bmm => "pad_bmm",
        MatmulKind::Addmm => "pad_addmm",
    }
}

fn scalar_workaround(kind: MatmulKind) -> Vec<(&'static str, f64)> {
    match kind {
        MatmulKind::Addmm => {
            vec![("beta", ADDMM_BETA_SENTINEL), ("alpha", ADDMM_ALPHA_SENTINEL)]
        }
        _ => Vec::new(),
    }
}

/// Small fixed example shapes; sizes and values do not matter for the
/// initial trace - shapes are re-resolved per real match.
fn example_args(kind: MatmulKind) -> Vec<TensorDescriptor> {
    let device = DeviceKind::Cuda(0);
    let dim2 = || TensorDescriptor::contiguous([Dim::from(4), Dim::from(4)], DType::Float32, device);
    let dim3 = || {
        TensorDescriptor::contiguous([Dim::from(4), Dim::from(4), Dim::from(4)], DType::Float32, device)
    };
    let dim1 = || TensorDescriptor::contiguous([Dim::from(4)], DType::Float32, device);

    match kind {
        MatmulKind::Mm => vec![dim2(), dim2()],
        MatmulKind::Bmm => vec![dim3(), dim3()],
        MatmulKind::Addmm => vec![dim1(), dim2(), dim2()],
    }
}

fn pattern_for(kind: MatmulKind) -> TemplateFn {
    Arc::new(move |args| match kind {
        MatmulKind::Mm | MatmulKind::Bmm => {
            let [mat1, mat2] = args else {
                return ExampleAritySnafu { rule: rule_name(kind), expected: 2usize, got: args.len() }
                    .fail();
            };
            let op = if kind.is_batched() { OpKind::Bmm } else { OpKind::Mm };
            Ok(Node::new(op, vec![mat1.clone().into(), mat2.clone().into()], None))
        }
        MatmulKind::Addmm => {
            let [input, mat1, mat2] = args else {
                return ExampleAritySnafu { rule: rule_name(kind), expected: 3usize, got: args.len() }
                    .fail();
            };
            Ok(Node::new(
                OpKind::Addmm,
                vec![
                    input.clone().into(),
                    mat1.clone().into(),
                    mat2.clone().into(),
                    Arg::Float(ADDMM_BETA_SENTINEL),
                    Arg::Float(ADDMM_ALPHA_SENTINEL),
                ],
                None,
            ))
        }
    })
}

/// The guard composed of the layout check, the structural pre-filter and
/// the benchmark-backed decision, re-evaluated per concrete match.
fn guard_for(kind: MatmulKind, ctx: Arc<PadContext>) -> GuardFn {
    Arc::new(move |m: &Match| -> GuardResult {
        if ctx.config.keep_output_stride
            && result_layout_affects_graph_output(m.graph(), m.output_node())
                .map_err(|e| Box::new(e) as BoxedError)?
        {
            return Ok(false);
        }

        let (Some(mat1), Some(mat2)) = (m.kwarg_descriptor("mat1"), m.kwarg_descriptor("mat2"))
        else {
            return Ok(false);
        };
        let input = match (kind.has_bias(), m.kwarg_descriptor("input")) {
            (true, Some(input)) => Some(input),
            (true, None) => return Ok(false),
            (false, _) => None,
        };

        if !should_pad_common(&ctx.config, mat1, mat2, input) {
            return Ok(false);
        }
        should_pad_bench(&ctx, mat1, mat2, kind, input).map_err(|e| Box::new(e) as BoxedError)
    })
}

fn replacement_for(kind: MatmulKind, ctx: Arc<PadContext>) -> ReplacementFn {
    Arc::new(move |m: &Match| {
        let capture = |name: &str| -> std::result::Result<TraceNode, BoxedError> {
            let node = m
                .kwarg(name)
                .ok_or_else(|| MissingCaptureSnafu { name }.build())
                .map_err(|e| Box::new(e) as BoxedError)?;
            TraceNode::from_node(node).map_err(|e| Box::new(e) as BoxedError)
        };

        let mat1 = capture("mat1")?;
        let mat2 = capture("mat2")?;
        let bias = if kind.has_bias() { Some(capture("input")?) } else { None };
        let (beta, alpha) = scalars_from(m.output_node());

        let plan = PaddingPlan::compute(
            kind,
            mat1.descriptor(),
            mat2.descriptor(),
            bias.as_ref().map(TraceNode::descriptor),
            &ctx.config,
        );
        pad_matmul(kind, &mat1, &mat2, bias.as_ref(), &plan, beta, alpha)
            .map(TraceNode::into_node)
            .map_err(|e| Box::new(e) as BoxedError)
    })
}

/// Recover beta/alpha from the matched operator node's scalar arguments.
fn scalars_from(node: &Arc<Node>) -> (f64, f64) {
    let float_arg = |i: usize| {
        node.args.get(i).and_then(|arg| match arg {
            Arg::Float(v) => Some(*v),
            _ => None,
        })
    };
    match node.op {
        OpKind::Addmm => (float_arg(3).unwrap_or(1.0), float_arg(4).unwrap_or(1.0)),
        _ => (1.0, 1.0),
    }
}
