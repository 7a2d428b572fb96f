//! Output-layout sensitivity analysis.
//!
//! Answers: could the matched operator's output memory layout reach the
//! program's observable output without first passing through an operator
//! that redefines layout? The search walks backward from each graph output
//! through argument lists and stops at layout-defining operators.
//!
//! This is a heuristic in the sense that it does not prove stride equality;
//! it errs on the side of caution. Returning `true` for a candidate that
//! cannot actually affect output strides only costs the optimization;
//! returning `false` for one that can would break the output-stride
//! contract.

use std::sync::Arc;

use zarya_ir::graph::{Arg, Graph, Node, OpKind};

use crate::error::*;

/// Traversal depth budget. Real traces are nowhere near this deep; running
/// past it means a malformed or cyclic graph and is reported as an error
/// rather than looping forever.
pub const MAX_TRAVERSAL_DEPTH: usize = 100_000;

/// Whether the candidate's output may flow to a graph output without an
/// intervening layout-defining operator.
pub fn result_layout_affects_graph_output(graph: &Graph, candidate: &Arc<Node>) -> Result<bool> {
    for output in graph.outputs() {
        if reaches_without_layout_cut(output, candidate)? {
            return Ok(true);
        }
    }
    Ok(false)
}

enum Item<'a> {
    Node(&'a Arc<Node>),
    Arg(&'a Arg),
}

/// Depth-first worklist search from `start` backward toward `candidate`.
///
/// Each stack entry carries its remaining depth; unwrapping an argument or a
/// list element consumes one level, mirroring a recursive formulation while
/// staying stack-safe.
fn reaches_without_layout_cut(start: &Arc<Node>, candidate: &Arc<Node>) -> Result<bool> {
    let mut stack: Vec<(Item<'_>, usize)> = vec![(Item::Node(start), MAX_TRAVERSAL_DEPTH)];

    while let Some((item, depth)) = stack.pop() {
        if depth == 0 {
            return TraversalDepthExceededSnafu { budget: MAX_TRAVERSAL_DEPTH }.fail();
        }
        match item {
            Item::Node(node) => {
                if node.id == candidate.id {
                    return Ok(true);
                }
                // Layout-defining operators cut the search: whatever feeds
                // them cannot leak its strides past this point.
                if node.op != OpKind::Output && node.op.is_layout_defining() {
                    continue;
                }
                for arg in &node.args {
                    stack.push((Item::Arg(arg), depth - 1));
                }
            }
            Item::Arg(arg) => match arg {
                Arg::Node(node) => stack.push((Item::Node(node), depth)),
                Arg::List(items) => {
                    for sub in items {
                        stack.push((Item::Arg(sub), depth - 1));
                    }
                }
                Arg::Int(_) | Arg::Float(_) => {}
            },
        }
    }

    Ok(false)
}
