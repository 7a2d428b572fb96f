//! Rewrite-rule registration interface.
//!
//! The host pattern-matching engine consumes rules registered here: each rule
//! pairs a structural pattern template (traced once over small example
//! descriptors) with a replacement builder and a guard predicate that must
//! re-evaluate `true` against the concrete match before the substitution is
//! applied. The one-time trace establishes structure only; shapes are
//! re-resolved per real match.

use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::{Graph, Node};
use crate::{Result, TensorDescriptor};

/// Tracing context a rule is registered for.
///
/// Rules are registered twice: once against the joint forward+backward trace
/// and once against the forward-only trace, so the rewrite fires regardless
/// of which pipeline produced the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceMode {
    FwdOnly,
    JointFwdBwd,
}

/// A concrete match handed to guards and replacement builders.
///
/// `kwargs` maps the pattern's named captures to the matched producer nodes;
/// `output` is the node whose value the rewrite would replace.
#[derive(Debug, Clone)]
pub struct Match {
    graph: Arc<Graph>,
    kwargs: HashMap<String, Arc<Node>>,
    output: Arc<Node>,
}

impl Match {
    pub fn new(graph: Arc<Graph>, kwargs: HashMap<String, Arc<Node>>, output: Arc<Node>) -> Self {
        Self { graph, kwargs, output }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Named sub-capture from the pattern.
    pub fn kwarg(&self, name: &str) -> Option<&Arc<Node>> {
        self.kwargs.get(name)
    }

    /// Descriptor of a named capture, if the node carries one.
    pub fn kwarg_descriptor(&self, name: &str) -> Option<&TensorDescriptor> {
        self.kwargs.get(name).and_then(|n| n.descriptor())
    }

    /// The matched operator node whose output would be rewritten.
    pub fn output_node(&self) -> &Arc<Node> {
        &self.output
    }
}

/// Guard outcome: `Ok(false)` declines the rewrite, `Err` aborts the
/// compilation - guards must not swallow internal invariant violations.
pub type GuardResult = std::result::Result<bool, Box<dyn std::error::Error + Send + Sync>>;

pub type GuardFn = Arc<dyn Fn(&Match) -> GuardResult + Send + Sync>;

/// Builds a graph template from example (or matched) placeholder nodes.
pub type TemplateFn = Arc<dyn Fn(&[Arc<Node>]) -> Result<Arc<Node>> + Send + Sync>;

/// Replacement outcome; errors abort the rewrite and surface to the caller.
pub type ReplacementResult = std::result::Result<Arc<Node>, Box<dyn std::error::Error + Send + Sync>>;

/// Builds the replacement subgraph for a concrete match.
pub type ReplacementFn = Arc<dyn Fn(&Match) -> ReplacementResult + Send + Sync>;

/// A registered pattern/replacement pair with its guard.
pub struct RewriteRule {
    pub name: &'static str,
    /// Structural template traced from the example descriptors.
    pattern: Arc<Node>,
    replacement: ReplacementFn,
    pub trace_mode: TraceMode,
    /// Scalar captures the engine cannot recover structurally, keyed by
    /// argument name with a magic sentinel value substituted during tracing.
    pub scalar_workaround: Vec<(&'static str, f64)>,
    guard: GuardFn,
}

impl RewriteRule {
    pub fn pattern(&self) -> &Arc<Node> {
        &self.pattern
    }

    /// Re-evaluate the guard against a concrete match.
    pub fn guard_passes(&self, m: &Match) -> GuardResult {
        (self.guard)(m)
    }

    /// Build the replacement subgraph for a concrete match.
    pub fn build_replacement(&self, m: &Match) -> ReplacementResult {
        (self.replacement)(m)
    }
}

impl std::fmt::Debug for RewriteRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteRule")
            .field("name", &self.name)
            .field("trace_mode", &self.trace_mode)
            .field("scalar_workaround", &self.scalar_workaround)
            .finish_non_exhaustive()
    }
}

/// The rule collection a pattern-matching pass runs against.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RewriteRule> {
        self.rules.iter()
    }
}

/// Register a guarded rewrite rule.
///
/// The pattern builder is traced once, here, over placeholders built from the
/// example descriptors - sizes and values do not matter for the initial
/// trace, only structure. The guard and replacement run per concrete match.
#[allow(clippy::too_many_arguments)]
pub fn register_replacement(
    rule_set: &mut RuleSet,
    name: &'static str,
    pattern: TemplateFn,
    replacement: ReplacementFn,
    example_args: &[TensorDescriptor],
    trace_mode: TraceMode,
    guard: GuardFn,
    scalar_workaround: Vec<(&'static str, f64)>,
) -> Result<()> {
    let placeholders: Vec<Arc<Node>> = example_args.iter().cloned().map(Node::placeholder).collect();
    let traced = pattern(&placeholders)?;
    rule_set.rules.push(RewriteRule {
        name,
        pattern: traced,
        replacement,
        trace_mode,
        scalar_workaround,
        guard,
    });
    Ok(())
}
