//! Shape-padding rewrite pass for matmul operators.
//!
//! Matmul kernels are fastest when their M/K/N extents meet a per-dtype
//! alignment boundary. This pass decides - per candidate, with a persistent
//! benchmark-backed cache behind an analytic cost model - whether padding
//! the operands, running the padded matmul and slicing the result back is
//! faster than the unpadded operator, and registers the graph rewrite that
//! performs the substitution.
//!
//! # Module Organization
//!
//! - [`alignment`] - per-dtype alignment boundaries and pad amounts
//! - [`config`] - pass flags (builder + environment)
//! - [`eligibility`] - structural pre-filter
//! - [`layout`] - output-layout sensitivity analysis
//! - [`roofline`] - compute- vs. memory-bound classification
//! - [`cache`] - persistent decision cache
//! - [`bench`] - the benchmark-backed decision procedure
//! - [`transform`] - the generic padding/unpadding rewrite
//! - [`eager`] / [`trace`] - tensor-level and graph-level instantiations
//! - [`rules`] - rewrite-rule registration

pub mod alignment;
pub mod bench;
pub mod cache;
pub mod config;
pub mod eager;
pub mod eligibility;
pub mod error;
pub mod layout;
pub mod roofline;
pub mod rules;
pub mod trace;
pub mod transform;

#[cfg(test)]
mod test;

pub use alignment::{alignment_for, padding_needed};
pub use bench::{PadContext, should_pad_bench};
pub use cache::{DecisionCache, decision_key};
pub use config::PadConfig;
pub use eligibility::should_pad_common;
pub use error::{Error, Result};
pub use layout::result_layout_affects_graph_output;
pub use roofline::is_compute_bound;
pub use rules::register_pad_rules;
pub use trace::TraceNode;
pub use transform::{MatmulKind, PadValue, PaddingPlan, pad_matmul};
