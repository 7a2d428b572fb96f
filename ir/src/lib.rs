//! Graph-level intermediate representation for the zarya rewrite pipeline.
//!
//! # Module Organization
//!
//! - [`dim`] - Symbolic dimensions (concrete or hint-carrying)
//! - [`shape`] - Shape utilities over symbolic dimensions
//! - [`descriptor`] - Compile-time tensor metadata
//! - [`graph`] - Functional dataflow graph
//! - [`pattern`] - Rewrite-rule registration interface
//! - [`error`] - Error types and result handling

pub mod descriptor;
pub mod dim;
pub mod error;
pub mod graph;
pub mod pattern;
pub mod shape;


pub use descriptor::TensorDescriptor;
pub use dim::Dim;
pub use error::{Error, Result};
pub use graph::{Arg, Graph, Node, OpKind};
pub use pattern::{
    GuardFn, GuardResult, Match, ReplacementFn, ReplacementResult, RewriteRule, RuleSet, TemplateFn,
    TraceMode, register_replacement,
};
pub use shape::Shape;

// Re-export external types for convenience
pub use zarya_dtype::{DType, DeviceKind};
