//! Device layer consumed by the zarya rewrite pipeline.
//!
//! - [`props`] - accelerator throughput and bandwidth characteristics
//! - [`backend`] - kernel-generation backend capability interface
//! - [`timer`] - empirical benchmark timing
//! - [`error`] - error types

pub mod backend;
pub mod error;
pub mod props;
pub mod timer;

pub use backend::{FixedLayout, KernelBackend};
pub use error::{Error, Result};
pub use props::{DeviceProps, KNOWN_DEVICES};
pub use timer::{BenchmarkConfig, do_bench};
