//! Empirical timing for candidate execution paths.
//!
//! Runs a callable a fixed number of warmup iterations (discarded), then a
//! fixed number of timed iterations, synchronizing the device before every
//! clock read so queued accelerator work cannot leak into the next sample.

use std::time::{Duration, Instant};

use crate::backend::KernelBackend;

/// Configuration for path benchmarking.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of warmup runs (not timed).
    pub warmup_runs: usize,
    /// Number of timing runs.
    pub timing_runs: usize,
    /// Whether to return minimum time (true) or mean (false).
    pub take_minimum: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self { warmup_runs: 5, timing_runs: 10, take_minimum: true }
    }
}

/// Time a callable under the given configuration.
///
/// Blocking and synchronous: each sample is bracketed by a device
/// synchronization so the reading covers all work the callable queued.
pub fn do_bench<F: FnMut()>(backend: &dyn KernelBackend, config: &BenchmarkConfig, mut f: F) -> Duration {
    for _ in 0..config.warmup_runs {
        f();
    }
    backend.synchronize();

    let mut runs = Vec::with_capacity(config.timing_runs);
    for _ in 0..config.timing_runs {
        let start = Instant::now();
        f();
        backend.synchronize();
        runs.push(start.elapsed());
    }

    if config.take_minimum {
        runs.iter().copied().min().unwrap_or(Duration::ZERO)
    } else {
        let total: Duration = runs.iter().sum();
        total / runs.len().max(1) as u32
    }
}
