//! Analytic compute- vs. memory-bound classification.
//!
//! Padding only helps matmuls that are limited by arithmetic throughput: it
//! adds memory traffic, so a bandwidth-limited shape can only lose. The
//! classification compares the shape's arithmetic intensity against the
//! device's machine balance.

use zarya_device::KernelBackend;
use zarya_dtype::DType;

/// Fraction of the datasheet machine balance actually demanded before a
/// shape counts as compute-bound. The dram figure underestimates effective
/// bandwidth because of cache, so the balance is derated rather than taken
/// at face value.
const MACHINE_BALANCE_DERATING: f64 = 0.5;

/// Whether an `m x k` by `k x n` matmul is compute-bound on the target.
///
/// When device characteristics cannot be obtained the answer is an
/// optimistic `true`: the benchmarking stage downstream is the final
/// authority, so an unknown accelerator should not block padding here.
pub fn is_compute_bound(
    m: usize,
    k: usize,
    n: usize,
    dtype: DType,
    allow_tf32: bool,
    backend: &dyn KernelBackend,
) -> bool {
    let denominator = m * k + n * k + m * n;
    if denominator == 0 {
        return false;
    }
    let arithmetic_intensity = (m * n * k) as f64 / denominator as f64;

    let characteristics = backend
        .device_props()
        .and_then(|props| Ok((props.peak_tflops(dtype, allow_tf32)?, props.dram_gbps)));
    let machine_balance = match characteristics {
        Ok((tflops, dram_gbps)) => (1000.0 * tflops) / dram_gbps * MACHINE_BALANCE_DERATING,
        Err(error) => {
            tracing::debug!(%error, "device characteristics unavailable, assuming compute-bound");
            return true;
        }
    };

    arithmetic_intensity > machine_balance
}
