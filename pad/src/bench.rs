//! Benchmark-backed padding decision.
//!
//! `should_pad_bench` is the full decision procedure: derive the padding
//! plan, short-circuit the trivially-false and mandatorily-true cases,
//! consult the analytic cost model, then - only if still ambiguous - consult
//! or populate the persistent decision cache by actually timing both paths
//! on materialized tensors.

use std::sync::Arc;

use zarya_device::{BenchmarkConfig, FixedLayout, KernelBackend, do_bench};
use zarya_dtype::DType;
use zarya_ir::{Dim, TensorDescriptor};
use zarya_tensor::Tensor;

use crate::cache::{DecisionCache, decision_key};
use crate::config::PadConfig;
use crate::error::*;
use crate::roofline::is_compute_bound;
use crate::transform::{MatmulKind, PaddingPlan, pad_matmul};

/// Ratio the unpadded time must exceed before padding wins. Shape padding
/// introduces extra memory ops; the 10% margin absorbs their overhead.
const PAD_SPEEDUP_THRESHOLD: f64 = 1.1;

/// Everything the padding decision needs, explicitly injected.
pub struct PadContext {
    pub config: PadConfig,
    pub cache: DecisionCache,
    pub backend: Arc<dyn KernelBackend>,
    pub bench: BenchmarkConfig,
}

impl PadContext {
    pub fn new(config: PadConfig, cache: DecisionCache, backend: Arc<dyn KernelBackend>) -> Self {
        Self { config, cache, backend, bench: BenchmarkConfig::default() }
    }
}

/// Decide whether padding this candidate is worth it.
///
/// Pure-analytic early exits never touch the cache (cache lookups do file
/// IO); the benchmark result is cached keyed by shapes, strides, dtypes,
/// operator, tf32 flag and the force override.
pub fn should_pad_bench(
    ctx: &PadContext,
    mat1: &TensorDescriptor,
    mat2: &TensorDescriptor,
    kind: MatmulKind,
    input: Option<&TensorDescriptor>,
) -> Result<bool> {
    let plan = PaddingPlan::compute(kind, mat1, mat2, input, &ctx.config);
    if plan.is_noop() {
        return Ok(false);
    }

    if ctx.config.force_shape_pad {
        return Ok(true);
    }

    // A specialized template may itself require this alignment, making
    // padding mandatory rather than a speed heuristic. The probe cannot be
    // planned against symbolic extents; that is treated as not-applicable.
    let (batch, m, k, n) = kind.dims(mat1, mat2);
    match probe_template(ctx.backend.as_ref(), mat1, batch, m, n) {
        Ok(true) => return Ok(true),
        Ok(false) => {}
        Err(error) => {
            tracing::debug!(%error, "specialized template probe not applicable");
        }
    }

    if !ctx.backend.is_available() {
        return Ok(false);
    }

    let (m_hint, k_hint, n_hint) = (
        m.hint().unwrap_or(0),
        k.hint().unwrap_or(0),
        n.hint().unwrap_or(0),
    );
    if !is_compute_bound(m_hint, k_hint, n_hint, mat1.dtype, ctx.config.allow_tf32, ctx.backend.as_ref()) {
        return Ok(false);
    }

    let tf32 = (mat1.dtype == DType::Float32).then_some(ctx.config.allow_tf32);
    let key = decision_key(kind, mat1, mat2, input, tf32, ctx.config.force_shape_pad);
    if let Some(cached) = ctx.cache.lookup(&key) {
        tracing::debug!(key = %key, decision = cached, "pad decision cache hit");
        return Ok(cached);
    }

    let decision = benchmark_decision(ctx, mat1, mat2, kind, input, &plan)?;
    ctx.cache.store(&key, decision);
    Ok(decision)
}

fn probe_template(
    backend: &dyn KernelBackend,
    mat1: &TensorDescriptor,
    batch: Dim,
    m: Dim,
    n: Dim,
) -> zarya_device::Result<bool> {
    let numel_hint = |a: Dim, b: Dim| match (a.as_concrete(), b.as_concrete()) {
        (Some(a), Some(b)) => Dim::from(a * b),
        _ => Dim::unhinted(),
    };
    let layout = FixedLayout::try_new(
        mat1.device,
        mat1.dtype,
        &[batch, m, n],
        &[numel_hint(m, n), n, Dim::from(1)],
    )?;
    backend.template_requires_alignment(&layout)
}

/// Materialize operands, time both paths, and apply the decision threshold.
fn benchmark_decision(
    ctx: &PadContext,
    mat1: &TensorDescriptor,
    mat2: &TensorDescriptor,
    kind: MatmulKind,
    input: Option<&TensorDescriptor>,
    plan: &PaddingPlan,
) -> Result<bool> {
    let mat1_t = Tensor::materialize(mat1).map_err(|source| Error::Materialize { source })?;
    let mat2_t = Tensor::materialize(mat2).map_err(|source| Error::Materialize { source })?;
    let input_t = match input {
        Some(desc) => Some(Tensor::materialize(desc).map_err(|source| Error::Materialize { source })?),
        None => None,
    };

    // Validate both paths once before timing, so shape bugs surface as
    // errors instead of garbage timings.
    run_unpadded(kind, &mat1_t, &mat2_t, input_t.as_ref())
        .map_err(|source| Error::BenchmarkReferenceFailed { kind, source })?;

    let mat1_pad = mat1_t.rand_like().map_err(|source| Error::Materialize { source })?;
    let mat2_pad = mat2_t.rand_like().map_err(|source| Error::Materialize { source })?;
    let input_pad = match &input_t {
        Some(t) => Some(t.rand_like().map_err(|source| Error::Materialize { source })?),
        None => None,
    };
    pad_matmul(kind, &mat1_pad, &mat2_pad, input_pad.as_ref(), plan, 1.0, 1.0)?;

    let ori_time = do_bench(ctx.backend.as_ref(), &ctx.bench, || {
        let _ = run_unpadded(kind, &mat1_t, &mat2_t, input_t.as_ref());
    });
    let pad_time = do_bench(ctx.backend.as_ref(), &ctx.bench, || {
        let _ = pad_matmul(kind, &mat1_pad, &mat2_pad, input_pad.as_ref(), plan, 1.0, 1.0);
    });

    let decision = ctx.config.skip_benchmark_comparison
        || ori_time.as_secs_f64() > pad_time.as_secs_f64() * PAD_SPEEDUP_THRESHOLD;
    tracing::debug!(
        %kind,
        ori_ms = ori_time.as_secs_f64() * 1e3,
        pad_ms = pad_time.as_secs_f64() * 1e3,
        decision,
        "pad benchmark complete"
    );
    Ok(decision)
}

fn run_unpadded(
    kind: MatmulKind,
    mat1: &Tensor,
    mat2: &Tensor,
    input: Option<&Tensor>,
) -> zarya_tensor::Result<Tensor> {
    match (kind, input) {
        (MatmulKind::Mm, _) | (MatmulKind::Addmm, None) => mat1.mm(mat2),
        (MatmulKind::Bmm, _) => mat1.bmm(mat2),
        (MatmulKind::Addmm, Some(bias)) => Tensor::addmm(bias, mat1, mat2, 1.0, 1.0),
    }
}
