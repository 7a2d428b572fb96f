//! Shared test fixtures: a counting mock backend and descriptor builders.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use zarya_device::{BenchmarkConfig, DeviceProps, FixedLayout, KernelBackend};
use zarya_dtype::{DType, DeviceKind};
use zarya_ir::{Dim, TensorDescriptor};

use crate::bench::PadContext;
use crate::cache::DecisionCache;
use crate::config::PadConfig;

/// Mock kernel backend that counts interactions, so tests can observe
/// whether benchmarking actually ran.
pub struct CountingBackend {
    pub available: bool,
    pub template_needs_alignment: bool,
    pub device_name: &'static str,
    pub probe_calls: AtomicUsize,
    pub sync_calls: AtomicUsize,
}

impl CountingBackend {
    fn build(available: bool, template_needs_alignment: bool, device_name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            available,
            template_needs_alignment,
            device_name,
            probe_calls: AtomicUsize::new(0),
            sync_calls: AtomicUsize::new(0),
        })
    }

    pub fn a100() -> Arc<Self> {
        Self::build(true, false, "NVIDIA A100")
    }

    pub fn unavailable() -> Arc<Self> {
        Self::build(false, false, "NVIDIA A100")
    }

    pub fn with_template_requirement() -> Arc<Self> {
        Self::build(true, true, "NVIDIA A100")
    }

    pub fn probes(&self) -> usize {
        self.probe_calls.load(Ordering::Relaxed)
    }

    pub fn syncs(&self) -> usize {
        self.sync_calls.load(Ordering::Relaxed)
    }
}

impl KernelBackend for CountingBackend {
    fn is_available(&self) -> bool {
        self.available
    }

    fn device_props(&self) -> zarya_device::Result<&DeviceProps> {
        DeviceProps::lookup(self.device_name)
    }

    fn template_requires_alignment(&self, _layout: &FixedLayout) -> zarya_device::Result<bool> {
        self.probe_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.template_needs_alignment)
    }

    fn synchronize(&self) {
        self.sync_calls.fetch_add(1, Ordering::Relaxed);
    }
}

/// Context with an in-memory cache and a fast benchmark configuration.
pub fn test_ctx(config: PadConfig, backend: Arc<CountingBackend>) -> PadContext {
    let mut ctx = PadContext::new(config, DecisionCache::in_memory(), backend);
    ctx.bench = BenchmarkConfig { warmup_runs: 1, timing_runs: 2, take_minimum: true };
    ctx
}

pub fn cuda_desc(shape: &[usize], dtype: DType) -> TensorDescriptor {
    TensorDescriptor::contiguous(shape.iter().map(|&d| Dim::from(d)), dtype, DeviceKind::Cuda(0))
}
