//! Kernel-generation backend abstraction.
//!
//! The padding pass never talks to a code generator directly; it consumes a
//! [`KernelBackend`] that answers capability questions (is any kernel
//! generator present, does a specialized template itself demand aligned
//! shapes) and provides the device synchronization the benchmark timer needs
//! for valid readings.

use smallvec::SmallVec;
use zarya_dtype::{DType, DeviceKind};
use zarya_ir::Dim;

use crate::error::*;
use crate::props::DeviceProps;

/// A concrete output layout a specialized kernel template is probed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedLayout {
    pub device: DeviceKind,
    pub dtype: DType,
    pub size: SmallVec<[usize; 3]>,
    pub stride: SmallVec<[usize; 3]>,
}

impl FixedLayout {
    /// Build from possibly-symbolic dimensions.
    ///
    /// Fails on any symbolic dimension: specialized templates are planned
    /// against exact extents, hints are not a substitute here.
    pub fn try_new(device: DeviceKind, dtype: DType, size: &[Dim], stride: &[Dim]) -> Result<Self> {
        let concrete_size: Option<SmallVec<[usize; 3]>> = size.iter().map(|d| d.as_concrete()).collect();
        let concrete_stride: Option<SmallVec<[usize; 3]>> = stride.iter().map(|d| d.as_concrete()).collect();
        match (concrete_size, concrete_stride) {
            (Some(size), Some(stride)) => Ok(Self { device, dtype, size, stride }),
            _ => SymbolicLayoutSnafu { shape: size.iter().copied().collect::<zarya_ir::Shape>() }.fail(),
        }
    }
}

/// Capability interface of the kernel-generation layer.
pub trait KernelBackend: Send + Sync {
    /// Whether a kernel generator exists for the target at all. Without one
    /// there is nothing to benchmark against.
    fn is_available(&self) -> bool;

    /// Throughput characteristics of the target device.
    fn device_props(&self) -> Result<&DeviceProps>;

    /// Whether a specialized high-performance template would itself require
    /// the probed layout to be aligned. Errors for layouts the template
    /// cannot be planned against (callers treat that as "not applicable").
    fn template_requires_alignment(&self, layout: &FixedLayout) -> Result<bool>;

    /// Block until all queued device work has completed. The benchmark timer
    /// calls this before reading elapsed time.
    fn synchronize(&self) {}
}
