//! Accelerator throughput and bandwidth characteristics.
//!
//! Static datasheet figures for the accelerators the cost model knows about.
//! Lookups for anything else fail with [`Error::UnknownAccelerator`]; callers
//! that can tolerate it (the roofline estimator) degrade to an optimistic
//! default instead of blocking.

use snafu::OptionExt;
use zarya_dtype::DType;

use crate::error::*;

/// Peak dense throughput (TFLOP/s) and memory bandwidth (GB/s) of one
/// accelerator model.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProps {
    pub name: &'static str,
    pub tflops_f16: f64,
    pub tflops_bf16: f64,
    pub tflops_f32: f64,
    /// Tensor-core f32 path with reduced mantissa; used only when the caller
    /// allows the precision trade.
    pub tflops_tf32: f64,
    pub tflops_f64: f64,
    pub dram_gbps: f64,
}

/// Known accelerator models, dense (non-sparse) datasheet numbers.
pub static KNOWN_DEVICES: &[DeviceProps] = &[
    DeviceProps {
        name: "NVIDIA A100",
        tflops_f16: 312.0,
        tflops_bf16: 312.0,
        tflops_f32: 19.5,
        tflops_tf32: 156.0,
        tflops_f64: 9.7,
        dram_gbps: 2039.0,
    },
    DeviceProps {
        name: "NVIDIA H100",
        tflops_f16: 989.5,
        tflops_bf16: 989.5,
        tflops_f32: 66.9,
        tflops_tf32: 494.7,
        tflops_f64: 33.5,
        dram_gbps: 3350.0,
    },
    DeviceProps {
        name: "NVIDIA GeForce RTX 4090",
        tflops_f16: 165.2,
        tflops_bf16: 165.2,
        tflops_f32: 82.6,
        tflops_tf32: 82.6,
        tflops_f64: 1.3,
        dram_gbps: 1008.0,
    },
];

impl DeviceProps {
    /// Look a device up by its reported model name.
    ///
    /// Matching is by substring so driver-decorated names ("NVIDIA A100-SXM4-80GB")
    /// resolve to their table entry.
    pub fn lookup(device_name: &str) -> Result<&'static DeviceProps> {
        KNOWN_DEVICES
            .iter()
            .find(|props| device_name.contains(props.name) || props.name.contains(device_name))
            .context(UnknownAcceleratorSnafu { device: device_name })
    }

    /// Peak throughput in TFLOP/s for a dtype.
    ///
    /// For f32 the tf32 figure is substituted when the caller permits the
    /// reduced-precision tensor-core path.
    pub fn peak_tflops(&self, dtype: DType, allow_tf32: bool) -> Result<f64> {
        match dtype {
            DType::Float16 => Ok(self.tflops_f16),
            DType::BFloat16 => Ok(self.tflops_bf16),
            DType::Float32 if allow_tf32 => Ok(self.tflops_tf32),
            DType::Float32 => Ok(self.tflops_f32),
            DType::Float64 => Ok(self.tflops_f64),
            _ => UnsupportedDTypeSnafu { device: self.name, dtype }.fail(),
        }
    }
}
