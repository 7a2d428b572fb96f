//! Padding pass configuration.
//!
//! Typed flags with bon builders and environment-variable fallbacks.

use bon::bon;

/// Flags controlling the shape-padding pass.
#[derive(Debug, Clone)]
pub struct PadConfig {
    /// Master enable. Nothing is considered without it.
    pub shape_padding: bool,

    /// When set, a candidate whose output layout could leak into the
    /// program's observable output strides is rejected.
    pub keep_output_stride: bool,

    /// Override: pad whenever any dimension needs it, skipping the
    /// cost model and benchmarking. Debug/testing escape hatch.
    pub force_shape_pad: bool,

    /// Allow trading an N-dimension padding for an explicit operand
    /// transpose, which keeps downstream epilogue fusions alive.
    pub shape_pad_use_transpose: bool,

    /// Whether the reduced-precision tensor-core path may be used for f32.
    /// Participates in decision-cache keys.
    pub allow_tf32: bool,

    /// Test-only: skip the timing comparison and pad whenever the
    /// benchmarking stage is reached.
    pub skip_benchmark_comparison: bool,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            shape_padding: false,
            keep_output_stride: true,
            force_shape_pad: false,
            shape_pad_use_transpose: false,
            allow_tf32: true,
            skip_benchmark_comparison: false,
        }
    }
}

#[bon]
impl PadConfig {
    /// Create a pass configuration with builder pattern.
    #[builder]
    pub fn new(
        #[builder(default = false)] shape_padding: bool,
        #[builder(default = true)] keep_output_stride: bool,
        #[builder(default = false)] force_shape_pad: bool,
        #[builder(default = false)] shape_pad_use_transpose: bool,
        #[builder(default = true)] allow_tf32: bool,
        #[builder(default = false)] skip_benchmark_comparison: bool,
    ) -> Self {
        Self {
            shape_padding,
            keep_output_stride,
            force_shape_pad,
            shape_pad_use_transpose,
            allow_tf32,
            skip_benchmark_comparison,
        }
    }
}

impl PadConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `ZARYA_SHAPE_PAD` - Enable the pass (set to anything but "0")
    /// * `ZARYA_NO_KEEP_OUTPUT_STRIDE` - Disable the output-stride check
    /// * `ZARYA_FORCE_SHAPE_PAD` - Pad unconditionally when misaligned
    /// * `ZARYA_PAD_USE_TRANSPOSE` - Enable the explicit-transpose strategy
    /// * `ZARYA_NO_TF32` - Disallow the tf32 tensor-core path for f32
    /// * `ZARYA_SKIP_PAD_BENCH` - Skip the timing comparison (tests)
    pub fn from_env() -> Self {
        Self {
            shape_padding: std::env::var("ZARYA_SHAPE_PAD").is_ok_and(|v| v != "0"),
            keep_output_stride: std::env::var("ZARYA_NO_KEEP_OUTPUT_STRIDE").is_err(),
            force_shape_pad: std::env::var("ZARYA_FORCE_SHAPE_PAD").is_ok(),
            shape_pad_use_transpose: std::env::var("ZARYA_PAD_USE_TRANSPOSE").is_ok(),
            allow_tf32: std::env::var("ZARYA_NO_TF32").is_err(),
            skip_benchmark_comparison: std::env::var("ZARYA_SKIP_PAD_BENCH").is_ok(),
        }
    }
}
