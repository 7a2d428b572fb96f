//! Structural pre-filter for padding candidates.

use zarya_ir::TensorDescriptor;

use crate::config::PadConfig;

/// Cheap gate evaluated before any cost modelling or benchmarking.
///
/// Symbolic shapes and strides are acceptable as long as they carry hints;
/// planning later makes sure only concrete dimensions are ever padded.
pub fn should_pad_common(
    config: &PadConfig,
    mat1: &TensorDescriptor,
    mat2: &TensorDescriptor,
    input: Option<&TensorDescriptor>,
) -> bool {
    config.shape_padding
        && mat1.device.is_accelerator()
        && mat2.device.is_accelerator()
        && mat1.is_floating_point()
        && mat2.is_floating_point()
        && mat1.is_pad_eligible()
        && mat2.is_pad_eligible()
        && input.is_none_or(TensorDescriptor::is_pad_eligible)
}
