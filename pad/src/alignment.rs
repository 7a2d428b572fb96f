//! Per-dtype alignment boundaries and pad amounts.
//!
//! Matmul kernels hit their fastest code paths when the M/K/N extents are
//! multiples of a dtype-dependent element count. These helpers are pure
//! arithmetic; the decision of whether padding is worth it lives elsewhere.

use zarya_dtype::DType;
use zarya_ir::Dim;

/// Element-count alignment a kernel wants for this dtype.
///
/// Zero means no padding applies to the dtype at all.
pub fn alignment_for(dtype: DType) -> usize {
    if dtype.is_half_precision() {
        8
    } else if dtype == DType::Float32 {
        4
    } else {
        0
    }
}

/// Smallest amount that rounds `dim` up to a multiple of `alignment`.
///
/// Symbolic dimensions are never padded: their runtime extent is unknown, so
/// the result is 0 regardless of the hint.
pub fn padding_needed(dim: Dim, alignment: usize) -> usize {
    let Some(value) = dim.as_concrete() else {
        return 0;
    };
    if alignment == 0 || value % alignment == 0 {
        0
    } else {
        alignment - value % alignment
    }
}
