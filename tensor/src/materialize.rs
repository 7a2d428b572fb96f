//! Materialization of concrete tensors from compile-time descriptors.
//!
//! Benchmarking needs real buffers for shapes the compiler only knows
//! symbolically. Hints are substituted for symbolic dimensions, and the
//! backing buffer is sized to the maximum addressed offset plus one so any
//! recorded striding (overlapping or gapped) stays in bounds.

use smallvec::SmallVec;
use snafu::OptionExt;
use zarya_ir::TensorDescriptor;

use crate::error::*;
use crate::{Storage, Tensor};

impl Tensor {
    /// Build a randomly filled tensor matching a descriptor's shape, strides,
    /// dtype and device, substituting hints for symbolic dimensions.
    pub fn materialize(desc: &TensorDescriptor) -> Result<Self> {
        let shape: SmallVec<[usize; 4]> = desc.shape_hints().context(MissingHintsSnafu)?;
        let stride: SmallVec<[usize; 4]> = desc.stride_hints().context(MissingHintsSnafu)?;

        let buffer_len: usize =
            shape.iter().zip(&stride).map(|(&d, &s)| d.saturating_sub(1) * s).sum::<usize>() + 1;
        let data = Storage::rand(desc.dtype, buffer_len)?;
        Ok(Self::from_parts(data, shape, stride, desc.dtype, desc.device))
    }
}
