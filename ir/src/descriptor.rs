//! Tensor descriptors - compile-time metadata for graph values.
//!
//! A `TensorDescriptor` is what the rewrite pipeline knows about a tensor
//! before any data exists: shape, strides, element type and device. Shapes
//! and strides may contain symbolic dimensions recorded during tracing.

use smallvec::SmallVec;
use zarya_dtype::{DType, DeviceKind};

use crate::shape::{Shape, contiguous_strides};
use crate::Dim;

/// Compile-time view of a tensor flowing through the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorDescriptor {
    pub shape: Shape,
    pub stride: Shape,
    pub dtype: DType,
    pub device: DeviceKind,
}

impl TensorDescriptor {
    /// Descriptor with row-major strides.
    pub fn contiguous(shape: impl IntoIterator<Item = Dim>, dtype: DType, device: DeviceKind) -> Self {
        let shape: Shape = shape.into_iter().collect();
        let stride = contiguous_strides(&shape);
        Self { shape, stride, dtype, device }
    }

    /// Descriptor with explicit strides.
    pub fn strided(
        shape: impl IntoIterator<Item = Dim>,
        stride: impl IntoIterator<Item = Dim>,
        dtype: DType,
        device: DeviceKind,
    ) -> Self {
        Self { shape: shape.into_iter().collect(), stride: stride.into_iter().collect(), dtype, device }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn is_floating_point(&self) -> bool {
        self.dtype.is_float()
    }

    /// Shape sizes with hints substituted for symbolic dimensions.
    pub fn shape_hints(&self) -> Option<SmallVec<[usize; 4]>> {
        crate::shape::to_hints(&self.shape)
    }

    /// Stride sizes with hints substituted for symbolic dimensions.
    pub fn stride_hints(&self) -> Option<SmallVec<[usize; 4]>> {
        crate::shape::to_hints(&self.stride)
    }

    /// Whether the padding pass may consider this tensor at all.
    ///
    /// Symbolic shapes and strides are fine as long as they carry hints -
    /// planning substitutes the hint and padding later skips the symbolic
    /// dimensions. Tensors whose dimensions are *all* symbolic are rejected:
    /// nothing concrete would remain to pad.
    pub fn is_pad_eligible(&self) -> bool {
        let mut symbolic_cnt = 0usize;
        for dim in &self.shape {
            match dim {
                Dim::Concrete(_) => {}
                Dim::Symbolic { hint: Some(_) } => symbolic_cnt += 1,
                Dim::Symbolic { hint: None } => return false,
            }
        }
        if symbolic_cnt == self.shape.len() {
            return false;
        }
        self.stride.iter().all(|dim| dim.has_hint())
    }
}

impl std::fmt::Display for TensorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[", self.dtype)?;
        for (i, dim) in self.shape.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{dim}")?;
        }
        write!(f, "]@{}", self.device)
    }
}
