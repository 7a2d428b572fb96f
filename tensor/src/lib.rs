//! Strided reference tensor.
//!
//! A deliberately small CPU tensor that exists so decision benchmarking and
//! numeric tests have something real to run: it supports exactly the
//! operations the padding rewrite emits (constant pad, transpose of the last
//! two dims, trailing shrink, mm/bmm/addmm) plus materialization from a
//! compile-time descriptor. Views share storage; elements are converted
//! through f64 on access, which keeps one code path for all float widths.

pub mod error;
pub mod materialize;
pub mod ops;

use std::sync::Arc;

use half::{bf16, f16};
use rand::Rng;
use smallvec::SmallVec;
use zarya_dtype::{DType, DeviceKind};
use zarya_ir::{Dim, TensorDescriptor};

pub use error::{Error, Result};

/// Concrete index/extent vector.
pub type Extents = SmallVec<[usize; 4]>;

/// Element storage, one vector per supported float width.
#[derive(Debug, Clone)]
pub(crate) enum Storage {
    F16(Vec<f16>),
    BF16(Vec<bf16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Storage {
    fn zeros(dtype: DType, len: usize) -> Result<Self> {
        match dtype {
            DType::Float16 => Ok(Self::F16(vec![f16::ZERO; len])),
            DType::BFloat16 => Ok(Self::BF16(vec![bf16::ZERO; len])),
            DType::Float32 => Ok(Self::F32(vec![0.0; len])),
            DType::Float64 => Ok(Self::F64(vec![0.0; len])),
            _ => error::UnsupportedDTypeSnafu { dtype }.fail(),
        }
    }

    fn from_f64(dtype: DType, values: Vec<f64>) -> Result<Self> {
        match dtype {
            DType::Float16 => Ok(Self::F16(values.into_iter().map(f16::from_f64).collect())),
            DType::BFloat16 => Ok(Self::BF16(values.into_iter().map(bf16::from_f64).collect())),
            DType::Float32 => Ok(Self::F32(values.into_iter().map(|v| v as f32).collect())),
            DType::Float64 => Ok(Self::F64(values)),
            _ => error::UnsupportedDTypeSnafu { dtype }.fail(),
        }
    }

    fn rand(dtype: DType, len: usize) -> Result<Self> {
        let mut rng = rand::rng();
        let values: Vec<f64> = (0..len).map(|_| rng.random::<f64>() * 2.0 - 1.0).collect();
        Self::from_f64(dtype, values)
    }

    fn get(&self, i: usize) -> f64 {
        match self {
            Self::F16(v) => v[i].to_f64(),
            Self::BF16(v) => v[i].to_f64(),
            Self::F32(v) => v[i] as f64,
            Self::F64(v) => v[i],
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::F16(v) => v.len(),
            Self::BF16(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
        }
    }
}

/// A strided view over shared element storage.
#[derive(Debug, Clone)]
pub struct Tensor {
    dtype: DType,
    device: DeviceKind,
    shape: Extents,
    stride: Extents,
    data: Arc<Storage>,
}

impl Tensor {
    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn zeros(shape: &[usize], dtype: DType, device: DeviceKind) -> Result<Self> {
        let numel = shape.iter().product();
        Ok(Self::contiguous_over(Storage::zeros(dtype, numel)?, shape, dtype, device))
    }

    /// Uniform random values in [-1, 1).
    pub fn rand(shape: &[usize], dtype: DType, device: DeviceKind) -> Result<Self> {
        let numel = shape.iter().product();
        Ok(Self::contiguous_over(Storage::rand(dtype, numel)?, shape, dtype, device))
    }

    /// Fresh random tensor with the shape, dtype and device of `self`.
    pub fn rand_like(&self) -> Result<Self> {
        Self::rand(&self.shape, self.dtype, self.device)
    }

    /// Float32 tensor from explicit values, for tests and examples.
    pub fn from_f32(values: &[f32], shape: &[usize], device: DeviceKind) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if numel != values.len() {
            return error::ShapeMismatchSnafu {
                op: "from_f32",
                lhs: shape.to_vec(),
                rhs: vec![values.len()],
            }
            .fail();
        }
        Ok(Self::contiguous_over(Storage::F32(values.to_vec()), shape, DType::Float32, device))
    }

    fn contiguous_over(data: Storage, shape: &[usize], dtype: DType, device: DeviceKind) -> Self {
        Self {
            dtype,
            device,
            shape: SmallVec::from_slice(shape),
            stride: row_major_strides(shape),
            data: Arc::new(data),
        }
    }

    pub(crate) fn from_parts(
        data: Storage,
        shape: Extents,
        stride: Extents,
        dtype: DType,
        device: DeviceKind,
    ) -> Self {
        Self { dtype, device, shape, stride, data: Arc::new(data) }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn device(&self) -> DeviceKind {
        self.device
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn stride(&self) -> &[usize] {
        &self.stride
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Element at a multi-dimensional index, widened to f64.
    pub fn at(&self, index: &[usize]) -> f64 {
        debug_assert_eq!(index.len(), self.shape.len());
        let offset: usize = index.iter().zip(&self.stride).map(|(i, s)| i * s).sum();
        self.data.get(offset)
    }

    /// Descriptor of this tensor (all dimensions concrete).
    pub fn descriptor(&self) -> TensorDescriptor {
        TensorDescriptor::strided(
            self.shape.iter().map(|&d| Dim::from(d)),
            self.stride.iter().map(|&d| Dim::from(d)),
            self.dtype,
            self.device,
        )
    }

    /// Elementwise closeness within the usual relative/absolute tolerances.
    pub fn allclose(&self, other: &Tensor, rtol: f64, atol: f64) -> bool {
        if self.shape != other.shape {
            return false;
        }
        for index in iter_indices(&self.shape) {
            let a = self.at(&index);
            let b = other.at(&index);
            if (a - b).abs() > atol + rtol * b.abs() {
                return false;
            }
        }
        true
    }
}

/// Row-major strides for a concrete shape.
pub(crate) fn row_major_strides(shape: &[usize]) -> Extents {
    let mut strides: Extents = SmallVec::with_capacity(shape.len());
    let mut acc = 1usize;
    for &dim in shape.iter().rev() {
        strides.push(acc);
        acc *= dim;
    }
    strides.reverse();
    strides
}

/// Iterate all indices of a shape in row-major order.
pub(crate) fn iter_indices(shape: &[usize]) -> impl Iterator<Item = Extents> + '_ {
    let numel: usize = shape.iter().product();
    let rank = shape.len();
    (0..numel).map(move |mut linear| {
        let mut index: Extents = SmallVec::from_elem(0, rank);
        for d in (0..rank).rev() {
            index[d] = linear % shape[d];
            linear /= shape[d];
        }
        index
    })
}
