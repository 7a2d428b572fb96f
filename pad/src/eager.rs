//! Eager instantiation of the padding rewrite over reference tensors.
//!
//! This is the path benchmarking times and numeric tests validate; the op
//! vocabulary delegates straight to the tensor crate.

use zarya_ir::{Dim, Shape};
use zarya_tensor::Tensor;

use crate::transform::PadValue;

impl PadValue for Tensor {
    type Error = zarya_tensor::Error;

    fn shape(&self) -> Shape {
        self.shape().iter().map(|&d| Dim::from(d)).collect()
    }

    fn constant_pad_rev(&self, pads: &[(usize, usize)]) -> Result<Self, Self::Error> {
        self.constant_pad_rev(pads)
    }

    fn transpose_last2(&self) -> Result<Self, Self::Error> {
        self.transpose_last2()
    }

    fn contiguous(&self) -> Self {
        self.contiguous()
    }

    fn unsqueeze0(&self) -> Self {
        self.unsqueeze0()
    }

    fn mm(&self, rhs: &Self) -> Result<Self, Self::Error> {
        self.mm(rhs)
    }

    fn bmm(&self, rhs: &Self) -> Result<Self, Self::Error> {
        self.bmm(rhs)
    }

    fn addmm(bias: &Self, mat1: &Self, mat2: &Self, beta: f64, alpha: f64) -> Result<Self, Self::Error> {
        Tensor::addmm(bias, mat1, mat2, beta, alpha)
    }

    fn shrink_tail(&self, axis_from_end: usize, count: usize) -> Result<Self, Self::Error> {
        self.shrink_tail(axis_from_end, count)
    }

    fn add(&self, rhs: &Self) -> Result<Self, Self::Error> {
        self.add(rhs)
    }

    fn scale(&self, factor: f64) -> Self {
        self.scale(factor)
    }
}
