//! Tensor operations: padding, movement and the matmul family.

use smallvec::SmallVec;

use crate::error::*;
use crate::{Extents, Storage, Tensor, iter_indices, row_major_strides};

impl Tensor {
    // =========================================================================
    // Movement
    // =========================================================================

    /// Materialize into row-major storage.
    pub fn contiguous(&self) -> Self {
        let values: Vec<f64> = iter_indices(&self.shape).map(|index| self.at(&index)).collect();
        let data = Storage::from_f64(self.dtype, values).expect("storage dtype already validated");
        Self::contiguous_over_shape(data, &self.shape, self)
    }

    /// Swap the last two dimensions (view, no copy).
    pub fn transpose_last2(&self) -> Result<Self> {
        let rank = self.rank();
        if rank < 2 {
            return RankTooSmallSnafu { op: "transpose", required: 2usize, rank }.fail();
        }
        let mut shape = self.shape.clone();
        let mut stride = self.stride.clone();
        shape.swap(rank - 2, rank - 1);
        stride.swap(rank - 2, rank - 1);
        Ok(Self { shape, stride, data: self.data.clone(), dtype: self.dtype, device: self.device })
    }

    /// Prepend a broadcast dimension of size 1 (view, no copy).
    pub fn unsqueeze0(&self) -> Self {
        let mut shape: Extents = SmallVec::with_capacity(self.rank() + 1);
        let mut stride: Extents = SmallVec::with_capacity(self.rank() + 1);
        shape.push(1);
        stride.push(0);
        shape.extend_from_slice(&self.shape);
        stride.extend_from_slice(&self.stride);
        Self { shape, stride, data: self.data.clone(), dtype: self.dtype, device: self.device }
    }

    /// Drop `count` trailing elements along one axis, counted from the end
    /// (`axis_from_end == 0` is the last dimension). View, no copy.
    pub fn shrink_tail(&self, axis_from_end: usize, count: usize) -> Result<Self> {
        let rank = self.rank();
        if axis_from_end >= rank {
            return RankTooSmallSnafu { op: "shrink", required: axis_from_end + 1, rank }.fail();
        }
        let axis = rank - 1 - axis_from_end;
        let size = self.shape[axis];
        if count > size {
            return ShrinkOutOfRangeSnafu { axis, size, count }.fail();
        }
        let mut shape = self.shape.clone();
        shape[axis] = size - count;
        Ok(Self { shape, stride: self.stride.clone(), data: self.data.clone(), dtype: self.dtype, device: self.device })
    }

    /// Zero-pad with (left, right) pairs given in reverse dimension order:
    /// `pads[0]` applies to the last dimension. Dimensions without a pair are
    /// left untouched.
    pub fn constant_pad_rev(&self, pads: &[(usize, usize)]) -> Result<Self> {
        let rank = self.rank();
        if pads.len() > rank {
            return PadRankMismatchSnafu { pairs: pads.len(), rank }.fail();
        }

        let mut lefts: Extents = SmallVec::from_elem(0, rank);
        let mut out_shape = self.shape.clone();
        for (i, &(left, right)) in pads.iter().enumerate() {
            let dim = rank - 1 - i;
            lefts[dim] = left;
            out_shape[dim] += left + right;
        }

        let out_strides = row_major_strides(&out_shape);
        let mut values = vec![0.0f64; out_shape.iter().product()];
        for index in iter_indices(&self.shape) {
            let offset: usize =
                index.iter().zip(&lefts).zip(&out_strides).map(|((i, l), s)| (i + l) * s).sum();
            values[offset] = self.at(&index);
        }
        let data = Storage::from_f64(self.dtype, values)?;
        Ok(Self::contiguous_over_shape(data, &out_shape, self))
    }

    // =========================================================================
    // Matmul family
    // =========================================================================

    /// 2-D matrix multiplication.
    pub fn mm(&self, rhs: &Tensor) -> Result<Self> {
        self.check_matmul("mm", rhs, 2)?;
        let (m, k) = (self.shape[0], self.shape[1]);
        let n = rhs.shape[1];

        let mut values = vec![0.0f64; m * n];
        for i in 0..m {
            for j in 0..n {
                let mut acc = 0.0f64;
                for p in 0..k {
                    acc += self.at(&[i, p]) * rhs.at(&[p, j]);
                }
                values[i * n + j] = acc;
            }
        }
        let data = Storage::from_f64(self.dtype, values)?;
        Ok(Self::contiguous_over_shape(data, &[m, n], self))
    }

    /// Batched matrix multiplication over rank-3 operands.
    pub fn bmm(&self, rhs: &Tensor) -> Result<Self> {
        self.check_matmul("bmm", rhs, 3)?;
        let (b, m, k) = (self.shape[0], self.shape[1], self.shape[2]);
        let n = rhs.shape[2];

        let mut values = vec![0.0f64; b * m * n];
        for batch in 0..b {
            for i in 0..m {
                for j in 0..n {
                    let mut acc = 0.0f64;
                    for p in 0..k {
                        acc += self.at(&[batch, i, p]) * rhs.at(&[batch, p, j]);
                    }
                    values[(batch * m + i) * n + j] = acc;
                }
            }
        }
        let data = Storage::from_f64(self.dtype, values)?;
        Ok(Self::contiguous_over_shape(data, &[b, m, n], self))
    }

    /// `beta * bias + alpha * (mat1 @ mat2)` with broadcast-aware bias.
    ///
    /// Bias may be `[n]`, `[1, n]`, `[m, 1]`, `[m, n]` or any of those with
    /// broadcast dimensions of size 1.
    pub fn addmm(bias: &Tensor, mat1: &Tensor, mat2: &Tensor, beta: f64, alpha: f64) -> Result<Self> {
        mat1.check_matmul("addmm", mat2, 2)?;
        if bias.dtype() != mat1.dtype() {
            return DTypeMismatchSnafu { lhs: bias.dtype(), rhs: mat1.dtype() }.fail();
        }
        let (m, k) = (mat1.shape[0], mat1.shape[1]);
        let n = mat2.shape[1];

        let bias_at = |i: usize, j: usize| -> Result<f64> {
            let value = match bias.shape() {
                [] => bias.at(&[]),
                [bn] if *bn == n || *bn == 1 => bias.at(&[if *bn == 1 { 0 } else { j }]),
                [bm, bn] if (*bm == m || *bm == 1) && (*bn == n || *bn == 1) => {
                    bias.at(&[if *bm == 1 { 0 } else { i }, if *bn == 1 { 0 } else { j }])
                }
                other => {
                    return BroadcastMismatchSnafu { lhs: other.to_vec(), rhs: vec![m, n] }.fail();
                }
            };
            Ok(value)
        };

        let mut values = vec![0.0f64; m * n];
        for i in 0..m {
            for j in 0..n {
                let mut acc = 0.0f64;
                for p in 0..k {
                    acc += mat1.at(&[i, p]) * mat2.at(&[p, j]);
                }
                values[i * n + j] = beta * bias_at(i, j)? + alpha * acc;
            }
        }
        let data = Storage::from_f64(mat1.dtype, values)?;
        Ok(Self::contiguous_over_shape(data, &[m, n], mat1))
    }

    // =========================================================================
    // Elementwise
    // =========================================================================

    /// Broadcasting elementwise addition.
    pub fn add(&self, other: &Tensor) -> Result<Self> {
        if self.dtype != other.dtype {
            return DTypeMismatchSnafu { lhs: self.dtype, rhs: other.dtype }.fail();
        }
        let out_shape = broadcast_shape(&self.shape, &other.shape)?;
        let mut values = Vec::with_capacity(out_shape.iter().product());
        for index in iter_indices(&out_shape) {
            let a = self.at(&project_index(&index, &self.shape));
            let b = other.at(&project_index(&index, &other.shape));
            values.push(a + b);
        }
        let data = Storage::from_f64(self.dtype, values)?;
        Ok(Self::contiguous_over_shape(data, &out_shape, self))
    }

    /// Multiply every element by a scalar.
    pub fn scale(&self, factor: f64) -> Self {
        let values: Vec<f64> = iter_indices(&self.shape).map(|index| self.at(&index) * factor).collect();
        let data = Storage::from_f64(self.dtype, values).expect("storage dtype already validated");
        Self::contiguous_over_shape(data, &self.shape, self)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn contiguous_over_shape(data: Storage, shape: &[usize], like: &Tensor) -> Self {
        Self::from_parts(
            data,
            SmallVec::from_slice(shape),
            row_major_strides(shape),
            like.dtype,
            like.device,
        )
    }

    fn check_matmul(&self, op: &'static str, rhs: &Tensor, rank: usize) -> Result<()> {
        if self.rank() != rank || rhs.rank() != rank {
            return RankTooSmallSnafu { op, required: rank, rank: self.rank().min(rhs.rank()) }.fail();
        }
        if self.dtype != rhs.dtype {
            return DTypeMismatchSnafu { lhs: self.dtype, rhs: rhs.dtype }.fail();
        }
        let contraction_ok = self.shape[rank - 1] == rhs.shape[rank - 2];
        let batch_ok = rank < 3 || self.shape[0] == rhs.shape[0];
        if !contraction_ok || !batch_ok {
            return ShapeMismatchSnafu { op, lhs: self.shape.to_vec(), rhs: rhs.shape.to_vec() }.fail();
        }
        Ok(())
    }
}

/// Right-aligned broadcast of two shapes.
fn broadcast_shape(lhs: &[usize], rhs: &[usize]) -> Result<Extents> {
    let rank = lhs.len().max(rhs.len());
    let mut out: Extents = SmallVec::with_capacity(rank);
    for d in 0..rank {
        let l = dim_from_end(lhs, rank - 1 - d);
        let r = dim_from_end(rhs, rank - 1 - d);
        if l != r && l != 1 && r != 1 {
            return BroadcastMismatchSnafu { lhs: lhs.to_vec(), rhs: rhs.to_vec() }.fail();
        }
        out.push(l.max(r));
    }
    Ok(out)
}

fn dim_from_end(shape: &[usize], from_end: usize) -> usize {
    if from_end < shape.len() { shape[shape.len() - 1 - from_end] } else { 1 }
}

/// Project a broadcast output index back onto an operand's own shape.
fn project_index(index: &[usize], shape: &[usize]) -> Extents {
    let skip = index.len() - shape.len();
    index[skip..]
        .iter()
        .zip(shape)
        .map(|(&i, &dim)| if dim == 1 { 0 } else { i })
        .collect()
}
