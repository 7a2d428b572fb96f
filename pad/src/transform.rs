//! The padding/unpadding rewrite.
//!
//! One generic routine covers mm, bmm and addmm: the three differ only in
//! arity, batching and bias handling, captured by [`MatmulKind`]. The
//! routine is written against the small [`PadValue`] op vocabulary and is
//! instantiated twice - eagerly over reference tensors for benchmarking,
//! and symbolically over graph nodes to build the registered replacement -
//! so the two paths cannot drift apart.

use zarya_ir::{Dim, Shape, TensorDescriptor};

use crate::alignment::{alignment_for, padding_needed};
use crate::config::PadConfig;
use crate::error::*;

/// Operator descriptor for the matmul family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::AsRefStr)]
pub enum MatmulKind {
    Mm,
    Bmm,
    Addmm,
}

impl MatmulKind {
    pub const fn has_bias(&self) -> bool {
        matches!(self, Self::Addmm)
    }

    pub const fn is_batched(&self) -> bool {
        matches!(self, Self::Bmm)
    }

    /// Whether the transposed right operand is forced contiguous on the
    /// explicit-transpose path. The fused multiply-add variant skips the
    /// copy since its epilogue is not fuseable anyway.
    pub const fn transpose_contiguous(&self) -> bool {
        !matches!(self, Self::Addmm)
    }

    /// (batch, m, k, n) extents from the operand descriptors.
    pub fn dims(&self, mat1: &TensorDescriptor, mat2: &TensorDescriptor) -> (Dim, Dim, Dim, Dim) {
        match self {
            Self::Mm | Self::Addmm => (Dim::from(1), mat1.shape[0], mat1.shape[1], mat2.shape[1]),
            Self::Bmm => (mat1.shape[0], mat1.shape[1], mat1.shape[2], mat2.shape[2]),
        }
    }
}

impl std::fmt::Display for MatmulKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Mm => "mm",
            Self::Bmm => "bmm",
            Self::Addmm => "addmm",
        })
    }
}

/// Per-candidate padding decision: how much to grow each extent, and whether
/// to trade the N padding for an explicit operand transpose.
///
/// Invariant: when `explicit_transpose` is set, `m_pad` and `n_pad` are both
/// zero - the transposed formulation replaces them. Symbolic dimensions
/// always get a pad of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddingPlan {
    pub m_pad: usize,
    pub k_pad: usize,
    pub n_pad: usize,
    pub explicit_transpose: bool,
}

impl PaddingPlan {
    /// Nothing to do: no padding anywhere and no transpose chosen.
    pub const fn is_noop(&self) -> bool {
        self.m_pad == 0 && self.k_pad == 0 && self.n_pad == 0 && !self.explicit_transpose
    }

    /// Derive the plan for a candidate.
    ///
    /// The transpose tie-break: when M is already aligned but N is not,
    /// computing `(mat2ᵀ @ mat1ᵀ)ᵀ` with K padding keeps downstream epilogue
    /// fusions alive, so both M and N padding are dropped in its favor.
    /// Mirrored, when N is aligned but M is not, the M padding alone is
    /// dropped. This tie-break is benchmarked-correct, not claimed optimal:
    /// the actual benefit depends on downstream fusion opportunities that
    /// are not modelled here, and the timing comparison downstream has the
    /// final word on whichever formulation was chosen.
    pub fn compute(
        kind: MatmulKind,
        mat1: &TensorDescriptor,
        mat2: &TensorDescriptor,
        bias: Option<&TensorDescriptor>,
        config: &PadConfig,
    ) -> Self {
        let (_batch, m, k, n) = kind.dims(mat1, mat2);
        let k_pad = padding_needed(k, alignment_for(mat1.dtype));
        let n_pad = padding_needed(n, alignment_for(mat2.dtype));
        let m_pad = padding_needed(m, alignment_for(mat1.dtype));

        let mut plan = Self { m_pad, k_pad, n_pad, explicit_transpose: false };

        let may_use_transpose = config.shape_pad_use_transpose
            && m.is_concrete()
            && k.is_concrete()
            && n.is_concrete();
        if may_use_transpose {
            // the fused variant needs a rank-2 bias to survive the transpose
            let bias_rank_ok = !kind.has_bias() || bias.is_some_and(|b| b.rank() >= 2);
            if plan.m_pad == 0 && plan.n_pad != 0 && bias_rank_ok {
                plan.explicit_transpose = true;
                plan.m_pad = 0;
                plan.n_pad = 0;
            } else if plan.m_pad != 0 && plan.n_pad == 0 {
                plan.m_pad = 0;
            }
        }
        plan
    }
}

/// The op vocabulary the padding rewrite emits.
///
/// Implemented by the eager reference tensor (benchmarking, numeric tests)
/// and by the symbolic graph-node builder (the replacement template).
pub trait PadValue: Sized + Clone {
    type Error: std::error::Error + Send + Sync + 'static;

    fn shape(&self) -> Shape;

    /// Zero-pad with (left, right) pairs in reverse dimension order.
    fn constant_pad_rev(&self, pads: &[(usize, usize)]) -> Result<Self, Self::Error>;
    fn transpose_last2(&self) -> Result<Self, Self::Error>;
    fn contiguous(&self) -> Self;
    fn unsqueeze0(&self) -> Self;
    fn mm(&self, rhs: &Self) -> Result<Self, Self::Error>;
    fn bmm(&self, rhs: &Self) -> Result<Self, Self::Error>;
    fn addmm(bias: &Self, mat1: &Self, mat2: &Self, beta: f64, alpha: f64) -> Result<Self, Self::Error>;
    /// Drop trailing elements along an axis counted from the end.
    fn shrink_tail(&self, axis_from_end: usize, count: usize) -> Result<Self, Self::Error>;
    fn add(&self, rhs: &Self) -> Result<Self, Self::Error>;
    fn scale(&self, factor: f64) -> Self;
}

/// Pad the operands, run the matmul, and strip the padded region so the
/// result has exactly the unpadded shape.
pub fn pad_matmul<V: PadValue>(
    kind: MatmulKind,
    mat1: &V,
    mat2: &V,
    bias: Option<&V>,
    plan: &PaddingPlan,
    beta: f64,
    alpha: f64,
) -> Result<V> {
    let PaddingPlan { m_pad, k_pad, n_pad, explicit_transpose } = *plan;

    let step = |source: V::Error| Error::Transform { source: Box::new(source) };
    let matmul_failed = |source: V::Error| Error::PaddedMatmulFailed {
        kind,
        mat1_shape: mat1.shape(),
        mat2_shape: mat2.shape(),
        bias_shape: bias.map(|b| b.shape()),
        m_pad,
        k_pad,
        n_pad,
        explicit_transpose,
        source: Box::new(source),
    };

    // mat1 trailing dims are (M, K); mat2 trailing dims are (K, N). The pad
    // primitive takes per-dimension pairs in reverse order, so leading batch
    // dims are untouched automatically.
    let mat1_padded = if k_pad != 0 || m_pad != 0 {
        mat1.constant_pad_rev(&[(0, k_pad), (0, m_pad)]).map_err(step)?
    } else {
        mat1.clone()
    };
    let mat2_padded = if k_pad != 0 || n_pad != 0 {
        mat2.constant_pad_rev(&[(0, n_pad), (0, k_pad)]).map_err(step)?
    } else {
        mat2.clone()
    };

    // Broadcast-aware bias padding, skipped entirely on the transpose path
    // (there the bias is applied manually after the matmul).
    let bias_padded = match (bias, explicit_transpose) {
        (Some(bias), false) => {
            // the leading broadcast dimension is sometimes implicit
            let bias2d = if bias.shape().len() < 2 { bias.unsqueeze0() } else { (*bias).clone() };
            let bias_shape = bias2d.shape();
            let mut bias_m_pad = m_pad;
            let mut bias_n_pad = n_pad;
            // A broadcast dimension (size 1 against a larger matmul extent)
            // must stay size 1: padding it would change what it broadcasts
            // over.
            if broadcasts_over(bias_shape[0], mat1.shape()[0]) {
                bias_m_pad = 0;
            }
            if broadcasts_over(bias_shape[1], mat2.shape()[1]) {
                bias_n_pad = 0;
            }
            if bias_m_pad > 0 || bias_n_pad > 0 {
                Some(bias2d.constant_pad_rev(&[(0, bias_n_pad), (0, bias_m_pad)]).map_err(step)?)
            } else {
                Some(bias2d)
            }
        }
        _ => None,
    };

    let mut result = if explicit_transpose {
        // (mat2ᵀ @ mat1ᵀ)ᵀ: K-dim padding, transpose and contiguous fuse
        // into a single kernel downstream, unlike an N-dim padding.
        let rhs_t = mat2_padded.transpose_last2().map_err(step)?;
        let rhs_t = if kind.transpose_contiguous() { rhs_t.contiguous() } else { rhs_t };
        let lhs_t = mat1_padded.transpose_last2().map_err(step)?;
        let product = if kind.is_batched() { rhs_t.bmm(&lhs_t) } else { rhs_t.mm(&lhs_t) };
        product.map_err(matmul_failed)?.transpose_last2().map_err(step)?
    } else {
        match (kind, &bias_padded) {
            (MatmulKind::Mm, _) | (MatmulKind::Addmm, None) => mat1_padded.mm(&mat2_padded),
            (MatmulKind::Bmm, _) => mat1_padded.bmm(&mat2_padded),
            (MatmulKind::Addmm, Some(bias)) => {
                V::addmm(bias, &mat1_padded, &mat2_padded, beta, alpha)
            }
        }
        .map_err(matmul_failed)?
    };

    if m_pad != 0 {
        result = result.shrink_tail(1, m_pad).map_err(step)?;
    }
    if n_pad != 0 {
        result = result.shrink_tail(0, n_pad).map_err(step)?;
    }

    // On the transpose path the fused multiply-add was not used, so bias,
    // alpha and beta are applied manually.
    if explicit_transpose && let Some(bias) = bias {
        result = if alpha == 1.0 && beta == 1.0 {
            result.add(bias).map_err(step)?
        } else {
            result.scale(alpha).add(&bias.scale(beta)).map_err(step)?
        };
    }

    Ok(result)
}

/// Whether a bias dimension of extent `bias_dim` broadcasts over a matmul
/// extent `mat_dim` (size 1 against something larger, judged on hints).
fn broadcasts_over(bias_dim: Dim, mat_dim: Dim) -> bool {
    bias_dim.as_concrete() == Some(1) && mat_dim.hint().is_some_and(|v| v > 1)
}
