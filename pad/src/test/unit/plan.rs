use zarya_dtype::DType;
use zarya_ir::{Dim, TensorDescriptor};

use crate::config::PadConfig;
use crate::test::helpers::cuda_desc;
use crate::transform::{MatmulKind, PaddingPlan};

fn transpose_enabled() -> PadConfig {
    PadConfig::builder().shape_pad_use_transpose(true).build()
}

#[test]
fn test_bert_vocab_plan_pads_only_m() {
    // [30523, 768] x [768, 8192] f32: alignment 4, only M is misaligned.
    let mat1 = cuda_desc(&[30523, 768], DType::Float32);
    let mat2 = cuda_desc(&[768, 8192], DType::Float32);
    let plan = PaddingPlan::compute(MatmulKind::Mm, &mat1, &mat2, None, &PadConfig::default());
    assert_eq!(plan, PaddingPlan { m_pad: 1, k_pad: 0, n_pad: 0, explicit_transpose: false });
}

#[test]
fn test_aligned_plan_is_noop() {
    let mat1 = cuda_desc(&[30528, 768], DType::Float32);
    let mat2 = cuda_desc(&[768, 8192], DType::Float32);
    let plan = PaddingPlan::compute(MatmulKind::Mm, &mat1, &mat2, None, &PadConfig::default());
    assert!(plan.is_noop());
}

#[test]
fn test_half_precision_uses_alignment_eight() {
    let mat1 = cuda_desc(&[12, 20], DType::Float16);
    let mat2 = cuda_desc(&[20, 9], DType::Float16);
    let plan = PaddingPlan::compute(MatmulKind::Mm, &mat1, &mat2, None, &PadConfig::default());
    assert_eq!(plan, PaddingPlan { m_pad: 4, k_pad: 4, n_pad: 7, explicit_transpose: false });
}

#[test]
fn test_bmm_batch_is_never_padded() {
    // batch 7 is misaligned but only trailing dims participate
    let mat1 = cuda_desc(&[7, 16, 16], DType::Float32);
    let mat2 = cuda_desc(&[7, 16, 18], DType::Float32);
    let plan = PaddingPlan::compute(MatmulKind::Bmm, &mat1, &mat2, None, &PadConfig::default());
    assert_eq!(plan, PaddingPlan { m_pad: 0, k_pad: 0, n_pad: 2, explicit_transpose: false });
}

#[test]
fn test_symbolic_dims_are_never_padded() {
    let mat1 = TensorDescriptor::strided(
        [Dim::symbolic(30523), Dim::from(768)],
        [Dim::from(768), Dim::from(1)],
        DType::Float32,
        zarya_dtype::DeviceKind::Cuda(0),
    );
    let mat2 = cuda_desc(&[768, 8193], DType::Float32);
    let plan = PaddingPlan::compute(MatmulKind::Mm, &mat1, &mat2, None, &PadConfig::default());
    assert_eq!(plan.m_pad, 0);
    assert_eq!(plan.n_pad, 3);
}

#[test]
fn test_transpose_trades_n_padding() {
    // M aligned, N misaligned: transpose wins, both pads dropped
    let mat1 = cuda_desc(&[8, 8], DType::Float32);
    let mat2 = cuda_desc(&[8, 30523], DType::Float32);
    let plan = PaddingPlan::compute(MatmulKind::Mm, &mat1, &mat2, None, &transpose_enabled());
    assert_eq!(plan, PaddingPlan { m_pad: 0, k_pad: 0, n_pad: 0, explicit_transpose: true });
    assert!(!plan.is_noop());
}

#[test]
fn test_transpose_mirror_drops_m_padding() {
    // N aligned, M misaligned: the M padding alone is dropped, no transpose
    let mat1 = cuda_desc(&[30523, 8], DType::Float32);
    let mat2 = cuda_desc(&[8, 8], DType::Float32);
    let plan = PaddingPlan::compute(MatmulKind::Mm, &mat1, &mat2, None, &transpose_enabled());
    assert_eq!(plan, PaddingPlan { m_pad: 0, k_pad: 0, n_pad: 0, explicit_transpose: false });
    assert!(plan.is_noop());
}

#[test]
fn test_transpose_invariant_at_most_one_pad() {
    // K misaligned as well: transpose keeps the K padding
    let mat1 = cuda_desc(&[8, 30523], DType::Float32);
    let mat2 = cuda_desc(&[30523, 30523], DType::Float32);
    let plan = PaddingPlan::compute(MatmulKind::Mm, &mat1, &mat2, None, &transpose_enabled());
    assert!(plan.explicit_transpose);
    assert_eq!(plan.m_pad, 0);
    assert_eq!(plan.n_pad, 0);
    assert_eq!(plan.k_pad, 1);
}

#[test]
fn test_transpose_requires_concrete_dims() {
    let mat1 = cuda_desc(&[8, 8], DType::Float32);
    let mat2 = TensorDescriptor::strided(
        [Dim::from(8), Dim::symbolic(30523)],
        [Dim::symbolic(30523), Dim::from(1)],
        DType::Float32,
        zarya_dtype::DeviceKind::Cuda(0),
    );
    let plan = PaddingPlan::compute(MatmulKind::Mm, &mat1, &mat2, None, &transpose_enabled());
    assert!(!plan.explicit_transpose);
}

#[test]
fn test_transpose_requires_rank2_bias_for_addmm() {
    let mat1 = cuda_desc(&[8, 8], DType::Float32);
    let mat2 = cuda_desc(&[8, 30523], DType::Float32);
    let rank1_bias = cuda_desc(&[30523], DType::Float32);
    let rank2_bias = cuda_desc(&[8, 30523], DType::Float32);

    let plan =
        PaddingPlan::compute(MatmulKind::Addmm, &mat1, &mat2, Some(&rank1_bias), &transpose_enabled());
    assert!(!plan.explicit_transpose);
    assert_eq!(plan.n_pad, 1);

    let plan =
        PaddingPlan::compute(MatmulKind::Addmm, &mat1, &mat2, Some(&rank2_bias), &transpose_enabled());
    assert!(plan.explicit_transpose);
}
