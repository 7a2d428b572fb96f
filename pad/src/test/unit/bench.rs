use zarya_dtype::DType;

use crate::bench::should_pad_bench;
use crate::config::PadConfig;
use crate::test::helpers::{CountingBackend, cuda_desc, test_ctx};
use crate::transform::MatmulKind;

/// A small misaligned shape that still classifies as compute-bound on the
/// mock device once tf32 is disallowed (arithmetic intensity ~5.7 against a
/// derated machine balance of ~4.8).
fn misaligned_shapes() -> (zarya_ir::TensorDescriptor, zarya_ir::TensorDescriptor) {
    (cuda_desc(&[17, 17], DType::Float32), cuda_desc(&[17, 17], DType::Float32))
}

fn benchable_config() -> PadConfig {
    PadConfig::builder().shape_padding(true).allow_tf32(false).build()
}

#[test]
fn test_noop_plan_short_circuits_before_force_flag() {
    // fully aligned shapes: even force_shape_pad cannot make this pad
    let ctx = test_ctx(
        PadConfig::builder().shape_padding(true).force_shape_pad(true).build(),
        CountingBackend::a100(),
    );
    let mat1 = cuda_desc(&[32, 64], DType::Float32);
    let mat2 = cuda_desc(&[64, 128], DType::Float32);
    assert!(!should_pad_bench(&ctx, &mat1, &mat2, MatmulKind::Mm, None).unwrap());
}

#[test]
fn test_force_flag_skips_probe_and_benchmark() {
    let backend = CountingBackend::a100();
    let ctx = test_ctx(
        PadConfig::builder().shape_padding(true).force_shape_pad(true).build(),
        backend.clone(),
    );
    let (mat1, mat2) = misaligned_shapes();
    assert!(should_pad_bench(&ctx, &mat1, &mat2, MatmulKind::Mm, None).unwrap());
    assert_eq!(backend.probes(), 0);
    assert_eq!(backend.syncs(), 0);
}

#[test]
fn test_template_requirement_is_mandatory() {
    // a specialized template demanding alignment decides without timing
    let backend = CountingBackend::with_template_requirement();
    let ctx = test_ctx(benchable_config(), backend.clone());
    let (mat1, mat2) = misaligned_shapes();
    assert!(should_pad_bench(&ctx, &mat1, &mat2, MatmulKind::Mm, None).unwrap());
    assert_eq!(backend.probes(), 1);
    assert_eq!(backend.syncs(), 0);
}

#[test]
fn test_unavailable_backend_declines() {
    let ctx = test_ctx(benchable_config(), CountingBackend::unavailable());
    let (mat1, mat2) = misaligned_shapes();
    assert!(!should_pad_bench(&ctx, &mat1, &mat2, MatmulKind::Mm, None).unwrap());
}

#[test]
fn test_memory_bound_shape_declines() {
    // with tf32 allowed the machine balance is ~38; intensity ~5.7 is under it
    let backend = CountingBackend::a100();
    let ctx = test_ctx(PadConfig::builder().shape_padding(true).build(), backend.clone());
    let (mat1, mat2) = misaligned_shapes();
    assert!(!should_pad_bench(&ctx, &mat1, &mat2, MatmulKind::Mm, None).unwrap());
    assert_eq!(backend.syncs(), 0);
}

#[test]
fn test_skip_comparison_pads_once_benchmark_is_reached() {
    let backend = CountingBackend::a100();
    let ctx = test_ctx(
        PadConfig::builder().shape_padding(true).allow_tf32(false).skip_benchmark_comparison(true).build(),
        backend.clone(),
    );
    let (mat1, mat2) = misaligned_shapes();
    assert!(should_pad_bench(&ctx, &mat1, &mat2, MatmulKind::Mm, None).unwrap());
    // both paths were still timed
    assert!(backend.syncs() > 0);
}

#[test]
fn test_decision_is_cached_and_not_rebenchmarked() {
    let backend = CountingBackend::a100();
    let ctx = test_ctx(
        PadConfig::builder().shape_padding(true).allow_tf32(false).skip_benchmark_comparison(true).build(),
        backend.clone(),
    );
    let (mat1, mat2) = misaligned_shapes();

    let first = should_pad_bench(&ctx, &mat1, &mat2, MatmulKind::Mm, None).unwrap();
    let syncs_after_first = backend.syncs();
    assert!(syncs_after_first > 0);

    let second = should_pad_bench(&ctx, &mat1, &mat2, MatmulKind::Mm, None).unwrap();
    assert_eq!(first, second);
    assert_eq!(backend.syncs(), syncs_after_first, "second call must hit the cache");
}

#[test]
fn test_different_strides_miss_the_cache() {
    let backend = CountingBackend::a100();
    let ctx = test_ctx(
        PadConfig::builder().shape_padding(true).allow_tf32(false).skip_benchmark_comparison(true).build(),
        backend.clone(),
    );
    let (mat1, mat2) = misaligned_shapes();
    should_pad_bench(&ctx, &mat1, &mat2, MatmulKind::Mm, None).unwrap();
    let syncs_after_first = backend.syncs();

    let transposed = zarya_ir::TensorDescriptor::strided(
        [zarya_ir::Dim::from(17), zarya_ir::Dim::from(17)],
        [zarya_ir::Dim::from(1), zarya_ir::Dim::from(17)],
        DType::Float32,
        zarya_dtype::DeviceKind::Cuda(0),
    );
    should_pad_bench(&ctx, &transposed, &mat2, MatmulKind::Mm, None).unwrap();
    assert!(backend.syncs() > syncs_after_first, "changed stride must re-benchmark");
}

#[test]
fn test_addmm_benchmarks_with_bias() {
    let backend = CountingBackend::a100();
    let ctx = test_ctx(
        PadConfig::builder().shape_padding(true).allow_tf32(false).skip_benchmark_comparison(true).build(),
        backend.clone(),
    );
    let (mat1, mat2) = misaligned_shapes();
    let bias = cuda_desc(&[1, 17], DType::Float32);
    assert!(should_pad_bench(&ctx, &mat1, &mat2, MatmulKind::Addmm, Some(&bias)).unwrap());
}

#[test]
fn test_symbolic_hints_are_benchmarkable() {
    // symbolic M with a hint: plan pads only K/N, benchmarking materializes
    // the hint
    let backend = CountingBackend::a100();
    let ctx = test_ctx(
        PadConfig::builder().shape_padding(true).allow_tf32(false).skip_benchmark_comparison(true).build(),
        backend.clone(),
    );
    let mat1 = zarya_ir::TensorDescriptor::strided(
        [zarya_ir::Dim::symbolic(17), zarya_ir::Dim::from(17)],
        [zarya_ir::Dim::from(17), zarya_ir::Dim::from(1)],
        DType::Float32,
        zarya_dtype::DeviceKind::Cuda(0),
    );
    let mat2 = cuda_desc(&[17, 17], DType::Float32);
    assert!(should_pad_bench(&ctx, &mat1, &mat2, MatmulKind::Mm, None).unwrap());
    assert!(backend.syncs() > 0);
}
