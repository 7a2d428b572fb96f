use zarya_dtype::{DType, DeviceKind};

use crate::{Dim, TensorDescriptor};

fn cuda_f32(shape: &[Dim]) -> TensorDescriptor {
    TensorDescriptor::contiguous(shape.iter().copied(), DType::Float32, DeviceKind::Cuda(0))
}

#[test]
fn test_contiguous_strides() {
    let desc = cuda_f32(&[Dim::from(8), Dim::from(4)]);
    assert_eq!(desc.stride[0].as_concrete(), Some(4));
    assert_eq!(desc.stride[1].as_concrete(), Some(1));
}

#[test]
fn test_pad_eligible_concrete() {
    let desc = cuda_f32(&[Dim::from(8), Dim::from(4)]);
    assert!(desc.is_pad_eligible());
}

#[test]
fn test_pad_eligible_symbolic_with_hint() {
    let desc = cuda_f32(&[Dim::symbolic(16), Dim::from(768)]);
    assert!(desc.is_pad_eligible());
}

#[test]
fn test_not_eligible_without_hint() {
    let desc = cuda_f32(&[Dim::unhinted(), Dim::from(768)]);
    assert!(!desc.is_pad_eligible());
}

#[test]
fn test_not_eligible_all_symbolic() {
    // Nothing concrete would remain to pad.
    let desc = cuda_f32(&[Dim::symbolic(16), Dim::symbolic(768)]);
    assert!(!desc.is_pad_eligible());
}

#[test]
fn test_eligibility_is_idempotent() {
    let desc = cuda_f32(&[Dim::symbolic(16), Dim::from(768)]);
    assert_eq!(desc.is_pad_eligible(), desc.is_pad_eligible());
}

#[test]
fn test_display() {
    let desc = cuda_f32(&[Dim::from(8), Dim::symbolic(4)]);
    assert_eq!(desc.to_string(), "Float32[8, s[4]]@cuda:0");
}
