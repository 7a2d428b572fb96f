//! Shape utilities over symbolic dimensions.
//!
//! Shapes are `SmallVec`s with inline capacity of 4, which covers the ranks
//! this pass ever meets (matmul operands are rank 2 or 3) without heap
//! allocation.

use smallvec::SmallVec;

use crate::Dim;

/// Shape (or stride) type - sequence of symbolic dimensions.
pub type Shape = SmallVec<[Dim; 4]>;

/// Check if a shape is fully concrete.
pub fn is_static(shape: &[Dim]) -> bool {
    shape.iter().all(|dim| dim.is_concrete())
}

/// Convert to concrete sizes if fully static, `None` otherwise.
pub fn to_static(shape: &[Dim]) -> Option<SmallVec<[usize; 4]>> {
    shape.iter().map(|dim| dim.as_concrete()).collect()
}

/// Substitute hints for symbolic dimensions.
///
/// Returns `None` if any dimension has neither a concrete value nor a hint.
pub fn to_hints(shape: &[Dim]) -> Option<SmallVec<[usize; 4]>> {
    shape.iter().map(|dim| dim.hint()).collect()
}

/// Row-major strides for a shape, computed over hint values.
///
/// A stride is symbolic whenever any dimension inner to it is symbolic; the
/// hint of such a stride is the product of the inner hints.
pub fn contiguous_strides(shape: &[Dim]) -> Shape {
    let mut strides: Shape = SmallVec::with_capacity(shape.len());
    let mut acc: usize = 1;
    let mut concrete = true;
    for dim in shape.iter().rev() {
        strides.push(if concrete { Dim::Concrete(acc) } else { Dim::symbolic(acc) });
        match dim {
            Dim::Concrete(v) => acc *= v,
            Dim::Symbolic { hint } => {
                concrete = false;
                acc *= hint.unwrap_or(1);
            }
        }
    }
    strides.reverse();
    strides
}
