use snafu::Snafu;

use crate::shape::Shape;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Shape mismatch between matmul operands during template construction.
    #[snafu(display("shape mismatch in {op}: {lhs:?} vs {rhs:?}"))]
    ShapeMismatch { op: &'static str, lhs: Shape, rhs: Shape },

    /// A template builder received the wrong number of example values.
    #[snafu(display("pattern template for {rule} expects {expected} example arguments, got {got}"))]
    ExampleArity { rule: &'static str, expected: usize, got: usize },

    /// An operation requires at least the given rank.
    #[snafu(display("{op} requires rank >= {required}, got shape {shape:?}"))]
    RankTooSmall { op: &'static str, required: usize, shape: Shape },

    /// Shrink removes more elements than the dimension holds.
    #[snafu(display("cannot shrink dimension {axis} of extent {size} by {count}"))]
    ShrinkOutOfRange { axis: usize, size: usize, count: usize },

    /// A node that should carry a tensor descriptor does not.
    #[snafu(display("node {op} carries no tensor descriptor"))]
    MissingDescriptor { op: String },

    /// A named capture the replacement relies on is absent from the match.
    #[snafu(display("match is missing the {name} capture"))]
    MissingCapture { name: String },
}
