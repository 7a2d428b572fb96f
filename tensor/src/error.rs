use snafu::Snafu;
use zarya_dtype::DType;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Shape mismatch between operands.
    #[snafu(display("shape mismatch in {op}: {lhs:?} vs {rhs:?}"))]
    ShapeMismatch { op: &'static str, lhs: Vec<usize>, rhs: Vec<usize> },

    /// DType mismatch between operands.
    #[snafu(display("dtype mismatch: cannot combine {lhs:?} and {rhs:?}"))]
    DTypeMismatch { lhs: DType, rhs: DType },

    /// No storage representation for this dtype.
    #[snafu(display("no reference storage for dtype {dtype:?}"))]
    UnsupportedDType { dtype: DType },

    /// Operation requires a higher rank.
    #[snafu(display("{op} requires rank >= {required}, got rank {rank}"))]
    RankTooSmall { op: &'static str, required: usize, rank: usize },

    /// More pad pairs than dimensions.
    #[snafu(display("padding specifies {pairs} dimension pairs but tensor has rank {rank}"))]
    PadRankMismatch { pairs: usize, rank: usize },

    /// Shrink removes more elements than the dimension holds.
    #[snafu(display("cannot shrink dimension {axis} of size {size} by {count}"))]
    ShrinkOutOfRange { axis: usize, size: usize, count: usize },

    /// Broadcasting failure.
    #[snafu(display("cannot broadcast shapes {lhs:?} and {rhs:?}"))]
    BroadcastMismatch { lhs: Vec<usize>, rhs: Vec<usize> },

    /// Materialization from a descriptor with unhinted symbolic dimensions.
    #[snafu(display("cannot materialize tensor: descriptor has symbolic dimensions without hints"))]
    MissingHints,
}
