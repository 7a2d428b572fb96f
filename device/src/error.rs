use snafu::Snafu;
use zarya_dtype::DType;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The accelerator is not in the characteristics table.
    #[snafu(display("no throughput characteristics known for accelerator {device}"))]
    UnknownAccelerator { device: String },

    /// Throughput lookup for a dtype the device has no pipe for.
    #[snafu(display("device {device} has no peak-throughput figure for {dtype:?}"))]
    UnsupportedDType { device: String, dtype: DType },

    /// A fixed layout cannot be built from symbolic dimensions.
    #[snafu(display("fixed layout requires concrete dimensions, got {shape:?}"))]
    SymbolicLayout { shape: zarya_ir::Shape },
}
