use snafu::Snafu;
use zarya_ir::Shape;

use crate::transform::MatmulKind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The output-layout reachability search ran past its depth budget.
    /// Graphs this deep indicate a malformed trace, not a real program.
    #[snafu(display("output-layout traversal exceeded depth budget of {budget}"))]
    TraversalDepthExceeded { budget: usize },

    /// A padding or movement step of the rewrite failed.
    #[snafu(display("padding transform step failed: {source}"))]
    Transform { source: BoxedError },

    /// The padded matmul call itself failed. Shape and plan context is
    /// appended so a padding-induced bug can be told apart from a
    /// pre-existing shape bug.
    #[snafu(display(
        "padded {kind} failed: {source}; mat1.shape={mat1_shape:?}, mat2.shape={mat2_shape:?}, \
         bias.shape={bias_shape:?}, m_pad={m_pad}, k_pad={k_pad}, n_pad={n_pad}, \
         explicit_transpose={explicit_transpose}"
    ))]
    PaddedMatmulFailed {
        kind: MatmulKind,
        mat1_shape: Shape,
        mat2_shape: Shape,
        bias_shape: Option<Shape>,
        m_pad: usize,
        k_pad: usize,
        n_pad: usize,
        explicit_transpose: bool,
        source: BoxedError,
    },

    /// The unpadded reference call failed while benchmarking - a
    /// pre-existing shape bug, reported without padding context.
    #[snafu(display("benchmark reference {kind} failed: {source}"))]
    BenchmarkReferenceFailed { kind: MatmulKind, source: zarya_tensor::Error },

    /// Benchmark operands could not be materialized from their descriptors.
    #[snafu(display("failed to materialize benchmark operand: {source}"))]
    Materialize { source: zarya_tensor::Error },

    /// Rule registration failed while tracing a pattern template.
    #[snafu(display("rule registration failed: {source}"))]
    Registration { source: zarya_ir::Error },
}
