//! Functional dataflow graph.
//!
//! The graph is a DAG of immutable `Node`s connected through their argument
//! lists, in the style of a functionalized trace: every node is an operator
//! application (or a placeholder), and `Output` nodes mark what the program
//! returns. Consumers reference producers directly via `Arc`, so backward
//! traversal from an output walks the argument lists.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::TensorDescriptor;

/// Operator kind of a graph node.
///
/// The set is split between *layout-defining* operators, whose output memory
/// layout is fixed by the operator itself regardless of input strides, and
/// pass-through operators, which may propagate input strides to their output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::AsRefStr)]
pub enum OpKind {
    // Graph structure
    Placeholder,
    Output,

    // Matmul family
    Mm,
    Bmm,
    Addmm,
    Baddbmm,

    // Layout-defining construction and movement
    ConstantPad,
    AsStrided,
    Contiguous,
    Empty,
    NewEmpty,
    NewEmptyStrided,
    NewOnes,
    NewZeros,
    NewFull,
    EmptyPermuted,
    EmptyStrided,
    Linspace,

    // Layout-defining reductions and lookups
    Argmax,
    Max,
    Argmin,
    Min,
    Embedding,
    EmbeddingBag,

    // Stride-propagating operators
    Add,
    Sub,
    Mul,
    Div,
    MulScalar,
    Relu,
    Gelu,
    Softmax,
    LogSoftmax,
    Sum,
    View,
    Transpose,
    Unsqueeze,
    Shrink,
    Cast,
    Detach,
}

impl OpKind {
    /// Whether this operator's output layout is independent of its inputs'
    /// strides. These operators cut the output-stride reachability search:
    /// anything flowing through them cannot leak a producer's layout.
    pub const fn is_layout_defining(&self) -> bool {
        matches!(
            self,
            Self::Mm
                | Self::Bmm
                | Self::Addmm
                | Self::Baddbmm
                | Self::ConstantPad
                | Self::AsStrided
                | Self::Contiguous
                | Self::Empty
                | Self::NewEmpty
                | Self::NewEmptyStrided
                | Self::NewOnes
                | Self::NewZeros
                | Self::NewFull
                | Self::EmptyPermuted
                | Self::EmptyStrided
                | Self::Linspace
                | Self::Argmax
                | Self::Max
                | Self::Argmin
                | Self::Min
                | Self::Embedding
                | Self::EmbeddingBag
        )
    }
}

/// Argument of a graph node.
#[derive(Debug, Clone)]
pub enum Arg {
    Node(Arc<Node>),
    List(Vec<Arg>),
    Int(i64),
    Float(f64),
}

impl From<Arc<Node>> for Arg {
    fn from(node: Arc<Node>) -> Self {
        Self::Node(node)
    }
}

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// One operator application in the dataflow graph.
#[derive(Debug)]
pub struct Node {
    /// Process-unique id; used for identity during traversal.
    pub id: u64,
    pub op: OpKind,
    pub args: Vec<Arg>,
    /// Descriptor of the value this node produces, when known.
    pub meta: Option<TensorDescriptor>,
}

impl Node {
    pub fn new(op: OpKind, args: Vec<Arg>, meta: Option<TensorDescriptor>) -> Arc<Self> {
        Arc::new(Self { id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed), op, args, meta })
    }

    /// Placeholder carrying the descriptor of an externally supplied value.
    pub fn placeholder(meta: TensorDescriptor) -> Arc<Self> {
        Self::new(OpKind::Placeholder, Vec::new(), Some(meta))
    }

    pub fn descriptor(&self) -> Option<&TensorDescriptor> {
        self.meta.as_ref()
    }
}

/// A traced program: all nodes in insertion order.
///
/// Nodes reference their producers directly; the graph exists to enumerate
/// outputs and to give analyses a stable universe to walk.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Arc<Node>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a node in the graph. Returns the node for chaining.
    pub fn insert(&mut self, node: Arc<Node>) -> Arc<Node> {
        self.nodes.push(node.clone());
        node
    }

    /// Create and record a node in one step.
    pub fn add(&mut self, op: OpKind, args: Vec<Arg>, meta: Option<TensorDescriptor>) -> Arc<Node> {
        self.insert(Node::new(op, args, meta))
    }

    /// Mark values as program outputs.
    pub fn mark_output(&mut self, args: Vec<Arg>) -> Arc<Node> {
        self.add(OpKind::Output, args, None)
    }

    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    /// Nodes whose op is `Output`.
    pub fn outputs(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.nodes.iter().filter(|n| n.op == OpKind::Output)
    }
}
