//! Symbolic instantiation of the padding rewrite over graph nodes.
//!
//! Running [`crate::transform::pad_matmul`] over `TraceNode`s builds the
//! replacement subgraph handed to the pattern-matching engine, with
//! descriptors propagated so nested steps can consult shapes. The same
//! routine that benchmarking times is the one that gets spliced into the
//! program.

use std::sync::Arc;

use smallvec::SmallVec;
use snafu::OptionExt;
use zarya_ir::error::*;
use zarya_ir::graph::{Arg, Node, OpKind};
use zarya_ir::shape::contiguous_strides;
use zarya_ir::{Dim, Shape, TensorDescriptor};

use crate::transform::PadValue;

/// A graph-building value: the node built so far plus its descriptor.
#[derive(Debug, Clone)]
pub struct TraceNode {
    node: Arc<Node>,
    desc: TensorDescriptor,
}

impl TraceNode {
    /// Wrap a matched graph node. Fails if the node carries no descriptor -
    /// the rewrite cannot plan shapes without one.
    pub fn from_node(node: &Arc<Node>) -> Result<Self> {
        let desc = node
            .descriptor()
            .cloned()
            .context(MissingDescriptorSnafu { op: node.op.as_ref() })?;
        Ok(Self { node: node.clone(), desc })
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    pub fn into_node(self) -> Arc<Node> {
        self.node
    }

    pub fn descriptor(&self) -> &TensorDescriptor {
        &self.desc
    }

    fn emit(&self, op: OpKind, args: Vec<Arg>, desc: TensorDescriptor) -> Self {
        Self { node: Node::new(op, args, Some(desc.clone())), desc }
    }

    fn contiguous_desc(&self, shape: Shape) -> TensorDescriptor {
        let stride = contiguous_strides(&shape);
        TensorDescriptor { shape, stride, dtype: self.desc.dtype, device: self.desc.device }
    }

    fn require_rank(&self, op: &'static str, required: usize) -> Result<()> {
        if self.desc.rank() < required {
            return RankTooSmallSnafu { op, required, shape: self.desc.shape.clone() }.fail();
        }
        Ok(())
    }
}

/// Matmul output shape check on concrete (or hinted-concrete) extents.
fn check_contraction(op: &'static str, lhs: &TensorDescriptor, rhs: &TensorDescriptor) -> Result<()> {
    let k_lhs = lhs.shape[lhs.rank() - 1];
    let k_rhs = rhs.shape[rhs.rank() - 2];
    if let (Some(a), Some(b)) = (k_lhs.as_concrete(), k_rhs.as_concrete())
        && a != b
    {
        return ShapeMismatchSnafu { op, lhs: lhs.shape.clone(), rhs: rhs.shape.clone() }.fail();
    }
    Ok(())
}

impl PadValue for TraceNode {
    type Error = Error;

    fn shape(&self) -> Shape {
        self.desc.shape.clone()
    }

    fn constant_pad_rev(&self, pads: &[(usize, usize)]) -> Result<Self> {
        self.require_rank("constant_pad", pads.len())?;
        let rank = self.desc.rank();
        let mut shape = self.desc.shape.clone();
        let mut flat: Vec<Arg> = Vec::with_capacity(pads.len() * 2);
        for (i, &(left, right)) in pads.iter().enumerate() {
            shape[rank - 1 - i] = shape[rank - 1 - i].grow(left + right);
            flat.push(Arg::Int(left as i64));
            flat.push(Arg::Int(right as i64));
        }
        let desc = self.contiguous_desc(shape);
        Ok(self.emit(OpKind::ConstantPad, vec![self.node.clone().into(), Arg::List(flat)], desc))
    }

    fn transpose_last2(&self) -> Result<Self> {
        self.require_rank("transpose", 2)?;
        let rank = self.desc.rank();
        let mut shape = self.desc.shape.clone();
        let mut stride = self.desc.stride.clone();
        shape.swap(rank - 2, rank - 1);
        stride.swap(rank - 2, rank - 1);
        let desc = TensorDescriptor { shape, stride, dtype: self.desc.dtype, device: self.desc.device };
        Ok(self.emit(
            OpKind::Transpose,
            vec![self.node.clone().into(), Arg::Int(-2), Arg::Int(-1)],
            desc,
        ))
    }

    fn contiguous(&self) -> Self {
        let desc = self.contiguous_desc(self.desc.shape.clone());
        self.emit(OpKind::Contiguous, vec![self.node.clone().into()], desc)
    }

    fn unsqueeze0(&self) -> Self {
        let mut shape: Shape = SmallVec::with_capacity(self.desc.rank() + 1);
        let mut stride: Shape = SmallVec::with_capacity(self.desc.rank() + 1);
        shape.push(Dim::from(1));
        stride.push(Dim::from(0));
        shape.extend(self.desc.shape.iter().copied());
        stride.extend(self.desc.stride.iter().copied());
        let desc = TensorDescriptor { shape, stride, dtype: self.desc.dtype, device: self.desc.device };
        self.emit(OpKind::Unsqueeze, vec![self.node.clone().into(), Arg::Int(0)], desc)
    }

    fn mm(&self, rhs: &Self) -> Result<Self> {
        self.require_rank("mm", 2)?;
        rhs.require_rank("mm", 2)?;
        check_contraction("mm", &self.desc, &rhs.desc)?;
        let shape: Shape = SmallVec::from_slice(&[self.desc.shape[0], rhs.desc.shape[1]]);
        let desc = self.contiguous_desc(shape);
        Ok(self.emit(OpKind::Mm, vec![self.node.clone().into(), rhs.node.clone().into()], desc))
    }

    fn bmm(&self, rhs: &Self) -> Result<Self> {
        self.require_rank("bmm", 3)?;
        rhs.require_rank("bmm", 3)?;
        check_contraction("bmm", &self.desc, &rhs.desc)?;
        let shape: Shape =
            SmallVec::from_slice(&[self.desc.shape[0], self.desc.shape[1], rhs.desc.shape[2]]);
        let desc = self.contiguous_desc(shape);
        Ok(self.emit(OpKind::Bmm, vec![self.node.clone().into(), rhs.node.clone().into()], desc))
    }

    fn addmm(bias: &Self, mat1: &Self, mat2: &Self, beta: f64, alpha: f64) -> Result<Self> {
        mat1.require_rank("addmm", 2)?;
        mat2.require_rank("addmm", 2)?;
        check_contraction("addmm", &mat1.desc, &mat2.desc)?;
        let shape: Shape = SmallVec::from_slice(&[mat1.desc.shape[0], mat2.desc.shape[1]]);
        let desc = mat1.contiguous_desc(shape);
        Ok(mat1.emit(
            OpKind::Addmm,
            vec![
                bias.node.clone().into(),
                mat1.node.clone().into(),
                mat2.node.clone().into(),
                Arg::Float(beta),
                Arg::Float(alpha),
            ],
            desc,
        ))
    }

    fn shrink_tail(&self, axis_from_end: usize, count: usize) -> Result<Self> {
        self.require_rank("shrink", axis_from_end + 1)?;
        let axis = self.desc.rank() - 1 - axis_from_end;
        let mut shape = self.desc.shape.clone();
        shape[axis] = match shape[axis] {
            Dim::Concrete(size) if size >= count => Dim::Concrete(size - count),
            Dim::Concrete(size) => {
                return ShrinkOutOfRangeSnafu { axis, size, count }.fail();
            }
            // symbolic dims are never padded, so never shrunk either
            symbolic => symbolic,
        };
        let desc = TensorDescriptor {
            shape,
            stride: self.desc.stride.clone(),
            dtype: self.desc.dtype,
            device: self.desc.device,
        };
        Ok(self.emit(
            OpKind::Shrink,
            vec![self.node.clone().into(), Arg::Int(axis_from_end as i64), Arg::Int(count as i64)],
            desc,
        ))
    }

    fn add(&self, rhs: &Self) -> Result<Self> {
        let shape = broadcast_dims(&self.desc.shape, &rhs.desc.shape);
        let desc = self.contiguous_desc(shape);
        Ok(self.emit(OpKind::Add, vec![self.node.clone().into(), rhs.node.clone().into()], desc))
    }

    fn scale(&self, factor: f64) -> Self {
        let desc = self.contiguous_desc(self.desc.shape.clone());
        self.emit(OpKind::MulScalar, vec![self.node.clone().into(), Arg::Float(factor)], desc)
    }
}

/// Right-aligned broadcast of two symbolic shapes; size-1 dimensions defer
/// to the other operand, everything else keeps the left-hand extent.
fn broadcast_dims(lhs: &Shape, rhs: &Shape) -> Shape {
    let rank = lhs.len().max(rhs.len());
    let mut out: Shape = SmallVec::with_capacity(rank);
    for d in 0..rank {
        let from_end = rank - 1 - d;
        let l = lhs.len().checked_sub(from_end + 1).map(|i| lhs[i]);
        let r = rhs.len().checked_sub(from_end + 1).map(|i| rhs[i]);
        out.push(match (l, r) {
            (Some(l), Some(r)) if l.as_concrete() == Some(1) => r,
            (Some(l), _) => l,
            (None, Some(r)) => r,
            (None, None) => Dim::from(1),
        });
    }
    out
}
