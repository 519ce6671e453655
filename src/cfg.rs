//! Control-flow graphs consumed by the fixpoint driver.
//!
//! The driver only needs [`ControlFlowGraph`]. Analyses that decode
//! instructions additionally need [`Program`], which exposes the primitive
//! operations of each point and the renaming carried by each edge.
//! [`MethodBody`] is a small in-memory implementation of both.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::hash::Hash;

use crate::decoder::Op;
use crate::graph::Successors;
use crate::rename::Renaming;

pub trait ControlFlowGraph {
    type Point: Copy + Eq + Ord + Hash + Debug;

    fn entry(&self) -> Self::Point;

    fn successors(&self, point: Self::Point) -> Vec<Self::Point>;

    /// Points proven unreachable by an earlier phase.
    fn is_unreachable(&self, _point: Self::Point) -> bool {
        false
    }
}

pub trait Program: ControlFlowGraph {
    /// Primitive operations of `point`, in execution order.
    fn ops(&self, point: Self::Point) -> &[Op];

    /// Parallel assignment applied on the edge `from → to`, if any.
    fn renaming(&self, from: Self::Point, to: Self::Point) -> Option<&Renaming>;
}

/// Index of a block in a [`MethodBody`].
pub type BlockId = usize;

#[derive(Debug, Clone, Default)]
struct Block {
    ops: Vec<Op>,
    successors: Vec<BlockId>,
}

/// In-memory method: blocks of operations connected by edges.
///
/// Block `0` is the entry unless [`MethodBody::set_entry`] says otherwise.
///
/// ```
/// use absint_rs::cfg::{ControlFlowGraph, MethodBody};
/// use absint_rs::decoder::Op;
/// use absint_rs::expr::SymbolicValue;
///
/// let mut body = MethodBody::new();
/// let b0 = body.add_block(vec![Op::load_int(SymbolicValue::new(1), 0)]);
/// let b1 = body.add_block(vec![]);
/// body.add_edge(b0, b1);
/// assert_eq!(body.successors(b0), vec![b1]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodBody {
    entry: BlockId,
    blocks: Vec<Block>,
    renamings: BTreeMap<(BlockId, BlockId), Renaming>,
    unreachable: BTreeSet<BlockId>,
}

impl MethodBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block(&mut self, ops: Vec<Op>) -> BlockId {
        self.blocks.push(Block {
            ops,
            successors: Vec::new(),
        });
        self.blocks.len() - 1
    }

    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        debug_assert!(to < self.blocks.len(), "edge to unknown block {}", to);
        if let Some(block) = self.blocks.get_mut(from) {
            if !block.successors.contains(&to) {
                block.successors.push(to);
            }
        }
    }

    /// Adds `from → to` carrying `renaming`.
    pub fn add_edge_with(&mut self, from: BlockId, to: BlockId, renaming: Renaming) {
        self.add_edge(from, to);
        self.renamings.insert((from, to), renaming);
    }

    pub fn set_entry(&mut self, entry: BlockId) {
        self.entry = entry;
    }

    pub fn mark_unreachable(&mut self, block: BlockId) {
        self.unreachable.insert(block);
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Integer literals loaded anywhere in the method.
    pub fn int_constants(&self) -> impl Iterator<Item = i64> + '_ {
        self.blocks
            .iter()
            .flat_map(|b| b.ops.iter())
            .filter_map(Op::int_constant)
    }
}

impl ControlFlowGraph for MethodBody {
    type Point = BlockId;

    fn entry(&self) -> BlockId {
        self.entry
    }

    fn successors(&self, point: BlockId) -> Vec<BlockId> {
        self.blocks
            .get(point)
            .map(|b| b.successors.clone())
            .unwrap_or_default()
    }

    fn is_unreachable(&self, point: BlockId) -> bool {
        self.unreachable.contains(&point)
    }
}

impl Program for MethodBody {
    fn ops(&self, point: BlockId) -> &[Op] {
        self.blocks.get(point).map(|b| b.ops.as_slice()).unwrap_or(&[])
    }

    fn renaming(&self, from: BlockId, to: BlockId) -> Option<&Renaming> {
        self.renamings.get(&(from, to))
    }
}

impl Successors<BlockId> for MethodBody {
    fn successors(&self, node: &BlockId) -> Vec<BlockId> {
        ControlFlowGraph::successors(self, *node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::SymbolicValue;
    use crate::graph;

    #[test]
    fn test_method_body() {
        let mut body = MethodBody::new();
        let b0 = body.add_block(vec![Op::load_int(SymbolicValue::new(1), 7), Op::Nop]);
        let b1 = body.add_block(vec![Op::load_int(SymbolicValue::new(2), -3)]);
        let b2 = body.add_block(vec![]);
        body.add_edge(b0, b1);
        body.add_edge(b0, b1);
        body.add_edge_with(b1, b2, Renaming::identity([SymbolicValue::new(2)]));
        body.mark_unreachable(b2);

        assert_eq!(body.len(), 3);
        assert_eq!(body.entry(), b0);
        assert_eq!(ControlFlowGraph::successors(&body, b0), vec![b1]);
        assert_eq!(body.ops(b0).len(), 2);
        assert!(body.ops(42).is_empty());
        assert!(body.renaming(b1, b2).is_some());
        assert!(body.renaming(b0, b1).is_none());
        assert!(body.is_unreachable(b2));
        assert_eq!(body.int_constants().collect::<Vec<_>>(), vec![7, -3]);
        assert!(graph::is_reachable(&body, b0, &b2));
    }
}
