use std::fmt;

use smallvec::SmallVec;

use crate::broadcast::{BroadcastPattern, BroadcastPlan};
use crate::ops::BinaryOp;
use crate::tensor::{Shape, Tensor};

/// Handle to a node, scoped to the graph that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    graph: u32,
    index: u32,
}

impl NodeId {
    pub(crate) fn new(graph: u32, index: u32) -> Self {
        NodeId { graph, index }
    }

    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn graph_id(self) -> u32 {
        self.graph
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.index)
    }
}

/// What a node computes.
#[derive(Debug, Clone)]
pub enum NodeOp {
    /// Input node holding a caller-supplied tensor.
    Leaf,
    Binary {
        op: BinaryOp,
        pattern: BroadcastPattern,
        plan: BroadcastPlan,
    },
}

impl NodeOp {
    pub fn arity(&self) -> usize {
        match self {
            NodeOp::Leaf => 0,
            NodeOp::Binary { .. } => BinaryOp::ARITY,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeOp::Leaf)
    }

    pub fn name(&self) -> String {
        match self {
            NodeOp::Leaf => "load".to_string(),
            NodeOp::Binary { op, .. } => op.name(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeState {
    Pending,
    Ready(Tensor),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: Option<String>,
    pub(crate) op: NodeOp,
    pub(crate) operands: SmallVec<[NodeId; 2]>,
    pub(crate) shape: Shape,
    pub(crate) state: NodeState,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn op(&self) -> &NodeOp {
        &self.op
    }

    pub fn operands(&self) -> &[NodeId] {
        &self.operands
    }

    /// Static output shape, fixed when the node was created.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn value(&self) -> Option<&Tensor> {
        match &self.state {
            NodeState::Ready(value) => Some(value),
            NodeState::Pending => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self.state, NodeState::Ready(_))
    }
}
