//! Error taxonomy shared by graph construction, tape compilation and execution.

use std::fmt;

use thiserror::Error;

use crate::broadcast::Side;
use crate::graph::NodeId;
use crate::tensor::Shape;

/// Convenience alias for results returned by graph and machine routines.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Describes why a declared broadcast axis was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternViolation {
    /// The axis does not exist in the output shape.
    OutOfRange { rank: usize },
    /// The axis refers to a real dimension whose size is not 1.
    NotBroadcastable { size: usize },
}

impl fmt::Display for PatternViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternViolation::OutOfRange { rank } => {
                write!(f, "is out of range for output rank {rank}")
            }
            PatternViolation::NotBroadcastable { size } => write!(
                f,
                "refers to a dimension of size {size}; only size-1 or missing dimensions broadcast"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("invalid broadcast pattern: {side} axis {axis} {reason}")]
    InvalidBroadcastPattern {
        side: Side,
        axis: u8,
        reason: PatternViolation,
    },

    #[error(
        "shape mismatch at axis {axis}: {left} vs {right} (operands {left_shape} and {right_shape})"
    )]
    ShapeMismatch {
        axis: usize,
        left: usize,
        right: usize,
        left_shape: Shape,
        right_shape: Shape,
    },

    /// Ordering stalled; `node` is one of the nodes left on a cycle.
    #[error("graph contains a cycle through node {node}")]
    CyclicGraph { node: NodeId },

    #[error("execution of node {node} failed: {message}")]
    Execution { node: NodeId, message: String },

    #[error("tape machine is closed")]
    MachineClosed,

    #[error("node {node} belongs to graph {}, not graph {expected}", .node.graph_id())]
    ForeignNode { node: NodeId, expected: u32 },

    #[error("node {0} is not registered in this graph")]
    UnknownNode(NodeId),

    #[error("node {0} is not a leaf")]
    NotALeaf(NodeId),

    #[error("invalid tensor: {0}")]
    InvalidTensor(String),

    #[error("operator `{0}` is already registered")]
    DuplicateOperator(String),

    #[error("operator `{0}` is not registered")]
    UnknownOperator(String),

    #[error("operator `{op}` takes {expected} operands but node {node} has {found}")]
    ArityMismatch {
        node: NodeId,
        op: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid machine configuration: {0}")]
    Config(String),
}

impl GraphError {
    pub(crate) fn execution(node: NodeId, message: impl Into<String>) -> Self {
        GraphError::Execution {
            node,
            message: message.into(),
        }
    }

    pub fn is_invalid_pattern(&self) -> bool {
        matches!(self, GraphError::InvalidBroadcastPattern { .. })
    }

    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, GraphError::ShapeMismatch { .. })
    }

    pub fn is_cyclic(&self) -> bool {
        matches!(self, GraphError::CyclicGraph { .. })
    }

    pub fn is_execution(&self) -> bool {
        matches!(self, GraphError::Execution { .. })
    }
}
