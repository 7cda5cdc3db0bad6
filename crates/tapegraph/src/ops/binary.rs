use smallvec::smallvec;
use tracing::debug;

use crate::broadcast::{resolve, BroadcastPattern};
use crate::error::Result;
use crate::graph::{Graph, NodeId, NodeOp};

use super::registry::BinaryOp;

/// Adds a node applying `op` to `a` and `b` under `pattern`.
///
/// The pattern is resolved against the operand shapes before the node is created, so on any
/// error the graph is left untouched.
pub fn broadcast_binary(
    graph: &mut Graph,
    op: BinaryOp,
    a: NodeId,
    b: NodeId,
    pattern: BroadcastPattern,
) -> Result<NodeId> {
    op.kernel()?;
    let plan = resolve(graph.shape(a)?, graph.shape(b)?, &pattern)?;
    let shape = plan.output_shape().clone();
    let id = graph.push_node(None, NodeOp::Binary { op, pattern, plan }, smallvec![a, b], shape);
    debug!(node = %id, %op, lhs = %a, rhs = %b, "added binary node");
    Ok(id)
}

macro_rules! broadcast_op {
    ($(#[$meta:meta])* $name:ident => $op:expr) => {
        $(#[$meta])*
        pub fn $name(
            graph: &mut Graph,
            a: NodeId,
            b: NodeId,
            left: &[u8],
            right: &[u8],
        ) -> Result<NodeId> {
            broadcast_binary(graph, $op, a, b, BroadcastPattern::new(left, right))
        }
    };
}

broadcast_op!(
    /// Element-wise `a + b`, expanding `a` along `left` and `b` along `right`.
    broadcast_add => BinaryOp::Add
);
broadcast_op!(
    /// Element-wise `a - b`.
    broadcast_sub => BinaryOp::Sub
);
broadcast_op!(
    /// Element-wise `a * b`, expanding `a` along `left` and `b` along `right`.
    broadcast_mul => BinaryOp::Mul
);
broadcast_op!(broadcast_div => BinaryOp::Div);
broadcast_op!(broadcast_maximum => BinaryOp::Maximum);
broadcast_op!(broadcast_minimum => BinaryOp::Minimum);
