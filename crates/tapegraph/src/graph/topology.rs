use std::cmp::Reverse;
use std::collections::BinaryHeap;

use smallvec::SmallVec;

use crate::error::{GraphError, Result};

use super::state::{Node, NodeId};

/// Kahn's algorithm over the node arena, draining ready nodes lowest index first.
pub(super) fn order(nodes: &[Node]) -> Result<Vec<NodeId>> {
    let count = nodes.len();
    let mut pending = vec![0usize; count];
    let mut users: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); count];

    for (index, node) in nodes.iter().enumerate() {
        for &operand in node.operands() {
            let dep = operand.index();
            if dep >= count {
                return Err(GraphError::UnknownNode(operand));
            }
            pending[index] += 1;
            users[dep].push(index);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = pending
        .iter()
        .enumerate()
        .filter(|(_, &deps)| deps == 0)
        .map(|(index, _)| Reverse(index))
        .collect();

    let mut order = Vec::with_capacity(count);
    while let Some(Reverse(index)) = ready.pop() {
        order.push(nodes[index].id());
        for &user in &users[index] {
            pending[user] -= 1;
            if pending[user] == 0 {
                ready.push(Reverse(user));
            }
        }
    }

    if order.len() != count {
        let stuck = pending.iter().position(|&deps| deps > 0).unwrap_or(0);
        return Err(GraphError::CyclicGraph {
            node: nodes[stuck].id(),
        });
    }
    Ok(order)
}
