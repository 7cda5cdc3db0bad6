use std::sync::atomic::{AtomicU32, Ordering};

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::error::{GraphError, Result};
use crate::tensor::{Shape, Tensor};

use super::state::{Node, NodeId, NodeOp, NodeState};
use super::topology;

static GRAPH_ID_COUNTER: AtomicU32 = AtomicU32::new(1);

/// Owns every node. Nodes refer to each other by [`NodeId`] only.
#[derive(Debug)]
pub struct Graph {
    id: u32,
    nodes: Vec<Node>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        let id = GRAPH_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        debug!(graph = id, "created graph");
        Graph {
            id,
            nodes: Vec::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Wraps `value` as an input node.
    pub fn add_leaf(&mut self, value: Tensor) -> NodeId {
        self.add_leaf_inner(None, value)
    }

    pub fn add_named_leaf(&mut self, name: impl Into<String>, value: Tensor) -> NodeId {
        self.add_leaf_inner(Some(name.into()), value)
    }

    fn add_leaf_inner(&mut self, name: Option<String>, value: Tensor) -> NodeId {
        let shape = value.shape().clone();
        let id = self.push_node(name, NodeOp::Leaf, SmallVec::new(), shape);
        self.nodes[id.index()].state = NodeState::Ready(value);
        id
    }

    pub(crate) fn push_node(
        &mut self,
        name: Option<String>,
        op: NodeOp,
        operands: SmallVec<[NodeId; 2]>,
        shape: Shape,
    ) -> NodeId {
        let id = NodeId::new(self.id, self.nodes.len() as u32);
        trace!(node = %id, op = %op.name(), %shape, "push node");
        self.nodes.push(Node {
            id,
            name,
            op,
            operands,
            shape,
            state: NodeState::Pending,
        });
        id
    }

    fn check_owned(&self, id: NodeId) -> Result<usize> {
        if id.graph_id() != self.id {
            return Err(GraphError::ForeignNode {
                node: id,
                expected: self.id,
            });
        }
        if id.index() >= self.nodes.len() {
            return Err(GraphError::UnknownNode(id));
        }
        Ok(id.index())
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        let index = self.check_owned(id)?;
        Ok(&self.nodes[index])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn shape(&self, id: NodeId) -> Result<&Shape> {
        self.node(id).map(Node::shape)
    }

    /// Current value of a node; `None` for operator nodes that have not been computed.
    pub fn value(&self, id: NodeId) -> Option<&Tensor> {
        self.node(id).ok().and_then(Node::value)
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|node| node.name() == Some(name))
            .map(Node::id)
    }

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        let index = self.check_owned(id)?;
        self.nodes[index].name = Some(name.into());
        Ok(())
    }

    /// Rebinds the tensor held by a leaf. The new value must keep the leaf's shape, since
    /// downstream broadcast plans were resolved against it.
    pub fn set_value(&mut self, id: NodeId, value: Tensor) -> Result<()> {
        let index = self.check_owned(id)?;
        let node = &mut self.nodes[index];
        if !node.op.is_leaf() {
            return Err(GraphError::NotALeaf(id));
        }
        if value.shape() != &node.shape {
            return Err(GraphError::InvalidTensor(format!(
                "leaf {id} has shape {}, got {}",
                node.shape,
                value.shape()
            )));
        }
        node.state = NodeState::Ready(value);
        Ok(())
    }

    pub(crate) fn set_computed(&mut self, id: NodeId, value: Tensor) -> Result<()> {
        let index = self.check_owned(id)?;
        self.nodes[index].state = NodeState::Ready(value);
        Ok(())
    }

    /// Drops every operator node's value. Leaf values are kept.
    pub fn clear_computed(&mut self) {
        for node in self.nodes.iter_mut().filter(|node| !node.op.is_leaf()) {
            node.state = NodeState::Pending;
        }
    }

    /// Orders nodes so every operand precedes its consumers. Ties break by creation order.
    pub fn topological_order(&self) -> Result<Vec<NodeId>> {
        topology::order(&self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::broadcast_add;

    fn vector(values: &[f64]) -> Tensor {
        Tensor::from_vec([values.len()], values.to_vec()).unwrap()
    }

    #[test]
    fn ids_are_scoped_to_their_graph() {
        let mut first = Graph::new();
        let mut second = Graph::new();
        let a = first.add_leaf(vector(&[1.0]));
        second.add_leaf(vector(&[2.0]));

        assert_ne!(first.id(), second.id());
        let err = second.node(a).unwrap_err();
        assert!(matches!(err, GraphError::ForeignNode { .. }));
    }

    #[test]
    fn set_value_rejects_operator_nodes_and_reshapes() {
        let mut graph = Graph::new();
        let a = graph.add_leaf(vector(&[1.0, 2.0]));
        let b = graph.add_leaf(vector(&[3.0, 4.0]));
        let sum = broadcast_add(&mut graph, a, b, &[], &[]).unwrap();

        assert_eq!(
            graph.set_value(sum, vector(&[0.0, 0.0])).unwrap_err(),
            GraphError::NotALeaf(sum)
        );
        assert!(matches!(
            graph.set_value(a, vector(&[1.0, 2.0, 3.0])).unwrap_err(),
            GraphError::InvalidTensor(_)
        ));
        graph.set_value(a, vector(&[5.0, 6.0])).unwrap();
        assert_eq!(graph.value(a).map(Tensor::to_f64_vec), Some(vec![5.0, 6.0]));
    }

    #[test]
    fn names_are_searchable() {
        let mut graph = Graph::new();
        let x = graph.add_named_leaf("x", vector(&[1.0]));
        let y = graph.add_leaf(vector(&[2.0]));
        let sum = broadcast_add(&mut graph, x, y, &[], &[]).unwrap();
        graph.set_name(sum, "sum").unwrap();

        assert_eq!(graph.node_by_name("x"), Some(x));
        assert_eq!(graph.node_by_name("sum"), Some(sum));
        assert_eq!(graph.node_by_name("missing"), None);
    }

    #[test]
    fn failed_operator_leaves_graph_untouched() {
        let mut graph = Graph::new();
        let a = graph.add_leaf(vector(&[1.0, 2.0]));
        let b = graph.add_leaf(vector(&[1.0, 2.0, 3.0]));
        assert!(broadcast_add(&mut graph, a, b, &[], &[]).is_err());
        assert_eq!(graph.len(), 2);
    }
}
