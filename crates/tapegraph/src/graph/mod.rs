//! Arena-backed dataflow graph.

mod arena;
mod state;
mod topology;

pub use arena::Graph;
pub use state::{Node, NodeId, NodeOp};
