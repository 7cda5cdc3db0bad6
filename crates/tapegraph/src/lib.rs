//! Computation graphs over host tensors with axis-hinted broadcasting.
//!
//! Callers build a [`Graph`], wrap input tensors as leaf nodes, and combine nodes with the
//! broadcast-aware binary operators in [`ops`]. Broadcast hints are validated when an operator
//! is applied, so a bad axis or an incompatible pair of shapes is reported before anything
//! runs. A [`TapeMachine`] then linearises the graph into a [`Tape`] and executes it, writing
//! each node's value back into the graph.
//!
//! ```
//! use tapegraph::{ops, Graph, TapeMachine, Tensor};
//!
//! # fn main() -> tapegraph::Result<()> {
//! let mut graph = Graph::new();
//! let v = graph.add_named_leaf("v", Tensor::from_vec([2], vec![100.0f64, 200.0])?);
//! let m = graph.add_named_leaf("m", Tensor::from_vec([2, 2], vec![1.0f64, 2.0, 3.0, 4.0])?);
//! let sum = ops::broadcast_add(&mut graph, v, m, &[1], &[])?;
//!
//! let mut machine = TapeMachine::new(&mut graph);
//! machine.run_all()?;
//! let value = machine.value(sum).map(|t| t.to_f64_vec());
//! assert_eq!(value, Some(vec![101.0, 102.0, 203.0, 204.0]));
//! machine.close()?;
//! # Ok(())
//! # }
//! ```

pub mod broadcast;
mod env;
pub mod error;
pub mod graph;
pub mod logging;
pub mod machine;
pub mod ops;
pub mod tensor;

pub use broadcast::{resolve, BroadcastPattern, BroadcastPlan, OperandPlan, Side};
pub use error::{GraphError, PatternViolation, Result};
pub use graph::{Graph, Node, NodeId, NodeOp};
pub use machine::{with_machine, MachineConfig, MachineState, RunStats, Tape, TapeMachine};
pub use ops::{BinaryOp, ScalarKernel};
pub use tensor::{DType, Element, Shape, Tensor, TensorData};
