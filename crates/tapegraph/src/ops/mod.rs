//! Binary operators and the graph-building entry points that apply them.

mod binary;
mod registry;

pub use binary::{
    broadcast_add, broadcast_binary, broadcast_div, broadcast_maximum, broadcast_minimum,
    broadcast_mul, broadcast_sub,
};
pub use registry::{
    lookup_binary_operator, register_binary_operator, registered_operators, BinaryOp,
    CustomOpId, ScalarKernel,
};
