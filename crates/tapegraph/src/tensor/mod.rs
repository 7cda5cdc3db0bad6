//! Host tensors consumed and produced by graph nodes.

mod dtype;
mod host_tensor;
mod shape;
mod storage;

pub use dtype::DType;
pub use host_tensor::{Tensor, TensorData};
pub use shape::{Dims, Shape};
pub use storage::Element;
