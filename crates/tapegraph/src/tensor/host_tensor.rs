use std::sync::Arc;

use crate::error::{GraphError, Result};

use super::dtype::DType;
use super::shape::Shape;
use super::storage::Element;

/// Shared, immutable element buffer. Cloning a tensor never copies elements.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    F32(Arc<[f32]>),
    F64(Arc<[f64]>),
}

impl TensorData {
    pub fn dtype(&self) -> DType {
        match self {
            TensorData::F32(_) => DType::F32,
            TensorData::F64(_) => DType::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TensorData::F32(values) => values.len(),
            TensorData::F64(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Row-major host tensor whose buffer length always equals its shape's element count.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    data: TensorData,
}

impl Tensor {
    pub fn from_vec<E: Element>(shape: impl Into<Shape>, values: Vec<E>) -> Result<Self> {
        let shape = shape.into();
        let expected = shape.checked_num_elements().ok_or_else(|| {
            GraphError::InvalidTensor(format!("element count of shape {shape} overflows"))
        })?;
        if values.len() != expected {
            return Err(GraphError::InvalidTensor(format!(
                "shape {shape} needs {expected} elements, got {}",
                values.len()
            )));
        }
        Ok(Tensor {
            shape,
            data: E::into_data(values),
        })
    }

    pub fn scalar<E: Element>(value: E) -> Self {
        Tensor {
            shape: Shape::scalar(),
            data: E::into_data(vec![value]),
        }
    }

    pub fn zeros(shape: impl Into<Shape>, dtype: DType) -> Result<Self> {
        let shape = shape.into();
        let len = shape.checked_num_elements().ok_or_else(|| {
            GraphError::InvalidTensor(format!("element count of shape {shape} overflows"))
        })?;
        let data = match dtype {
            DType::F32 => f32::into_data(vec![0.0; len]),
            DType::F64 => f64::into_data(vec![0.0; len]),
        };
        Ok(Tensor { shape, data })
    }

    /// Wraps an already validated buffer. Callers guarantee the length matches.
    pub(crate) fn from_parts(shape: Shape, data: TensorData) -> Self {
        debug_assert_eq!(shape.num_elements(), data.len());
        Tensor { shape, data }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn data(&self) -> &TensorData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Typed view of the elements, or `None` when `E` is not this tensor's dtype.
    pub fn as_slice<E: Element>(&self) -> Option<&[E]> {
        E::view(&self.data)
    }

    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match &self.data {
            TensorData::F32(values) => values.get(index).map(|v| f64::from(*v)),
            TensorData::F64(values) => values.get(index).copied(),
        }
    }

    /// Copies the elements out, widening to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match &self.data {
            TensorData::F32(values) => values.iter().map(|v| v.to_f64()).collect(),
            TensorData::F64(values) => values.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_checks_element_count() {
        let err = Tensor::from_vec([2, 2], vec![1.0f64, 2.0, 3.0])
            .expect_err("three elements cannot fill a 2x2 tensor");
        assert!(matches!(err, GraphError::InvalidTensor(_)));
    }

    #[test]
    fn typed_views_follow_dtype() {
        let tensor = Tensor::from_vec([3], vec![1.0f32, 2.0, 3.0]).unwrap();
        assert_eq!(tensor.dtype(), DType::F32);
        assert_eq!(tensor.as_slice::<f32>(), Some(&[1.0f32, 2.0, 3.0][..]));
        assert!(tensor.as_slice::<f64>().is_none());
        assert_eq!(tensor.to_f64_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn zeros_and_scalars() {
        let zeros = Tensor::zeros([2, 0], DType::F64).unwrap();
        assert!(zeros.is_empty());
        assert_eq!(zeros.shape(), &Shape::new([2, 0]));

        let scalar = Tensor::scalar(7.5f64);
        assert_eq!(scalar.shape().rank(), 0);
        assert_eq!(scalar.get_f64(0), Some(7.5));
    }

    #[test]
    fn clones_share_the_buffer() {
        let tensor = Tensor::from_vec([2], vec![1.0f64, 2.0]).unwrap();
        let copy = tensor.clone();
        match (tensor.data(), copy.data()) {
            (TensorData::F64(a), TensorData::F64(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("expected f64 buffers"),
        }
    }
}
