use std::fmt::Debug;
use std::sync::Arc;

use super::dtype::DType;
use super::host_tensor::TensorData;

/// Scalar types that can back a [`Tensor`](super::Tensor).
pub trait Element: Copy + Default + Debug + PartialEq + Send + Sync + 'static {
    const DTYPE: DType;

    fn is_nan(self) -> bool;
    fn is_infinite(self) -> bool;
    fn to_f64(self) -> f64;

    fn into_data(values: Vec<Self>) -> TensorData;
    fn view(data: &TensorData) -> Option<&[Self]>;
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }

    fn is_infinite(self) -> bool {
        f32::is_infinite(self)
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn into_data(values: Vec<Self>) -> TensorData {
        TensorData::F32(Arc::from(values))
    }

    fn view(data: &TensorData) -> Option<&[Self]> {
        match data {
            TensorData::F32(values) => Some(values),
            _ => None,
        }
    }
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    fn is_nan(self) -> bool {
        f64::is_nan(self)
    }

    fn is_infinite(self) -> bool {
        f64::is_infinite(self)
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn into_data(values: Vec<Self>) -> TensorData {
        TensorData::F64(Arc::from(values))
    }

    fn view(data: &TensorData) -> Option<&[Self]> {
        match data {
            TensorData::F64(values) => Some(values),
            _ => None,
        }
    }
}
