use std::fmt;

use smallvec::SmallVec;

/// Inline storage for dimension lists; most graphs never exceed rank 4.
pub type Dims = SmallVec<[usize; 4]>;

/// Ordered list of non-negative dimension sizes. Rank 0 denotes a scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    dims: Dims,
}

impl Shape {
    pub fn new<D: AsRef<[usize]>>(dims: D) -> Self {
        Shape {
            dims: Dims::from_slice(dims.as_ref()),
        }
    }

    pub fn scalar() -> Self {
        Shape::default()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Total element count. Saturates instead of overflowing; use
    /// [`Shape::checked_num_elements`] when validating untrusted shapes.
    pub fn num_elements(&self) -> usize {
        self.checked_num_elements().unwrap_or(usize::MAX)
    }

    pub fn checked_num_elements(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
    }

    /// Row-major element strides for a contiguous buffer of this shape.
    pub fn contiguous_strides(&self) -> Dims {
        let mut strides: Dims = SmallVec::from_elem(0, self.dims.len());
        let mut acc = 1usize;
        for (stride, &dim) in strides.iter_mut().zip(self.dims.iter()).rev() {
            *stride = acc;
            acc = acc.saturating_mul(dim.max(1));
        }
        strides
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{dim}")?;
        }
        f.write_str("]")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape {
            dims: Dims::from_vec(dims),
        }
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Shape::new(dims)
    }
}

impl From<&Shape> for Shape {
    fn from(shape: &Shape) -> Self {
        shape.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_has_one_element() {
        let shape = Shape::scalar();
        assert!(shape.is_scalar());
        assert!(!Shape::new([1]).is_scalar());
        assert_eq!(shape.num_elements(), 1);
        assert!(shape.contiguous_strides().is_empty());
    }

    #[test]
    fn zero_sized_dims_yield_no_elements() {
        assert_eq!(Shape::new([3, 0, 2]).num_elements(), 0);
    }

    #[test]
    fn strides_are_row_major() {
        let shape = Shape::new([2, 3, 4]);
        assert_eq!(shape.contiguous_strides().as_slice(), &[12, 4, 1]);
    }

    #[test]
    fn overflowing_shapes_are_detected() {
        let shape = Shape::new([usize::MAX, 2]);
        assert_eq!(shape.checked_num_elements(), None);
    }

    #[test]
    fn display_lists_dims() {
        assert_eq!(Shape::new([2, 3]).to_string(), "[2, 3]");
        assert_eq!(Shape::scalar().to_string(), "[]");
    }
}
