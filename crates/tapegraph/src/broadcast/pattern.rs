use std::fmt;

use smallvec::SmallVec;

pub type Axes = SmallVec<[u8; 4]>;

/// Identifies one operand of a binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Output axes along which each operand is broadcast. Axes are kept sorted and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BroadcastPattern {
    left: Axes,
    right: Axes,
}

impl BroadcastPattern {
    pub fn new(left: &[u8], right: &[u8]) -> Self {
        BroadcastPattern {
            left: normalize(left),
            right: normalize(right),
        }
    }

    /// Pattern with no declared axes on either side.
    pub fn none() -> Self {
        BroadcastPattern::default()
    }

    pub fn left(&self) -> &[u8] {
        &self.left
    }

    pub fn right(&self) -> &[u8] {
        &self.right
    }

    pub fn axes(&self, side: Side) -> &[u8] {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn declares(&self, side: Side, axis: usize) -> bool {
        self.axes(side).iter().any(|&a| usize::from(a) == axis)
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

fn normalize(axes: &[u8]) -> Axes {
    let mut axes = Axes::from_slice(axes);
    axes.sort_unstable();
    axes.dedup();
    axes
}

impl fmt::Display for BroadcastPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "left={:?} right={:?}", self.left.as_slice(), self.right.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_are_sorted_and_deduplicated() {
        let pattern = BroadcastPattern::new(&[2, 0, 2], &[]);
        assert_eq!(pattern.left(), &[0, 2]);
        assert!(pattern.declares(Side::Left, 2));
        assert!(!pattern.declares(Side::Right, 0));
        assert_eq!(pattern.to_string(), "left=[0, 2] right=[]");
    }
}
