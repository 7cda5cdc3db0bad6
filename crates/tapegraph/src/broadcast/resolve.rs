use smallvec::SmallVec;

use crate::error::{GraphError, PatternViolation, Result};
use crate::tensor::{Dims, Shape};

use super::pattern::{BroadcastPattern, Side};

/// How one operand maps onto the output index space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperandPlan {
    shape: Shape,
    /// One stride per output axis; zero on padded and expanded axes.
    strides: Dims,
    expanded: SmallVec<[bool; 4]>,
}

impl OperandPlan {
    /// The shape the operand had when the plan was resolved.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// True when the operand is repeated along `axis` of the output.
    pub fn is_expanded(&self, axis: usize) -> bool {
        self.expanded.get(axis).copied().unwrap_or(false)
    }

    pub fn expanded_axes(&self) -> impl Iterator<Item = usize> + '_ {
        self.expanded
            .iter()
            .enumerate()
            .filter_map(|(axis, &expanded)| expanded.then_some(axis))
    }
}

/// Result of resolving two operand shapes under a [`BroadcastPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastPlan {
    output: Shape,
    left: OperandPlan,
    right: OperandPlan,
}

impl BroadcastPlan {
    pub fn output_shape(&self) -> &Shape {
        &self.output
    }

    pub fn left(&self) -> &OperandPlan {
        &self.left
    }

    pub fn right(&self) -> &OperandPlan {
        &self.right
    }

    pub fn operand(&self, side: Side) -> &OperandPlan {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

/// An operand dimension placed on an output axis.
#[derive(Debug, Clone, Copy)]
enum Slot {
    /// The operand has no dimension on this axis.
    Padded,
    Real { size: usize, stride: usize },
}

/// Where a lower-rank operand's real dimensions sit among the output axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Real dimensions first; the missing positions are the trailing axes.
    Leading,
    /// Missing positions first; the usual trailing-dimension alignment.
    Trailing,
}

fn align(shape: &Shape, out_rank: usize, placement: Placement) -> SmallVec<[Slot; 4]> {
    let gap = out_rank - shape.rank();
    let real = shape
        .dims()
        .iter()
        .zip(shape.contiguous_strides())
        .map(|(&size, stride)| Slot::Real { size, stride });
    let padding = std::iter::repeat(Slot::Padded).take(gap);
    match placement {
        Placement::Leading => real.chain(padding).collect(),
        Placement::Trailing => padding.chain(real).collect(),
    }
}

/// Validates `pattern` against the operand shapes and computes the output shape.
///
/// Declared axes are checked first: every axis must exist in the output, then must refer to a
/// missing or size-1 dimension. Only then are the remaining axes compared, and any pair of
/// sizes that differ without a declaration is a [`GraphError::ShapeMismatch`].
///
/// Operands without declared axes are right-aligned. A lower-rank operand that declares axes
/// is first placed on the leading output axes, so declared axes past its rank are inserted
/// trailing dimensions. If its dimensions equal the leading dimensions of the other operand
/// that placement is final, and a declared axis on one of its real dimensions is an error.
/// Otherwise, when the leading placement does not resolve, the operand is right-aligned and
/// its declared axes name the leading missing positions.
pub fn resolve(left: &Shape, right: &Shape, pattern: &BroadcastPattern) -> Result<BroadcastPlan> {
    let out_rank = left.rank().max(right.rank());

    for side in Side::BOTH {
        if let Some(&axis) = pattern
            .axes(side)
            .iter()
            .find(|&&axis| usize::from(axis) >= out_rank)
        {
            return Err(GraphError::InvalidBroadcastPattern {
                side,
                axis,
                reason: PatternViolation::OutOfRange { rank: out_rank },
            });
        }
    }

    let hinted_lower = Side::BOTH.into_iter().find(|&side| {
        let (shape, _) = operands(left, right, side);
        shape.rank() < out_rank && !pattern.axes(side).is_empty()
    });
    let Some(side) = hinted_lower else {
        return resolve_placed(left, right, pattern, [Placement::Trailing; 2]);
    };

    let (shape, other) = operands(left, right, side);
    let leading = placements(side, Placement::Leading);
    let prefix_matches = shape
        .dims()
        .iter()
        .zip(other.dims())
        .all(|(own, theirs)| own == theirs);
    let placed = resolve_placed(left, right, pattern, leading);
    if prefix_matches || placed.is_ok() {
        return placed;
    }
    resolve_placed(left, right, pattern, [Placement::Trailing; 2])
}

fn operands<'a>(left: &'a Shape, right: &'a Shape, side: Side) -> (&'a Shape, &'a Shape) {
    match side {
        Side::Left => (left, right),
        Side::Right => (right, left),
    }
}

fn placements(side: Side, placement: Placement) -> [Placement; 2] {
    match side {
        Side::Left => [placement, Placement::Trailing],
        Side::Right => [Placement::Trailing, placement],
    }
}

fn resolve_placed(
    left: &Shape,
    right: &Shape,
    pattern: &BroadcastPattern,
    [left_placement, right_placement]: [Placement; 2],
) -> Result<BroadcastPlan> {
    let out_rank = left.rank().max(right.rank());
    let lhs = align(left, out_rank, left_placement);
    let rhs = align(right, out_rank, right_placement);

    for (side, slots) in [(Side::Left, &lhs), (Side::Right, &rhs)] {
        for &axis in pattern.axes(side) {
            if let Slot::Real { size, .. } = slots[usize::from(axis)] {
                if size != 1 {
                    return Err(GraphError::InvalidBroadcastPattern {
                        side,
                        axis,
                        reason: PatternViolation::NotBroadcastable { size },
                    });
                }
            }
        }
    }

    let mut output = Dims::with_capacity(out_rank);
    let mut left_plan = PlanBuilder::with_rank(out_rank);
    let mut right_plan = PlanBuilder::with_rank(out_rank);

    for axis in 0..out_rank {
        // A padded axis behaves like a declared size-1 dimension.
        let (l, l_free) = match lhs[axis] {
            Slot::Padded => (1, true),
            Slot::Real { size, .. } => (size, pattern.declares(Side::Left, axis)),
        };
        let (r, r_free) = match rhs[axis] {
            Slot::Padded => (1, true),
            Slot::Real { size, .. } => (size, pattern.declares(Side::Right, axis)),
        };

        let size = if l == r {
            l
        } else if l_free {
            left_plan.expanded[axis] = true;
            r
        } else if r_free {
            right_plan.expanded[axis] = true;
            l
        } else {
            return Err(GraphError::ShapeMismatch {
                axis,
                left: l,
                right: r,
                left_shape: left.clone(),
                right_shape: right.clone(),
            });
        };
        output.push(size);

        left_plan.set_stride(axis, lhs[axis]);
        right_plan.set_stride(axis, rhs[axis]);
    }

    Ok(BroadcastPlan {
        output: Shape::from(output.into_vec()),
        left: left_plan.finish(left),
        right: right_plan.finish(right),
    })
}

struct PlanBuilder {
    strides: Dims,
    expanded: SmallVec<[bool; 4]>,
}

impl PlanBuilder {
    fn with_rank(rank: usize) -> Self {
        PlanBuilder {
            strides: SmallVec::from_elem(0, rank),
            expanded: SmallVec::from_elem(false, rank),
        }
    }

    fn set_stride(&mut self, axis: usize, slot: Slot) {
        self.strides[axis] = match slot {
            Slot::Real { stride, .. } if !self.expanded[axis] => stride,
            _ => 0,
        };
    }

    fn finish(self, shape: &Shape) -> OperandPlan {
        OperandPlan {
            shape: shape.clone(),
            strides: self.strides,
            expanded: self.expanded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(left: &[usize], right: &[usize], l: &[u8], r: &[u8]) -> Result<BroadcastPlan> {
        resolve(
            &Shape::new(left),
            &Shape::new(right),
            &BroadcastPattern::new(l, r),
        )
    }

    #[test]
    fn vector_expands_along_columns() {
        let plan = plan(&[2], &[2, 2], &[1], &[]).unwrap();
        assert_eq!(plan.output_shape().dims(), &[2, 2]);
        assert_eq!(plan.left().strides(), &[1, 0]);
        assert_eq!(plan.left().expanded_axes().collect::<Vec<_>>(), vec![1]);
        assert_eq!(plan.right().strides(), &[2, 1]);
    }

    #[test]
    fn row_vector_expands_along_rows() {
        let plan = plan(&[1, 2], &[2, 2], &[0], &[]).unwrap();
        assert_eq!(plan.output_shape().dims(), &[2, 2]);
        assert_eq!(plan.left().strides(), &[0, 1]);
        assert!(plan.left().is_expanded(0));
        assert!(!plan.left().is_expanded(1));
    }

    #[test]
    fn column_vector_expands_along_columns() {
        let plan = plan(&[2, 1], &[2, 2], &[1], &[]).unwrap();
        assert_eq!(plan.left().strides(), &[1, 0]);
    }

    #[test]
    fn undeclared_operands_right_align() {
        let plan = plan(&[3], &[2, 3], &[], &[]).unwrap();
        assert_eq!(plan.output_shape().dims(), &[2, 3]);
        assert_eq!(plan.left().strides(), &[0, 1]);
        assert_eq!(plan.left().expanded_axes().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn scalar_operand_is_fully_padded() {
        let plan = plan(&[], &[2, 3], &[], &[]).unwrap();
        assert_eq!(plan.output_shape().dims(), &[2, 3]);
        assert_eq!(plan.left().strides(), &[0, 0]);
    }

    #[test]
    fn declared_vector_over_rank_three() {
        let plan = plan(&[3], &[3, 4, 5], &[1, 2], &[]).unwrap();
        assert_eq!(plan.output_shape().dims(), &[3, 4, 5]);
        assert_eq!(plan.left().strides(), &[1, 0, 0]);
    }

    #[test]
    fn declared_leading_gap_right_aligns() {
        let plan = plan(&[3], &[2, 3], &[0], &[]).unwrap();
        assert_eq!(plan.output_shape().dims(), &[2, 3]);
        assert_eq!(plan.left().strides(), &[0, 1]);
        assert!(plan.left().is_expanded(0));
    }

    #[test]
    fn declared_gap_and_unit_axis_together() {
        let plan = plan(&[3, 1], &[2, 3, 4], &[0, 2], &[]).unwrap();
        assert_eq!(plan.output_shape().dims(), &[2, 3, 4]);
        assert_eq!(plan.left().strides(), &[0, 1, 0]);
        assert_eq!(plan.left().expanded_axes().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn unit_hint_that_clashes_leading_falls_back_to_trailing() {
        let plan = plan(&[1, 5], &[2, 1, 5], &[0], &[]).unwrap();
        assert_eq!(plan.output_shape().dims(), &[2, 1, 5]);
        assert_eq!(plan.left().strides(), &[0, 5, 1]);
    }

    #[test]
    fn declared_leading_gap_on_the_right_operand() {
        let plan = plan(&[4, 2, 5], &[2, 5], &[], &[0]).unwrap();
        assert_eq!(plan.output_shape().dims(), &[4, 2, 5]);
        assert_eq!(plan.right().strides(), &[0, 5, 1]);
    }

    #[test]
    fn declaring_a_real_axis_is_rejected() {
        let err = plan(&[2], &[2, 2], &[0], &[]).unwrap_err();
        assert_eq!(
            err,
            GraphError::InvalidBroadcastPattern {
                side: Side::Left,
                axis: 0,
                reason: PatternViolation::NotBroadcastable { size: 2 },
            }
        );
    }

    #[test]
    fn axis_beyond_output_rank_is_rejected() {
        let err = plan(&[1, 2], &[2, 2], &[2], &[]).unwrap_err();
        assert_eq!(
            err,
            GraphError::InvalidBroadcastPattern {
                side: Side::Left,
                axis: 2,
                reason: PatternViolation::OutOfRange { rank: 2 },
            }
        );
    }

    #[test]
    fn range_errors_win_over_eligibility_errors() {
        let err = plan(&[2, 2], &[2, 2], &[0], &[5]).unwrap_err();
        assert!(matches!(
            err,
            GraphError::InvalidBroadcastPattern {
                side: Side::Right,
                axis: 5,
                ..
            }
        ));
    }

    #[test]
    fn declaring_a_non_unit_dimension_on_the_right_is_rejected() {
        let err = plan(&[2, 4], &[1, 2], &[], &[0, 1]).unwrap_err();
        assert!(matches!(
            err,
            GraphError::InvalidBroadcastPattern {
                side: Side::Right,
                axis: 1,
                reason: PatternViolation::NotBroadcastable { size: 2 },
            }
        ));
    }

    #[test]
    fn undeclared_unit_dimension_does_not_broadcast() {
        let err = plan(&[1, 2], &[2, 2], &[], &[]).unwrap_err();
        assert!(matches!(
            err,
            GraphError::ShapeMismatch {
                axis: 0,
                left: 1,
                right: 2,
                ..
            }
        ));
    }

    #[test]
    fn both_sides_declaring_an_axis_yield_size_one() {
        let plan = plan(&[2, 1], &[2, 1], &[1], &[1]).unwrap();
        assert_eq!(plan.output_shape().dims(), &[2, 1]);
    }

    #[test]
    fn zero_sized_dimensions_resolve() {
        let plan = plan(&[0, 1], &[0, 3], &[1], &[]).unwrap();
        assert_eq!(plan.output_shape().dims(), &[0, 3]);
        assert_eq!(plan.output_shape().num_elements(), 0);
    }
}
