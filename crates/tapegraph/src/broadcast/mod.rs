//! Axis-hinted broadcasting.
//!
//! Each operand of a binary operator may declare which output axes it is expanded along. The
//! resolver checks those declarations against the operand shapes and produces a
//! [`BroadcastPlan`] that kernels walk with zero strides on expanded axes.

mod pattern;
mod resolve;

pub use pattern::{Axes, BroadcastPattern, Side};
pub use resolve::{resolve, BroadcastPlan, OperandPlan};
