use std::fmt;

use crate::broadcast::{BroadcastPattern, BroadcastPlan};
use crate::error::{GraphError, Result};
use crate::graph::{Graph, NodeId, NodeOp};
use crate::ops::{BinaryOp, ScalarKernel};
use crate::tensor::Shape;

#[derive(Debug, Clone)]
pub enum InstructionKind {
    /// Checks that a leaf holds a value.
    Load,
    Binary {
        op: BinaryOp,
        kernel: ScalarKernel,
        lhs: NodeId,
        rhs: NodeId,
        pattern: BroadcastPattern,
        plan: BroadcastPlan,
    },
}

#[derive(Debug, Clone)]
pub struct Instruction {
    node: NodeId,
    name: Option<String>,
    shape: Shape,
    kind: InstructionKind,
}

impl Instruction {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn kind(&self) -> &InstructionKind {
        &self.kind
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

/// Linear program produced from a graph: one instruction per node, operands first.
#[derive(Debug, Clone, Default)]
pub struct Tape {
    instructions: Vec<Instruction>,
}

impl Tape {
    pub(crate) fn compile(graph: &Graph) -> Result<Self> {
        let order = graph.topological_order()?;
        let mut instructions = Vec::with_capacity(order.len());
        for id in order {
            let node = graph.node(id)?;
            let expected = node.op().arity();
            if node.operands().len() != expected {
                return Err(GraphError::ArityMismatch {
                    node: id,
                    op: node.op().name(),
                    expected,
                    found: node.operands().len(),
                });
            }
            let kind = match (node.op(), node.operands()) {
                (NodeOp::Binary { op, pattern, plan }, &[lhs, rhs]) => InstructionKind::Binary {
                    op: *op,
                    kernel: op.kernel()?,
                    lhs,
                    rhs,
                    pattern: pattern.clone(),
                    plan: plan.clone(),
                },
                _ => InstructionKind::Load,
            };
            instructions.push(Instruction {
                node: id,
                name: node.name().map(str::to_owned),
                shape: node.shape().clone(),
                kind,
            });
        }
        Ok(Tape { instructions })
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn position(&self, node: NodeId) -> Option<usize> {
        self.instructions.iter().position(|instr| instr.node == node)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = ", self.node)?;
        match &self.kind {
            InstructionKind::Load => f.write_str("load")?,
            InstructionKind::Binary {
                op,
                lhs,
                rhs,
                pattern,
                ..
            } => {
                write!(f, "{op}({lhs}, {rhs})")?;
                if !pattern.is_empty() {
                    write!(f, " bcast {pattern}")?;
                }
            }
        }
        write!(f, " : {}", self.shape)?;
        if let Some(name) = &self.name {
            write!(f, " \"{name}\"")?;
        }
        Ok(())
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;
    use crate::broadcast::resolve;
    use crate::ops::broadcast_add;
    use crate::tensor::Tensor;

    #[test]
    fn display_lists_instructions_in_order() {
        let mut graph = Graph::new();
        let v = graph.add_named_leaf("v", Tensor::from_vec([2], vec![1.0f64, 2.0]).unwrap());
        let m = graph.add_leaf(Tensor::from_vec([2, 2], vec![0.0f64; 4]).unwrap());
        let sum = broadcast_add(&mut graph, v, m, &[1], &[]).unwrap();

        let tape = Tape::compile(&graph).unwrap();
        assert_eq!(tape.len(), 3);
        assert_eq!(tape.position(sum), Some(2));
        assert_eq!(tape.instructions()[2].shape(), &Shape::new([2, 2]));
        assert_eq!(
            tape.to_string(),
            "%0 = load : [2] \"v\"\n\
             %1 = load : [2, 2]\n\
             %2 = add(%0, %1) bcast left=[1] right=[] : [2, 2]\n"
        );
    }

    #[test]
    fn listing_shows_declared_axes_only() {
        let mut graph = Graph::new();
        let row = graph.add_leaf(Tensor::from_vec([3], vec![0.0f64; 3]).unwrap());
        let m = graph.add_leaf(Tensor::from_vec([2, 3], vec![0.0f64; 6]).unwrap());
        let col = graph.add_leaf(Tensor::from_vec([2, 1], vec![0.0f64; 2]).unwrap());
        broadcast_add(&mut graph, row, m, &[], &[]).unwrap();
        broadcast_add(&mut graph, col, col, &[1], &[]).unwrap();

        let listing = Tape::compile(&graph).unwrap().to_string();
        assert!(listing.contains("%3 = add(%0, %1) : [2, 3]\n"), "{listing}");
        assert!(
            listing.contains("%4 = add(%2, %2) bcast left=[1] right=[] : [2, 1]\n"),
            "{listing}"
        );
    }

    #[test]
    fn operand_count_must_match_arity() {
        let mut graph = Graph::new();
        let a = graph.add_leaf(Tensor::scalar(1.0f64));
        let scalar = Shape::scalar();
        let plan = resolve(&scalar, &scalar, &BroadcastPattern::none()).unwrap();
        let lonely = graph.push_node(
            None,
            NodeOp::Binary {
                op: BinaryOp::Mul,
                pattern: BroadcastPattern::none(),
                plan,
            },
            smallvec![a],
            scalar,
        );

        let err = Tape::compile(&graph).unwrap_err();
        assert_eq!(
            err,
            GraphError::ArityMismatch {
                node: lonely,
                op: "mul".to_string(),
                expected: BinaryOp::ARITY,
                found: 1,
            }
        );
    }
}
