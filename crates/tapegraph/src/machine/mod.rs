//! Tape compilation and execution.
//!
//! A [`TapeMachine`] borrows a graph mutably for its whole lifetime, so the graph cannot be
//! edited while a compiled tape refers to it. The machine moves through
//! [`MachineState`]s: `Built -> Compiled -> Running -> Done`, and `Closed` from anywhere.

mod config;
mod kernels;
mod tape;
pub mod timing;

use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::error::{GraphError, Result};
use crate::graph::{Graph, NodeId};
use crate::tensor::Tensor;

pub use config::MachineConfig;
pub use tape::{Instruction, InstructionKind, Tape};
pub use timing::RunStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Built,
    Compiled,
    Running,
    Done,
    Closed,
}

pub struct TapeMachine<'g> {
    graph: &'g mut Graph,
    config: MachineConfig,
    state: MachineState,
    tape: Option<Tape>,
    coords: Vec<usize>,
    stats: RunStats,
}

impl<'g> TapeMachine<'g> {
    /// Creates a machine configured from the environment.
    pub fn new(graph: &'g mut Graph) -> Self {
        Self::with_config(graph, MachineConfig::from_env())
    }

    pub fn with_config(graph: &'g mut Graph, config: MachineConfig) -> Self {
        debug!(graph = graph.id(), ?config, "created tape machine");
        TapeMachine {
            graph,
            config,
            state: MachineState::Built,
            tape: None,
            coords: Vec::new(),
            stats: RunStats::default(),
        }
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    pub fn tape(&self) -> Option<&Tape> {
        self.tape.as_ref()
    }

    pub fn value(&self, node: NodeId) -> Option<&Tensor> {
        self.graph.value(node)
    }

    /// Linearises the graph. Compiling an already compiled machine is a no-op.
    pub fn compile(&mut self) -> Result<&Tape> {
        if self.state == MachineState::Closed {
            return Err(GraphError::MachineClosed);
        }
        if self.tape.is_none() {
            let started = Instant::now();
            let tape = Tape::compile(self.graph)?;
            let elapsed = started.elapsed();
            timing::add_compile_time(elapsed);
            self.stats.compile_time = elapsed;
            debug!(
                graph = self.graph.id(),
                instructions = tape.len(),
                elapsed_us = elapsed.as_micros() as u64,
                "compiled tape"
            );
            self.tape = Some(tape);
            self.state = MachineState::Compiled;
        }
        self.tape.as_ref().ok_or(GraphError::MachineClosed)
    }

    /// Executes every instruction, compiling first when needed.
    ///
    /// On failure the machine returns to `Compiled`; values computed before the failing
    /// instruction stay in the graph. Running again re-executes the whole tape.
    pub fn run_all(&mut self) -> Result<()> {
        self.compile()?;
        let Some(tape) = self.tape.as_ref() else {
            return Err(GraphError::MachineClosed);
        };

        self.state = MachineState::Running;
        let started = Instant::now();
        let result = execute(tape, self.graph, &mut self.coords, &self.config);
        let elapsed = started.elapsed();

        match result {
            Ok(executed) => {
                self.state = MachineState::Done;
                self.stats.run_time = elapsed;
                self.stats.executed = executed;
                self.stats.runs += 1;
                debug!(
                    executed,
                    elapsed_us = elapsed.as_micros() as u64,
                    "tape run finished"
                );
                Ok(())
            }
            Err(err) => {
                self.state = MachineState::Compiled;
                warn!(error = %err, "tape run failed");
                Err(err)
            }
        }
    }

    /// Releases the tape and working buffers. Closing twice is an error.
    pub fn close(&mut self) -> Result<()> {
        if self.state == MachineState::Closed {
            return Err(GraphError::MachineClosed);
        }
        self.release();
        debug!(graph = self.graph.id(), "closed tape machine");
        Ok(())
    }

    fn release(&mut self) {
        self.tape = None;
        self.coords = Vec::new();
        self.state = MachineState::Closed;
    }
}

impl Drop for TapeMachine<'_> {
    fn drop(&mut self) {
        if self.state != MachineState::Closed {
            trace!(graph = self.graph.id(), "releasing tape machine on drop");
            self.release();
        }
    }
}

/// Runs `f` against a fresh machine and closes it afterwards, whatever `f` returns.
///
/// An error from `f` takes precedence over an error from closing.
pub fn with_machine<R>(
    graph: &mut Graph,
    config: MachineConfig,
    f: impl FnOnce(&mut TapeMachine<'_>) -> Result<R>,
) -> Result<R> {
    let mut machine = TapeMachine::with_config(graph, config);
    let result = f(&mut machine);
    let closed = if machine.state() == MachineState::Closed {
        Ok(())
    } else {
        machine.close()
    };
    let value = result?;
    closed?;
    Ok(value)
}

fn execute(
    tape: &Tape,
    graph: &mut Graph,
    coords: &mut Vec<usize>,
    config: &MachineConfig,
) -> Result<usize> {
    let mut executed = 0usize;
    for instruction in tape.instructions() {
        let node = instruction.node();
        match instruction.kind() {
            InstructionKind::Load => {
                if graph.value(node).is_none() {
                    return Err(GraphError::execution(node, "leaf has no bound value"));
                }
            }
            InstructionKind::Binary {
                kernel,
                lhs,
                rhs,
                plan,
                ..
            } => {
                let output = {
                    let a = graph.value(*lhs).ok_or_else(|| {
                        GraphError::execution(node, format!("operand {lhs} has no value"))
                    })?;
                    let b = graph.value(*rhs).ok_or_else(|| {
                        GraphError::execution(node, format!("operand {rhs} has no value"))
                    })?;
                    kernels::apply_binary(*kernel, plan, a, b, coords)
                        .map_err(|message| GraphError::execution(node, message))?
                };
                kernels::check_finite(&output, config.nan_guard, config.inf_guard)
                    .map_err(|message| GraphError::execution(node, message))?;
                if config.log_values {
                    trace!(node = %node, values = ?output.to_f64_vec(), "computed value");
                }
                graph.set_computed(node, output)?;
            }
        }
        executed += 1;
    }
    Ok(executed)
}
