use std::collections::HashMap;
use std::fmt;
use std::sync::{OnceLock, PoisonError, RwLock};

use tracing::debug;

use crate::error::{GraphError, Result};

/// Element-wise function evaluated once per output element.
#[derive(Debug, Clone, Copy)]
pub struct ScalarKernel {
    pub f32: fn(f32, f32) -> f32,
    pub f64: fn(f64, f64) -> f64,
}

impl ScalarKernel {
    pub const fn new(f32: fn(f32, f32) -> f32, f64: fn(f64, f64) -> f64) -> Self {
        ScalarKernel { f32, f64 }
    }
}

/// Handle for an operator added through [`register_binary_operator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CustomOpId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Maximum,
    Minimum,
    Custom(CustomOpId),
}

impl BinaryOp {
    pub const ARITY: usize = 2;

    pub const BUILTINS: [BinaryOp; 6] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Maximum,
        BinaryOp::Minimum,
    ];

    fn builtin_name(self) -> Option<&'static str> {
        match self {
            BinaryOp::Add => Some("add"),
            BinaryOp::Sub => Some("sub"),
            BinaryOp::Mul => Some("mul"),
            BinaryOp::Div => Some("div"),
            BinaryOp::Maximum => Some("maximum"),
            BinaryOp::Minimum => Some("minimum"),
            BinaryOp::Custom(_) => None,
        }
    }

    pub fn name(self) -> String {
        match (self.builtin_name(), self) {
            (Some(name), _) => name.to_string(),
            (None, BinaryOp::Custom(id)) => registry()
                .read(id)
                .map(|entry| entry.name)
                .unwrap_or_else(|| format!("custom#{}", id.0)),
            (None, _) => String::from("unknown"),
        }
    }

    /// Resolves the scalar kernel backing this operator.
    pub fn kernel(self) -> Result<ScalarKernel> {
        Ok(match self {
            BinaryOp::Add => ScalarKernel::new(|a, b| a + b, |a, b| a + b),
            BinaryOp::Sub => ScalarKernel::new(|a, b| a - b, |a, b| a - b),
            BinaryOp::Mul => ScalarKernel::new(|a, b| a * b, |a, b| a * b),
            BinaryOp::Div => ScalarKernel::new(|a, b| a / b, |a, b| a / b),
            BinaryOp::Maximum => ScalarKernel::new(f32::max, f64::max),
            BinaryOp::Minimum => ScalarKernel::new(f32::min, f64::min),
            BinaryOp::Custom(id) => {
                registry()
                    .read(id)
                    .ok_or_else(|| GraphError::UnknownOperator(format!("custom#{}", id.0)))?
                    .kernel
            }
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[derive(Clone)]
struct RegisteredOperator {
    name: String,
    kernel: ScalarKernel,
}

#[derive(Default)]
struct Inner {
    entries: Vec<RegisteredOperator>,
    by_name: HashMap<String, CustomOpId>,
}

struct OperatorRegistry {
    inner: RwLock<Inner>,
}

impl OperatorRegistry {
    fn read(&self, id: CustomOpId) -> Option<RegisteredOperator> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.entries.get(id.0 as usize).cloned()
    }
}

static REGISTRY: OnceLock<OperatorRegistry> = OnceLock::new();

fn registry() -> &'static OperatorRegistry {
    REGISTRY.get_or_init(|| OperatorRegistry {
        inner: RwLock::new(Inner::default()),
    })
}

/// Adds a named element-wise operator to the process-wide registry.
///
/// Names are unique across built-in and registered operators; reusing one fails with
/// [`GraphError::DuplicateOperator`].
pub fn register_binary_operator(name: impl Into<String>, kernel: ScalarKernel) -> Result<BinaryOp> {
    let name = name.into();
    if BinaryOp::BUILTINS
        .iter()
        .any(|op| op.builtin_name() == Some(name.as_str()))
    {
        return Err(GraphError::DuplicateOperator(name));
    }

    let mut inner = registry()
        .inner
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if inner.by_name.contains_key(&name) {
        return Err(GraphError::DuplicateOperator(name));
    }
    let id = u32::try_from(inner.entries.len())
        .map(CustomOpId)
        .map_err(|_| GraphError::Config("operator registry is full".to_string()))?;
    inner.entries.push(RegisteredOperator {
        name: name.clone(),
        kernel,
    });
    inner.by_name.insert(name.clone(), id);
    debug!(operator = %name, id = id.0, "registered binary operator");
    Ok(BinaryOp::Custom(id))
}

/// Finds a built-in or registered operator by name.
pub fn lookup_binary_operator(name: &str) -> Option<BinaryOp> {
    if let Some(op) = BinaryOp::BUILTINS
        .iter()
        .copied()
        .find(|op| op.builtin_name() == Some(name))
    {
        return Some(op);
    }
    let inner = registry()
        .inner
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    inner.by_name.get(name).copied().map(BinaryOp::Custom)
}

/// Names of every available operator, built-ins first.
pub fn registered_operators() -> Vec<String> {
    let mut names: Vec<String> = BinaryOp::BUILTINS.iter().map(|op| op.name()).collect();
    let inner = registry()
        .inner
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    names.extend(inner.entries.iter().map(|entry| entry.name.clone()));
    names
}
