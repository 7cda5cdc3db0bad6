use crate::broadcast::BroadcastPlan;
use crate::ops::ScalarKernel;
use crate::tensor::{Element, Tensor, TensorData};

/// Applies `kernel` across the broadcast output described by `plan`.
///
/// Operands are re-checked against the shapes the plan was resolved for. `coords` is a
/// reusable odometer buffer.
pub(crate) fn apply_binary(
    kernel: ScalarKernel,
    plan: &BroadcastPlan,
    lhs: &Tensor,
    rhs: &Tensor,
    coords: &mut Vec<usize>,
) -> Result<Tensor, String> {
    let operands = [
        ("left", lhs, plan.left().shape()),
        ("right", rhs, plan.right().shape()),
    ];
    for (side, tensor, expected) in operands {
        if tensor.shape() != expected {
            return Err(format!(
                "{side} operand has shape {}, expected {expected}",
                tensor.shape()
            ));
        }
    }

    let data = match (lhs.data(), rhs.data()) {
        (TensorData::F32(a), TensorData::F32(b)) => {
            f32::into_data(broadcast_map(a, b, plan, coords, kernel.f32))
        }
        (TensorData::F64(a), TensorData::F64(b)) => {
            f64::into_data(broadcast_map(a, b, plan, coords, kernel.f64))
        }
        (a, b) => {
            return Err(format!(
                "operand dtypes differ: {} vs {}",
                a.dtype(),
                b.dtype()
            ))
        }
    };
    Ok(Tensor::from_parts(plan.output_shape().clone(), data))
}

/// Row-major walk over the output index space, stepping each operand by its plan strides.
fn broadcast_map<E: Element>(
    lhs: &[E],
    rhs: &[E],
    plan: &BroadcastPlan,
    coords: &mut Vec<usize>,
    f: fn(E, E) -> E,
) -> Vec<E> {
    let dims = plan.output_shape().dims();
    let len = plan.output_shape().num_elements();
    let mut out = Vec::with_capacity(len);
    if len == 0 {
        return out;
    }

    let lhs_strides = plan.left().strides();
    let rhs_strides = plan.right().strides();
    coords.clear();
    coords.resize(dims.len(), 0);

    let (mut li, mut ri) = (0usize, 0usize);
    for _ in 0..len {
        out.push(f(lhs[li], rhs[ri]));
        for axis in (0..dims.len()).rev() {
            coords[axis] += 1;
            li += lhs_strides[axis];
            ri += rhs_strides[axis];
            if coords[axis] < dims[axis] {
                break;
            }
            li -= lhs_strides[axis] * dims[axis];
            ri -= rhs_strides[axis] * dims[axis];
            coords[axis] = 0;
        }
    }
    out
}

/// Reports the first non-finite element the enabled guards forbid.
pub(crate) fn check_finite(tensor: &Tensor, nan_guard: bool, inf_guard: bool) -> Result<(), String> {
    if !nan_guard && !inf_guard {
        return Ok(());
    }
    let offending = match tensor.data() {
        TensorData::F32(values) => first_offending(values, nan_guard, inf_guard),
        TensorData::F64(values) => first_offending(values, nan_guard, inf_guard),
    };
    match offending {
        Some((index, value)) => Err(format!("produced {value} at flat index {index}")),
        None => Ok(()),
    }
}

fn first_offending<E: Element>(
    values: &[E],
    nan_guard: bool,
    inf_guard: bool,
) -> Option<(usize, f64)> {
    values
        .iter()
        .position(|v| (nan_guard && v.is_nan()) || (inf_guard && v.is_infinite()))
        .map(|index| (index, values[index].to_f64()))
}
