//! `divmod` over the numeric tower.
//!
//! Operands are promoted to the lowest layer both embed into and that layer's
//! algorithm computes the `(quotient, remainder)` pair with floor semantics.

mod complex;
mod integer;
mod native;
mod rational;
mod real;

use log::{debug, trace};

use crate::{
    args::ArgValues,
    context::{with_current_context, with_writable, Context},
    exception::{ExcType, RunResult},
    resource::{NoLimitTracker, ResourceError, ResourceTracker},
    types::Layer,
    value::Value,
};

/// Computes `divmod(x, y)` under `ctx`, or under the thread's current context.
///
/// Fails with `TypeError` when no layer of the tower accepts both operands.
pub fn divmod(x: &Value, y: &Value, ctx: Option<&mut Context>) -> RunResult<(Value, Value)> {
    divmod_tracked(x, y, ctx, &mut NoLimitTracker)
}

/// Like [`divmod`], accounting the result pair against `tracker`.
pub fn divmod_tracked(
    x: &Value,
    y: &Value,
    ctx: Option<&mut Context>,
    tracker: &mut impl ResourceTracker,
) -> RunResult<(Value, Value)> {
    match ctx {
        Some(ctx) => number_divmod(x, y, ctx, tracker),
        None => with_current_context(|ctx| number_divmod(x, y, ctx, tracker)),
    }
}

impl Context {
    /// Context-bound `div_mod(x, y)`.
    ///
    /// A read-only context is left untouched and the flags raised by the call are dropped.
    pub fn divmod(&mut self, args: ArgValues) -> RunResult<(Value, Value)> {
        self.divmod_tracked(args, &mut NoLimitTracker)
    }

    pub fn divmod_tracked(&mut self, args: ArgValues, tracker: &mut impl ResourceTracker) -> RunResult<(Value, Value)> {
        let (x, y) = args.get_two_args("div_mod")?;
        number_divmod(&x, &y, self, tracker)
    }
}

/// The `divmod` slot of `owner`'s type, run under the current context.
///
/// `Ok(None)` means the slot does not handle these operands, matching
/// Python's `NotImplemented`. Native types own no slot.
pub fn divmod_slot(owner: &Value, x: &Value, y: &Value) -> RunResult<Option<(Value, Value)>> {
    let Some(start) = owner.py_type().slot_layer() else {
        return Ok(None);
    };
    if start == Layer::Complex {
        return Err(ExcType::type_error_complex_floor());
    }
    with_current_context(|ctx| with_writable(ctx, |ctx| dispatch(start, x, y, ctx, &mut NoLimitTracker)))
}

/// Operator-level `divmod(x, y)` as Python evaluates it.
///
/// Two native numbers keep native semantics and types. Otherwise the left
/// operand's slot runs, then the right operand's reflected slot.
pub fn py_divmod(x: &Value, y: &Value) -> RunResult<(Value, Value)> {
    if let Some(pair) = native::divmod(x, y)? {
        return Ok(pair);
    }
    if let Some(pair) = divmod_slot(x, x, y)? {
        return Ok(pair);
    }
    let (x_type, y_type) = (x.py_type(), y.py_type());
    if x_type != y_type {
        debug!("divmod: {x_type} slot declined, retrying with reflected {y_type} slot");
        if let Some(pair) = divmod_slot(y, x, y)? {
            return Ok(pair);
        }
    }
    Err(ExcType::type_error_unsupported_divmod(x_type, y_type))
}

fn number_divmod(
    x: &Value,
    y: &Value,
    ctx: &mut Context,
    tracker: &mut impl ResourceTracker,
) -> RunResult<(Value, Value)> {
    with_writable(ctx, |ctx| dispatch(Layer::Integer, x, y, ctx, tracker))?
        .ok_or_else(ExcType::type_error_divmod_argument)
}

/// Runs the algorithm of the first layer from `start` upwards that admits both operands.
fn dispatch(
    start: Layer,
    x: &Value,
    y: &Value,
    ctx: &mut Context,
    tracker: &mut impl ResourceTracker,
) -> RunResult<Option<(Value, Value)>> {
    let (Some(x_layer), Some(y_layer)) = (x.layer(), y.layer()) else {
        return Ok(None);
    };
    let Some(layer) = start
        .and_above()
        .find(|layer| layer.admits(x_layer) && layer.admits(y_layer))
    else {
        return Ok(None);
    };
    trace!("divmod: {} and {} dispatched to {layer:?}", x.py_type(), y.py_type());
    let pair = match layer {
        Layer::Integer => integer::divmod(x, y, tracker)?,
        Layer::Rational => rational::divmod(x, y, tracker)?,
        Layer::Real => real::divmod(x, y, ctx, tracker)?,
        Layer::Complex => return Err(complex::divmod()),
    };
    Ok(Some(pair))
}

/// Accounts for the two values of a result pair, `size` bytes each.
fn reserve_pair(tracker: &mut impl ResourceTracker, size: usize) -> Result<(), ResourceError> {
    tracker.on_allocate(|| size)?;
    tracker.on_allocate(|| size)
}
