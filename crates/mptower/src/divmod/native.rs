//! `divmod` of Python's builtin `int`, `bool` and `float`.

use num_bigint::BigInt;

use super::integer::floor_divmod;
use crate::{
    exception::{ExcType, RunResult},
    value::Value,
};

/// Native `divmod`, or `None` unless both operands are builtin numbers.
///
/// Two Integers give `int` results, anything with a `float` gives `float`
/// results. The only quotient that overflows a word, `i64::MIN // -1`, is
/// returned as an `mpz`.
pub(super) fn divmod(x: &Value, y: &Value) -> RunResult<Option<(Value, Value)>> {
    if !(x.py_type().is_native_number() && y.py_type().is_native_number()) {
        return Ok(None);
    }
    if let (Some(a), Some(b)) = (x.as_word(), y.as_word()) {
        if b == 0 {
            return Err(ExcType::int_divmod_by_zero());
        }
        let pair = match floor_divmod(a, b) {
            Some((quot, rem)) => (Value::Int(quot), Value::Int(rem)),
            None => (Value::Mpz(-BigInt::from(a)), Value::Int(0)),
        };
        return Ok(Some(pair));
    }
    let (quot, rem) = float_divmod(as_f64(x), as_f64(y))?;
    Ok(Some((Value::Float(quot), Value::Float(rem))))
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Float(v) => *v,
        _ => value.as_word().map_or(f64::NAN, |w| w as f64),
    }
}

/// CPython's `float.__divmod__`.
///
/// The quotient is `(x - x % y) / y` nudged to the nearest integer, so it
/// stays consistent with the remainder even when `x / y` rounds.
fn float_divmod(vx: f64, wx: f64) -> RunResult<(f64, f64)> {
    if wx == 0.0 {
        return Err(ExcType::float_divmod_by_zero());
    }
    let mut rem = vx % wx;
    let mut div = (vx - rem) / wx;
    if rem == 0.0 {
        rem = 0.0_f64.copysign(wx);
    } else if (wx < 0.0) != (rem < 0.0) {
        rem += wx;
        div -= 1.0;
    }
    let floordiv = if div == 0.0 {
        0.0_f64.copysign(vx / wx)
    } else {
        let mut floordiv = div.floor();
        if div - floordiv > 0.5 {
            floordiv += 1.0;
        }
        floordiv
    };
    Ok((floordiv, rem))
}
