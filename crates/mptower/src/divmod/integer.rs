use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};

use super::reserve_pair;
use crate::{
    convert::to_bigint,
    exception::{ExcType, RunError, RunResult},
    resource::ResourceTracker,
    value::Value,
};

/// Floor `divmod` of two Integers, returning `(mpz, mpz)`.
pub(super) fn divmod(x: &Value, y: &Value, tracker: &mut impl ResourceTracker) -> RunResult<(Value, Value)> {
    reserve_pair(tracker, x.py_estimate_size().max(y.py_estimate_size()))?;

    if let (Some(a), Some(b)) = (x.as_word(), y.as_word()) {
        if b == 0 {
            return Err(ExcType::divmod_by_zero());
        }
        if let Some((q, r)) = floor_divmod(a, b) {
            return Ok((Value::mpz(q), Value::mpz(r)));
        }
    }

    let a = to_bigint(x).ok_or_else(|| RunError::internal("could not convert Integer to mpz"))?;
    let (q, r) = if let Some(b) = y.as_word() {
        word_divmod(&a, b)?
    } else {
        let b = to_bigint(y).ok_or_else(|| RunError::internal("could not convert Integer to mpz"))?;
        if b.is_zero() {
            return Err(ExcType::divmod_by_zero());
        }
        a.div_mod_floor(&b)
    };
    Ok((Value::Mpz(q), Value::Mpz(r)))
}

/// Computes Python-style floor division and modulo of two machine words.
///
/// Returns `None` when the quotient overflows (`i64::MIN / -1`) or `b` is zero.
pub(super) fn floor_divmod(a: i64, b: i64) -> Option<(i64, i64)> {
    let quot = a.checked_div(b)?;
    let rem = a.checked_rem(b)?;

    // Adjust for floor division: if signs differ and remainder != 0, adjust
    if rem != 0 && (rem < 0) != (b < 0) {
        Some((quot - 1, rem + b))
    } else {
        Some((quot, rem))
    }
}

/// Floor `divmod` of a bignum by a machine-word divisor.
///
/// A negative divisor is handled as ceiling division by its magnitude with
/// the quotient negated, so the remainder keeps the divisor's sign.
fn word_divmod(a: &BigInt, b: i64) -> RunResult<(BigInt, BigInt)> {
    let magnitude = b.unsigned_abs();
    match b.signum() {
        0 => Err(ExcType::divmod_by_zero()),
        1 => {
            let mut quot = a / magnitude;
            let mut rem = a % magnitude;
            if rem.is_negative() {
                quot -= 1u32;
                rem += magnitude;
            }
            Ok((quot, rem))
        }
        _ => {
            let mut quot = a / magnitude;
            let mut rem = a % magnitude;
            if rem.is_positive() {
                quot += 1u32;
                rem -= magnitude;
            }
            Ok((-quot, rem))
        }
    }
}
