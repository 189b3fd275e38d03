//! Promotion of operands into a tower layer.
//!
//! Each function returns `None` when the value does not embed into the
//! requested layer. Values already of the layer's own type are borrowed.

use std::borrow::Cow;

use num_bigint::{BigInt, Sign};
use num_rational::BigRational;
use rug::{integer::Order, Float};

use crate::{context::Context, value::Value};

pub(crate) fn to_bigint(value: &Value) -> Option<Cow<'_, BigInt>> {
    match value {
        Value::Mpz(v) => Some(Cow::Borrowed(v)),
        _ => value.as_word().map(|w| Cow::Owned(BigInt::from(w))),
    }
}

pub(crate) fn to_rational(value: &Value) -> Option<Cow<'_, BigRational>> {
    match value {
        Value::Mpq(v) => Some(Cow::Borrowed(v)),
        _ => to_bigint(value).map(|v| Cow::Owned(BigRational::from_integer(v.into_owned()))),
    }
}

/// Converts a Real operand to an `mpfr`.
///
/// Integers and rationals are rounded to the context precision in the context
/// rounding mode. Native floats are exact at 53 bits and `mpfr` values keep
/// their own precision.
pub(crate) fn to_real<'a>(value: &'a Value, ctx: &Context) -> Option<Cow<'a, Float>> {
    let prec = ctx.precision();
    let round = ctx.round().to_rug();
    let real = match value {
        Value::Mpfr(v) => return Some(Cow::Borrowed(v)),
        Value::Float(v) => Float::with_val(53, *v),
        Value::Mpq(v) => {
            let rational = rug::Rational::from((bigint_to_rug(v.numer()), bigint_to_rug(v.denom())));
            Float::with_val_round(prec, &rational, round).0
        }
        _ => {
            let int = bigint_to_rug(&*to_bigint(value)?);
            Float::with_val_round(prec, &int, round).0
        }
    };
    Some(Cow::Owned(real))
}

fn bigint_to_rug(v: &BigInt) -> rug::Integer {
    let (sign, digits) = v.to_u64_digits();
    let magnitude = rug::Integer::from_digits(&digits, Order::Lsf);
    if sign == Sign::Minus {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bigint_to_rug_keeps_sign_and_magnitude() {
        let v: BigInt = "-123456789012345678901234567890".parse().unwrap();
        assert_eq!(bigint_to_rug(&v).to_string(), "-123456789012345678901234567890");
    }

    #[test]
    fn integers_round_at_context_precision() {
        let ctx = Context::new().with_precision(4).unwrap();
        let real = to_real(&Value::Int(17), &ctx).unwrap();
        assert_eq!(real.prec(), 4);
        assert_eq!(*real, 16);
    }
}
