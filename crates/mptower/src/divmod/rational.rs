use num_rational::BigRational;
use num_traits::Zero;

use super::reserve_pair;
use crate::{
    convert::to_rational,
    exception::{ExcType, RunError, RunResult},
    resource::ResourceTracker,
    value::Value,
};

/// Floor `divmod` of two Rationals, returning `(mpz, mpq)`.
///
/// Both results are exact.
pub(super) fn divmod(x: &Value, y: &Value, tracker: &mut impl ResourceTracker) -> RunResult<(Value, Value)> {
    reserve_pair(tracker, x.py_estimate_size() + y.py_estimate_size())?;

    let a = to_rational(x).ok_or_else(|| RunError::internal("could not convert Rational to mpq"))?;
    let b = to_rational(y).ok_or_else(|| RunError::internal("could not convert Rational to mpq"))?;
    if b.is_zero() {
        return Err(ExcType::divmod_by_zero());
    }

    let quot = (&*a / &*b).floor().to_integer();
    let rem = &*a - &*b * BigRational::from_integer(quot.clone());
    Ok((Value::Mpz(quot), Value::Mpq(rem)))
}
