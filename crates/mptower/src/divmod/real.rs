use std::cmp::Ordering;

use rug::{
    float::{Round, Special},
    ops::NegAssign,
    Float,
};

use super::reserve_pair;
use crate::{
    context::{Context, Flags, RoundingMode},
    convert::to_real,
    exception::{ExcType, RunError, RunResult},
    resource::ResourceTracker,
    value::Value,
};

const DIVZERO_MSG: &str = "'mpfr' division by zero in divmod";
const INVALID_MSG: &str = "'mpfr' invalid operation in divmod";
const UNDERFLOW_MSG: &str = "'mpfr' underflow in divmod";
const OVERFLOW_MSG: &str = "'mpfr' overflow in divmod";
const INEXACT_MSG: &str = "'mpfr' inexact result in divmod";

/// Floor `divmod` of two Reals under `ctx`, returning `(mpfr, mpfr)`.
///
/// Both results have the context precision. Conditions are recorded in the
/// context flags, and the call fails if a newly raised condition is trapped.
pub(super) fn divmod(
    x: &Value,
    y: &Value,
    ctx: &mut Context,
    tracker: &mut impl ResourceTracker,
) -> RunResult<(Value, Value)> {
    let size = std::mem::size_of::<Value>() + ctx.precision().div_ceil(8) as usize;
    reserve_pair(tracker, size)?;

    let x = to_real(x, ctx).ok_or_else(|| RunError::internal("could not convert Real to mpfr"))?;
    let y = to_real(y, ctx).ok_or_else(|| RunError::internal("could not convert Real to mpfr"))?;
    let prec = ctx.precision();

    if y.is_zero() {
        ctx.raise(Flags::DIVZERO);
        ctx.check_trap(Flags::DIVZERO, ExcType::DivisionByZeroError, DIVZERO_MSG)?;
    }

    let mut raised = Flags::empty();
    let (quo, rem) = if x.is_nan() || y.is_nan() || x.is_infinite() {
        ctx.raise(Flags::INVALID);
        ctx.check_trap(Flags::INVALID, ExcType::InvalidOperationError, INVALID_MSG)?;
        let nan = Float::with_val(prec, Special::Nan);
        (Rounded::exact(nan.clone()), Rounded::exact(nan))
    } else if y.is_infinite() {
        ctx.raise(Flags::INVALID);
        ctx.check_trap(Flags::INVALID, ExcType::InvalidOperationError, INVALID_MSG)?;
        infinite_divisor(&x, &y, ctx, &mut raised)
    } else {
        finite_divmod(&x, &y, ctx, &mut raised)
    };

    let rem = rem.subnormalize(ctx, &mut raised);
    let quo = quo.subnormalize(ctx, &mut raised);
    if quo.value.is_nan() || rem.value.is_nan() {
        raised |= Flags::INVALID;
    }

    ctx.raise(raised);
    ctx.check_trap(raised & Flags::UNDERFLOW, ExcType::UnderflowResultError, UNDERFLOW_MSG)?;
    ctx.check_trap(raised & Flags::OVERFLOW, ExcType::OverflowResultError, OVERFLOW_MSG)?;
    ctx.check_trap(raised & Flags::INEXACT, ExcType::InexactResultError, INEXACT_MSG)?;
    Ok((Value::Mpfr(quo.value), Value::Mpfr(rem.value)))
}

/// `q = floor(x / y)` with the division rounded down, then `r = -(q*y - x)`
/// as one fused operation rounded in the context mode.
fn finite_divmod(x: &Float, y: &Float, ctx: &Context, raised: &mut Flags) -> (Rounded, Rounded) {
    let prec = ctx.precision();
    let round = ctx.round();

    let (quo, dir) = Float::with_val_round(prec, x / y, Round::Down);
    let mut quo = Rounded::new(quo, dir, raised).check_range(ctx, RoundingMode::RoundDown, raised);
    quo.value.floor_mut();
    quo.dir = Ordering::Equal;

    let mut rem = quo.value.clone();
    let dir = rem.mul_sub_round(y, x, round.to_rug());
    let mut rem = Rounded::new(rem, dir, raised).check_range(ctx, round, raised);
    rem.value.neg_assign();
    rem.dir = rem.dir.reverse();
    (quo, rem)
}

/// Results for a finite `x` and an infinite `y`.
fn infinite_divisor(x: &Float, y: &Float, ctx: &Context, raised: &mut Flags) -> (Rounded, Rounded) {
    let prec = ctx.precision();
    let y_negative = y.is_sign_negative();
    if x.is_zero() {
        let zero = Float::with_val(prec, if y_negative { Special::NegZero } else { Special::Zero });
        (Rounded::exact(zero.clone()), Rounded::exact(zero))
    } else if x.is_sign_negative() != y_negative {
        let inf = Float::with_val(prec, if y_negative { Special::NegInfinity } else { Special::Infinity });
        (Rounded::exact(Float::with_val(prec, -1)), Rounded::exact(inf))
    } else {
        let round = ctx.round();
        let (rem, dir) = Float::with_val_round(prec, x, round.to_rug());
        let rem = Rounded::new(rem, dir, raised).check_range(ctx, round, raised);
        (Rounded::exact(Float::with_val(prec, 0)), rem)
    }
}

/// A result together with the direction it was rounded in relative to the exact value.
#[derive(Debug)]
struct Rounded {
    value: Float,
    dir: Ordering,
}

impl Rounded {
    fn exact(value: Float) -> Self {
        Self {
            value,
            dir: Ordering::Equal,
        }
    }

    fn new(value: Float, dir: Ordering, raised: &mut Flags) -> Self {
        if dir != Ordering::Equal {
            *raised |= Flags::INEXACT;
        }
        Self { value, dir }
    }

    /// Forces the value into the context exponent range, as MPFR does on
    /// overflow and underflow.
    ///
    /// A zero or infinity that was rounded already overflowed or underflowed
    /// MPFR's own range, which is never narrower than a context's.
    fn check_range(self, ctx: &Context, round: RoundingMode, raised: &mut Flags) -> Self {
        let rounded = self.dir != Ordering::Equal;
        match self.value.get_exp() {
            Some(exp) if exp > ctx.emax() => self.overflow(ctx, round, raised),
            Some(exp) if exp < ctx.emin() => {
                // exactly half the smallest magnitude ties to zero
                let above_half = exp == ctx.emin() - 1
                    && (!is_power_of_two(&self.value, exp) || self.rounded_toward_zero());
                self.underflow(ctx, round, above_half, raised)
            }
            None if rounded && self.value.is_infinite() => self.overflow(ctx, round, raised),
            None if rounded && self.value.is_zero() => self.underflow(ctx, round, false, raised),
            _ => self,
        }
    }

    /// True if the exact value had a larger magnitude than the rounded one.
    fn rounded_toward_zero(&self) -> bool {
        if self.value.is_sign_negative() {
            self.dir == Ordering::Greater
        } else {
            self.dir == Ordering::Less
        }
    }

    fn overflow(mut self, ctx: &Context, round: RoundingMode, raised: &mut Flags) -> Self {
        *raised |= Flags::OVERFLOW | Flags::INEXACT;
        let negative = self.value.is_sign_negative();
        let prec = self.value.prec();
        let to_inf = match round {
            RoundingMode::RoundToNearest | RoundingMode::RoundAwayZero => true,
            RoundingMode::RoundUp => !negative,
            RoundingMode::RoundDown => negative,
            RoundingMode::RoundToZero => false,
        };
        self.value = if to_inf {
            Float::with_val(prec, if negative { Special::NegInfinity } else { Special::Infinity })
        } else {
            let mut max = Float::with_val(prec, 1);
            max.next_down();
            max <<= ctx.emax();
            if negative {
                -max
            } else {
                max
            }
        };
        self.dir = if to_inf == negative { Ordering::Less } else { Ordering::Greater };
        self
    }

    /// `above_half` tells round-to-nearest whether the exact magnitude lies
    /// above half the smallest one.
    fn underflow(mut self, ctx: &Context, round: RoundingMode, above_half: bool, raised: &mut Flags) -> Self {
        *raised |= Flags::UNDERFLOW | Flags::INEXACT;
        let negative = self.value.is_sign_negative();
        let prec = self.value.prec();
        let away = match round {
            RoundingMode::RoundToNearest => above_half,
            RoundingMode::RoundAwayZero => true,
            RoundingMode::RoundUp => !negative,
            RoundingMode::RoundDown => negative,
            RoundingMode::RoundToZero => false,
        };
        self.value = if away {
            let min = Float::with_val(prec, 1) << (ctx.emin() - 1);
            if negative {
                -min
            } else {
                min
            }
        } else {
            Float::with_val(prec, if negative { Special::NegZero } else { Special::Zero })
        };
        self.dir = if away == negative { Ordering::Less } else { Ordering::Greater };
        self
    }

    /// Rounds a tiny value to the precision a subnormal of the context
    /// exponent range would have.
    fn subnormalize(mut self, ctx: &Context, raised: &mut Flags) -> Self {
        if !ctx.subnormalize() {
            return self;
        }
        let Some(exp) = self.value.get_exp() else {
            return self;
        };
        let prec = i32::try_from(self.value.prec()).unwrap_or(i32::MAX);
        let normal_exp_min = ctx.emin().saturating_add(prec - 1);
        if exp < ctx.emin() || exp >= normal_exp_min {
            return self;
        }
        self.dir = self
            .value
            .subnormalize_round(normal_exp_min, self.dir, ctx.round().to_rug());
        if self.dir != Ordering::Equal {
            *raised |= Flags::UNDERFLOW | Flags::INEXACT;
        }
        self
    }
}

/// True if `|value|` is `2^(exp - 1)`, the only magnitude with exponent `exp` and a one-bit mantissa.
fn is_power_of_two(value: &Float, exp: i32) -> bool {
    *value.as_abs() == Float::with_val(1, 1) << (exp - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_to_max_finite_when_rounding_toward_zero() {
        let ctx = Context::new().with_exponent_range(-100, 4).unwrap();
        let mut raised = Flags::empty();
        let big = Rounded::exact(Float::with_val(8, 100)).check_range(&ctx, RoundingMode::RoundToZero, &mut raised);
        assert_eq!(big.value, 15.9375);
        assert_eq!(big.dir, Ordering::Less);
        assert_eq!(raised, Flags::OVERFLOW | Flags::INEXACT);
    }

    #[test]
    fn underflow_at_half_the_minimum_ties_to_zero() {
        let ctx = Context::new().with_exponent_range(-4, 100).unwrap();
        let mut raised = Flags::empty();
        // 2^-6 is half of the smallest magnitude 2^-5
        let tie = Float::with_val(53, 1) >> 6_u32;
        let tie = Rounded::exact(tie).check_range(&ctx, RoundingMode::RoundToNearest, &mut raised);
        assert!(tie.value.is_zero());

        let above = Float::with_val(53, 3) >> 7_u32;
        let above = Rounded::exact(above).check_range(&ctx, RoundingMode::RoundToNearest, &mut raised);
        assert_eq!(above.value, Float::with_val(53, 1) >> 5_u32);
        assert_eq!(raised, Flags::UNDERFLOW | Flags::INEXACT);
    }

    #[test]
    fn underflow_at_half_the_minimum_uses_rounding_direction() {
        let ctx = Context::new().with_exponent_range(-4, 100).unwrap();
        let mut raised = Flags::empty();
        let half = || Float::with_val(53, 1) >> 6_u32;

        // rounded down onto the tie, so the exact value was above it
        let below = Rounded { value: half(), dir: Ordering::Less };
        let below = below.check_range(&ctx, RoundingMode::RoundToNearest, &mut raised);
        assert_eq!(below.value, Float::with_val(53, 1) >> 5_u32);

        let above = Rounded { value: half(), dir: Ordering::Greater };
        let above = above.check_range(&ctx, RoundingMode::RoundToNearest, &mut raised);
        assert!(above.value.is_zero());

        let negative = Rounded { value: -half(), dir: Ordering::Greater };
        let negative = negative.check_range(&ctx, RoundingMode::RoundToNearest, &mut raised);
        assert_eq!(negative.value, -(Float::with_val(53, 1) >> 5_u32));
    }

    #[test]
    fn rounded_infinity_and_zero_count_as_out_of_range() {
        let ctx = Context::new();
        let mut raised = Flags::empty();
        let inf = Rounded { value: Float::with_val(53, Special::Infinity), dir: Ordering::Greater };
        let inf = inf.check_range(&ctx, RoundingMode::RoundToZero, &mut raised);
        assert!(inf.value.is_finite());
        assert_eq!(raised, Flags::OVERFLOW | Flags::INEXACT);

        let mut raised = Flags::empty();
        let zero = Rounded { value: Float::with_val(53, Special::Zero), dir: Ordering::Less };
        let zero = zero.check_range(&ctx, RoundingMode::RoundUp, &mut raised);
        assert_eq!(zero.value, Float::with_val(53, 1) << (ctx.emin() - 1));
        assert_eq!(raised, Flags::UNDERFLOW | Flags::INEXACT);

        let mut raised = Flags::empty();
        let exact = Rounded::exact(Float::with_val(53, Special::Infinity));
        assert!(exact.check_range(&ctx, RoundingMode::RoundToZero, &mut raised).value.is_infinite());
        assert_eq!(raised, Flags::empty());
    }
}
