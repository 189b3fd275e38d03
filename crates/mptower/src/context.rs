//! Precision, rounding and exception state for `mpfr` arithmetic.
//!
//! A `Context` is both configuration and a record: operations read its
//! precision, rounding mode and exponent range, and write the conditions they
//! raise into its sticky `flags`. Each thread has its own current context.

use std::{cell::RefCell, marker::PhantomData, rc::Rc};

use bitflags::bitflags;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::exception::{exc_err_fmt, ExcType, RunError, RunResult};

/// Working precision of a default context, in bits.
pub const DEFAULT_PRECISION: u32 = 53;
/// Largest exponent a context accepts, using MPFR's `0.5 <= |m| < 1` convention.
///
/// One below MPFR's default maximum, so a value MPFR clamps to its own
/// largest finite number is still out of every context range.
pub const EXP_MAX: i32 = (1 << 30) - 2;
/// Smallest exponent a context accepts.
pub const EXP_MIN: i32 = -EXP_MAX;

/// Rounding applied when a result does not fit the context precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
pub enum RoundingMode {
    /// Round to nearest, ties to even.
    #[default]
    RoundToNearest,
    RoundToZero,
    /// Round toward positive infinity.
    RoundUp,
    /// Round toward negative infinity.
    RoundDown,
    RoundAwayZero,
}

impl RoundingMode {
    pub(crate) fn to_rug(self) -> rug::float::Round {
        use rug::float::Round;
        match self {
            Self::RoundToNearest => Round::Nearest,
            Self::RoundToZero => Round::Zero,
            Self::RoundUp => Round::Up,
            Self::RoundDown => Round::Down,
            Self::RoundAwayZero => Round::AwayZero,
        }
    }
}

bitflags! {
    /// Conditions an `mpfr` operation can raise.
    ///
    /// Used both for the sticky flags a context accumulates and for the set of
    /// conditions it traps.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Flags: u8 {
        /// A nonzero result was smaller in magnitude than the exponent range allows.
        const UNDERFLOW = 0x01;
        /// A result was larger in magnitude than the exponent range allows.
        const OVERFLOW = 0x02;
        /// A result was rounded.
        const INEXACT = 0x04;
        /// An operation had no meaningful result and produced NaN.
        const INVALID = 0x08;
        /// The divisor was zero.
        const DIVZERO = 0x10;
    }
}

/// Arithmetic context for `mpfr` operations.
///
/// Deserializing validates the settings like the setters do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ContextSettings")]
pub struct Context {
    precision: u32,
    round: RoundingMode,
    emax: i32,
    emin: i32,
    subnormalize: bool,
    flags: Flags,
    traps: Flags,
    readonly: bool,
}

/// A `Context` as read from serialized data, before validation.
#[derive(Deserialize)]
struct ContextSettings {
    precision: u32,
    round: RoundingMode,
    emax: i32,
    emin: i32,
    subnormalize: bool,
    flags: Flags,
    traps: Flags,
    readonly: bool,
}

impl TryFrom<ContextSettings> for Context {
    type Error = RunError;

    fn try_from(settings: ContextSettings) -> RunResult<Self> {
        let ctx = Self::new()
            .with_precision(settings.precision)?
            .with_exponent_range(settings.emin, settings.emax)?
            .with_round(settings.round)
            .with_subnormalize(settings.subnormalize)
            .with_traps(settings.traps);
        Ok(Self {
            flags: settings.flags,
            readonly: settings.readonly,
            ..ctx
        })
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates a context with double precision, round-to-nearest, the widest
    /// exponent range, no flags and no traps.
    #[must_use]
    pub fn new() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            round: RoundingMode::RoundToNearest,
            emax: EXP_MAX,
            emin: EXP_MIN,
            subnormalize: false,
            flags: Flags::empty(),
            traps: Flags::empty(),
            readonly: false,
        }
    }

    /// Creates a context matching an IEEE 754 binary interchange format.
    ///
    /// Accepts 16, 32, 64, 128 and any multiple of 32 above 128. Subnormal
    /// emulation is turned on.
    pub fn ieee(bits: u32) -> RunResult<Self> {
        let (precision, emax, emin) = match bits {
            16 => (11, 16, -23),
            32 => (24, 128, -148),
            64 => (53, 1024, -1073),
            128 => (113, 16384, -16493),
            k if k > 128 && k % 32 == 0 => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let log_term = (4.0 * f64::from(k).log2()).round() as u32;
                let precision = k - log_term + 13;
                let width = k - precision;
                if width > 30 {
                    return exc_err_fmt!(ExcType::ValueError; "bitwidth {k} exceeds the supported exponent range");
                }
                let emax = 1_i32 << (width - 1);
                #[allow(clippy::cast_possible_wrap)]
                let emin = 4 - emax - precision as i32;
                (precision, emax, emin)
            }
            _ => {
                return exc_err_fmt!(
                    ExcType::ValueError;
                    "bitwidth must be 16, 32, 64, 128; or must be greater than 128 and divisible by 32."
                )
            }
        };
        Self::new()
            .with_precision(precision)?
            .with_exponent_range(emin, emax)
            .map(|ctx| ctx.with_subnormalize(true))
    }

    #[must_use]
    pub fn precision(&self) -> u32 {
        self.precision
    }

    #[must_use]
    pub fn round(&self) -> RoundingMode {
        self.round
    }

    #[must_use]
    pub fn emax(&self) -> i32 {
        self.emax
    }

    #[must_use]
    pub fn emin(&self) -> i32 {
        self.emin
    }

    #[must_use]
    pub fn subnormalize(&self) -> bool {
        self.subnormalize
    }

    /// Conditions raised since the flags were last cleared.
    #[must_use]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    #[must_use]
    pub fn traps(&self) -> Flags {
        self.traps
    }

    #[must_use]
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn with_precision(mut self, precision: u32) -> RunResult<Self> {
        check_precision(precision)?;
        self.precision = precision;
        Ok(self)
    }

    #[must_use]
    pub fn with_round(mut self, round: RoundingMode) -> Self {
        self.round = round;
        self
    }

    pub fn with_exponent_range(mut self, emin: i32, emax: i32) -> RunResult<Self> {
        check_emin(emin)?;
        check_emax(emax)?;
        self.emin = emin;
        self.emax = emax;
        Ok(self)
    }

    #[must_use]
    pub fn with_subnormalize(mut self, subnormalize: bool) -> Self {
        self.subnormalize = subnormalize;
        self
    }

    #[must_use]
    pub fn with_traps(mut self, traps: Flags) -> Self {
        self.traps = traps;
        self
    }

    pub fn set_precision(&mut self, precision: u32) -> RunResult<()> {
        self.check_writable()?;
        check_precision(precision)?;
        self.precision = precision;
        Ok(())
    }

    pub fn set_round(&mut self, round: RoundingMode) -> RunResult<()> {
        self.check_writable()?;
        self.round = round;
        Ok(())
    }

    pub fn set_emax(&mut self, emax: i32) -> RunResult<()> {
        self.check_writable()?;
        check_emax(emax)?;
        self.emax = emax;
        Ok(())
    }

    pub fn set_emin(&mut self, emin: i32) -> RunResult<()> {
        self.check_writable()?;
        check_emin(emin)?;
        self.emin = emin;
        Ok(())
    }

    pub fn set_subnormalize(&mut self, subnormalize: bool) -> RunResult<()> {
        self.check_writable()?;
        self.subnormalize = subnormalize;
        Ok(())
    }

    pub fn set_traps(&mut self, traps: Flags) -> RunResult<()> {
        self.check_writable()?;
        self.traps = traps;
        Ok(())
    }

    /// Resets every sticky flag.
    pub fn clear_flags(&mut self) -> RunResult<()> {
        self.check_writable()?;
        self.flags = Flags::empty();
        Ok(())
    }

    /// Disables every trap.
    pub fn clear_traps(&mut self) -> RunResult<()> {
        self.check_writable()?;
        self.traps = Flags::empty();
        Ok(())
    }

    /// Returns a copy that operations will never mutate.
    #[must_use]
    pub fn readonly_copy(&self) -> Self {
        Self {
            readonly: true,
            ..self.clone()
        }
    }

    /// Returns a mutable copy with the same settings and flags.
    #[must_use]
    pub fn writable_copy(&self) -> Self {
        Self {
            readonly: false,
            ..self.clone()
        }
    }

    /// Records conditions raised by an operation.
    pub(crate) fn raise(&mut self, flags: Flags) {
        self.flags |= flags;
    }

    /// Fails with `exc_type` if `flag` is trapped.
    pub(crate) fn check_trap(&self, flag: Flags, exc_type: ExcType, msg: &str) -> RunResult<()> {
        if self.traps.intersects(flag) {
            debug!("trapped {flag:?}: {msg}");
            exc_err_fmt!(exc_type; "{msg}")
        } else {
            Ok(())
        }
    }

    fn check_writable(&self) -> RunResult<()> {
        if self.readonly {
            exc_err_fmt!(ExcType::ValueError; "context is read-only")
        } else {
            Ok(())
        }
    }
}

fn check_precision(precision: u32) -> RunResult<()> {
    if precision < 1 {
        exc_err_fmt!(ExcType::ValueError; "invalid value for precision")
    } else {
        Ok(())
    }
}

fn check_emax(emax: i32) -> RunResult<()> {
    if emax <= 0 || emax > EXP_MAX {
        exc_err_fmt!(ExcType::ValueError; "requested maximum exponent is invalid")
    } else {
        Ok(())
    }
}

fn check_emin(emin: i32) -> RunResult<()> {
    if emin >= 0 || emin < EXP_MIN {
        exc_err_fmt!(ExcType::ValueError; "requested minimum exponent is invalid")
    } else {
        Ok(())
    }
}

/// Runs `f` on `ctx`, or on a writable clone of it when `ctx` is read-only.
///
/// Flags raised on the clone are discarded with it.
pub(crate) fn with_writable<R>(ctx: &mut Context, f: impl FnOnce(&mut Context) -> R) -> R {
    if ctx.readonly {
        debug!("context is read-only, running on a writable copy");
        let mut working = ctx.writable_copy();
        f(&mut working)
    } else {
        f(ctx)
    }
}

thread_local! {
    static CURRENT_CONTEXT: RefCell<Context> = RefCell::new(Context::new());
}

/// Returns a copy of this thread's current context.
#[must_use]
pub fn get_context() -> Context {
    CURRENT_CONTEXT.with(|current| current.borrow().clone())
}

/// Installs `ctx` as this thread's current context, returning the previous one.
pub fn set_context(ctx: Context) -> Context {
    CURRENT_CONTEXT.with(|current| current.replace(ctx))
}

/// Restores this thread's current context to `Context::new()`.
pub fn reset_context() {
    set_context(Context::new());
}

/// Runs `f` with mutable access to this thread's current context.
///
/// # Panics
/// Panics if called from inside another `with_current_context` closure.
pub fn with_current_context<R>(f: impl FnOnce(&mut Context) -> R) -> R {
    CURRENT_CONTEXT.with(|current| f(&mut current.borrow_mut()))
}

/// Installs `ctx` as the current context until the returned guard is dropped.
pub fn local_context(ctx: Context) -> LocalContext {
    let previous = set_context(ctx);
    LocalContext {
        previous: Some(previous),
        _not_send: PhantomData,
    }
}

/// Guard returned by `local_context`, restores the previous context on drop.
#[derive(Debug)]
#[must_use = "the previous context is restored as soon as the guard is dropped"]
pub struct LocalContext {
    previous: Option<Context>,
    // the guard restores a thread-local, so it must stay on its thread
    _not_send: PhantomData<Rc<()>>,
}

impl Drop for LocalContext {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            set_context(previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ieee_wide_formats_follow_the_interchange_rule() {
        let ctx = Context::ieee(256).unwrap();
        assert_eq!(ctx.precision(), 237);
        assert_eq!(ctx.emax(), 262_144);
        assert_eq!(ctx.emin(), 4 - 262_144 - 237);
        assert!(ctx.subnormalize());
    }

    #[test]
    fn trap_check_only_fails_for_trapped_flags() {
        let ctx = Context::new().with_traps(Flags::INEXACT);
        assert!(ctx.check_trap(Flags::OVERFLOW, ExcType::OverflowResultError, "x").is_ok());
        let err = ctx
            .check_trap(Flags::INEXACT, ExcType::InexactResultError, "inexact")
            .unwrap_err();
        assert_eq!(err.exc_type(), Some(ExcType::InexactResultError));
    }

    #[test]
    fn with_writable_leaves_readonly_untouched() {
        let mut ctx = Context::new().readonly_copy();
        let raised = with_writable(&mut ctx, |working| {
            working.raise(Flags::INEXACT);
            working.flags()
        });
        assert_eq!(raised, Flags::INEXACT);
        assert_eq!(ctx.flags(), Flags::empty());
    }
}
