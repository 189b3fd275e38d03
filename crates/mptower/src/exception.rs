use std::{
    borrow::Cow,
    fmt::{self, Write},
};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{resource::ResourceError, types::Type};

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// Exception types raised by `divmod` and the context layer.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>` implementations.
/// The string representation matches the variant name exactly (e.g., `TypeError` -> "TypeError").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
pub enum ExcType {
    /// primary exception class - matches any exception in `is_subclass_of` checks.
    Exception,

    // --- ArithmeticError hierarchy ---
    /// Intermediate class for arithmetic errors.
    ArithmeticError,
    /// Subclass of ArithmeticError.
    OverflowError,
    /// Subclass of ArithmeticError.
    ZeroDivisionError,

    // --- context conditions, raised only when the matching trap is enabled ---
    /// Subclass of ZeroDivisionError.
    DivisionByZeroError,
    /// Subclass of ArithmeticError and ValueError.
    InvalidOperationError,
    /// Subclass of ArithmeticError.
    InexactResultError,
    /// Subclass of InexactResultError.
    UnderflowResultError,
    /// Subclass of InexactResultError and OverflowError.
    OverflowResultError,

    // --- Standalone exception types ---
    MemoryError,
    TypeError,
    ValueError,
}

impl ExcType {
    /// Checks if this exception type is a subclass of another exception type.
    ///
    /// - `Exception` is the base class for all exceptions here
    /// - `ArithmeticError` is the base for every numeric condition
    /// - `InexactResultError` is the base for `UnderflowResultError` and `OverflowResultError`
    ///
    /// Returns true if `self` would be caught by `except handler_type:`.
    #[must_use]
    pub fn is_subclass_of(self, handler_type: Self) -> bool {
        if self == handler_type {
            return true;
        }
        match handler_type {
            Self::Exception => true,
            Self::ArithmeticError => matches!(
                self,
                Self::OverflowError
                    | Self::ZeroDivisionError
                    | Self::DivisionByZeroError
                    | Self::InvalidOperationError
                    | Self::InexactResultError
                    | Self::UnderflowResultError
                    | Self::OverflowResultError
            ),
            Self::ZeroDivisionError => matches!(self, Self::DivisionByZeroError),
            Self::OverflowError => matches!(self, Self::OverflowResultError),
            Self::ValueError => matches!(self, Self::InvalidOperationError),
            Self::InexactResultError => matches!(self, Self::UnderflowResultError | Self::OverflowResultError),
            _ => false,
        }
    }

    /// Creates a TypeError for when a function receives the wrong number of arguments.
    ///
    /// Format: `{name}() requires {expected} arguments.`
    #[must_use]
    pub(crate) fn type_error_arg_count(name: &str, expected: usize) -> RunError {
        SimpleException::new_msg(Self::TypeError, format!("{name}() requires {expected} arguments.")).into()
    }

    /// Creates a ZeroDivisionError for `mpz`/`mpq` divmod by zero.
    #[must_use]
    pub(crate) fn divmod_by_zero() -> RunError {
        SimpleException::new_msg(Self::ZeroDivisionError, "division or modulo by zero").into()
    }

    /// Creates a ZeroDivisionError for native `int` divmod by zero.
    ///
    /// Matches CPython's format: `ZeroDivisionError: integer division or modulo by zero`
    #[must_use]
    pub(crate) fn int_divmod_by_zero() -> RunError {
        SimpleException::new_msg(Self::ZeroDivisionError, "integer division or modulo by zero").into()
    }

    /// Creates a ZeroDivisionError for native `float` divmod by zero.
    ///
    /// Matches CPython's format: `ZeroDivisionError: float divmod()`
    #[must_use]
    pub(crate) fn float_divmod_by_zero() -> RunError {
        SimpleException::new_msg(Self::ZeroDivisionError, "float divmod()").into()
    }

    #[must_use]
    pub(crate) fn type_error_complex_floor() -> RunError {
        SimpleException::new_msg(Self::TypeError, "can't take floor or mod of complex number.").into()
    }

    /// Creates the TypeError raised when no layer of the tower accepts both operands.
    #[must_use]
    pub(crate) fn type_error_divmod_argument() -> RunError {
        SimpleException::new_msg(Self::TypeError, "divmod() argument type not supported").into()
    }

    /// Creates a TypeError for operand types that no divmod slot accepts.
    ///
    /// Uses CPython's format: `unsupported operand type(s) for divmod(): '{left}' and '{right}'`
    #[must_use]
    pub(crate) fn type_error_unsupported_divmod(lhs_type: Type, rhs_type: Type) -> RunError {
        SimpleException::new_msg(
            Self::TypeError,
            format!("unsupported operand type(s) for divmod(): '{lhs_type}' and '{rhs_type}'"),
        )
        .into()
    }
}

macro_rules! exc_fmt {
    ($error_type:expr; $($fmt_args:tt)*) => {
        crate::exception::SimpleException::new_msg($error_type, format!($($fmt_args)*))
    };
}
pub(crate) use exc_fmt;

macro_rules! exc_err_fmt {
    ($error_type:expr; $($fmt_args:tt)*) => {
        Err(crate::exception::exc_fmt!($error_type; $($fmt_args)*).into())
    };
}
pub(crate) use exc_err_fmt;

/// Simple lightweight representation of an exception.
///
/// Exception messages use `String` for owned storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimpleException {
    exc_type: ExcType,
    arg: Option<String>,
}

impl fmt::Display for SimpleException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.py_repr_fmt(f)
    }
}

impl SimpleException {
    /// Creates a new exception with the given type and argument message.
    #[must_use]
    pub fn new_msg(exc_type: ExcType, arg: impl Into<String>) -> Self {
        Self {
            exc_type,
            arg: Some(arg.into()),
        }
    }

    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        self.exc_type
    }

    #[must_use]
    pub fn arg(&self) -> Option<&String> {
        self.arg.as_ref()
    }

    /// Returns the exception formatted as Python would display it to the user.
    ///
    /// Format: `ExceptionType: message`, or just the type name when there is no message.
    #[must_use]
    pub fn py_str(&self) -> String {
        let type_str: &'static str = self.exc_type.into();
        match &self.arg {
            Some(arg) => format!("{type_str}: {arg}"),
            None => type_str.to_owned(),
        }
    }

    /// Returns the exception formatted as Python would repr it.
    pub fn py_repr_fmt(&self, f: &mut impl Write) -> fmt::Result {
        let type_str: &'static str = self.exc_type.into();
        write!(f, "{type_str}(")?;

        if let Some(arg) = &self.arg {
            crate::value::string_repr_fmt(arg, f)?;
        }

        f.write_char(')')
    }
}

/// Runtime error types that can occur while computing a divmod.
///
/// Three variants:
/// - `Exc`: a Python-style exception (TypeError, ZeroDivisionError, trapped conditions, ...)
/// - `Resource`: the active `ResourceTracker` refused the result allocation
/// - `Internal`: an operand passed the layer check but could not be converted, a bug in this crate
#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
    Exc(SimpleException),
    Resource(ResourceError),
    Internal(Cow<'static, str>),
}

impl From<SimpleException> for RunError {
    fn from(exc: SimpleException) -> Self {
        Self::Exc(exc)
    }
}

impl From<ResourceError> for RunError {
    fn from(err: ResourceError) -> Self {
        Self::Resource(err)
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exc(exc) => f.write_str(&exc.py_str()),
            Self::Resource(err) => write!(f, "MemoryError: {err}"),
            Self::Internal(msg) => write!(f, "Internal error in mptower: {msg}"),
        }
    }
}

impl std::error::Error for RunError {}

impl RunError {
    pub fn internal(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Internal(msg.into())
    }

    /// The Python exception type this error surfaces as.
    ///
    /// Resource errors surface as `MemoryError`, internal errors as `None`.
    #[must_use]
    pub fn exc_type(&self) -> Option<ExcType> {
        match self {
            Self::Exc(exc) => Some(exc.exc_type()),
            Self::Resource(_) => Some(ExcType::MemoryError),
            Self::Internal(_) => None,
        }
    }

    /// Returns the exception message, if any.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Exc(exc) => exc.arg().cloned(),
            Self::Resource(err) => Some(err.to_string()),
            Self::Internal(msg) => Some(msg.to_string()),
        }
    }
}
