use std::fmt::{self, Write};

use num_bigint::BigInt;
use num_rational::BigRational;
use rug::{Complex, Float};

use crate::types::{Layer, Type};

/// Precision, in bits, that `mpfr` and `mpc` reprs omit.
const DOUBLE_PRECISION: u32 = 53;

/// An operand or result of `divmod`.
///
/// The native variants mirror Python's builtin numbers. The `Mp*` variants are
/// the multiple-precision types: integers and rationals are exact, reals and
/// complexes carry their own precision.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Mpz(BigInt),
    Mpq(BigRational),
    Mpfr(Float),
    Mpc(Complex),
}

impl Value {
    /// Creates an `mpz` from a machine integer.
    #[must_use]
    pub fn mpz(v: i64) -> Self {
        Self::Mpz(BigInt::from(v))
    }

    /// Creates a normalized `mpq` from a numerator and denominator.
    ///
    /// # Panics
    /// Panics if `denom` is zero.
    #[must_use]
    pub fn mpq(numer: i64, denom: i64) -> Self {
        Self::Mpq(BigRational::new(numer.into(), denom.into()))
    }

    /// Creates an `mpfr` holding `v` exactly at double precision.
    #[must_use]
    pub fn mpfr(v: f64) -> Self {
        Self::Mpfr(Float::with_val(DOUBLE_PRECISION, v))
    }

    /// Creates an `mpfr` with `prec` bits, rounding `v` to nearest.
    #[must_use]
    pub fn mpfr_with_prec(prec: u32, v: f64) -> Self {
        Self::Mpfr(Float::with_val(prec, v))
    }

    /// Creates an `mpc` at double precision for both parts.
    #[must_use]
    pub fn mpc(re: f64, im: f64) -> Self {
        Self::Mpc(Complex::with_val(DOUBLE_PRECISION, (re, im)))
    }

    #[must_use]
    pub fn py_type(&self) -> Type {
        match self {
            Self::None => Type::NoneType,
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::Str(_) => Type::Str,
            Self::Mpz(_) => Type::Mpz,
            Self::Mpq(_) => Type::Mpq,
            Self::Mpfr(_) => Type::Mpfr,
            Self::Mpc(_) => Type::Mpc,
        }
    }

    /// The lowest tower layer this value embeds into, `None` for non-numbers.
    #[must_use]
    pub fn layer(&self) -> Option<Layer> {
        self.py_type().layer()
    }

    /// Returns the value as a machine word if it is a native `int` or `bool`.
    ///
    /// Bools are normalized to `0`/`1`, as Python treats `bool` as an `int` subtype.
    #[must_use]
    pub fn as_word(&self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Rough number of bytes needed to hold this value.
    #[must_use]
    pub fn py_estimate_size(&self) -> usize {
        let payload = match self {
            Self::Str(s) => s.len(),
            Self::Mpz(v) => bits_to_bytes(v.bits()),
            Self::Mpq(v) => bits_to_bytes(v.numer().bits()) + bits_to_bytes(v.denom().bits()),
            Self::Mpfr(v) => bits_to_bytes(u64::from(v.prec())),
            Self::Mpc(v) => {
                let (re, im) = v.prec();
                bits_to_bytes(u64::from(re)) + bits_to_bytes(u64::from(im))
            }
            _ => 0,
        };
        std::mem::size_of::<Self>() + payload
    }

    /// Returns the Python `repr` of this value.
    #[must_use]
    pub fn py_repr(&self) -> String {
        let mut s = String::new();
        // writing to a String never fails
        let _ = self.py_repr_fmt(&mut s);
        s
    }

    pub fn py_repr_fmt(&self, f: &mut impl Write) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => f.write_str(&float_repr(*v)),
            Self::Str(s) => string_repr_fmt(s, f),
            Self::Mpz(v) => write!(f, "mpz({v})"),
            Self::Mpq(v) => write!(f, "mpq({},{})", v.numer(), v.denom()),
            Self::Mpfr(v) => {
                write!(f, "mpfr('{}'", mpfr_digits(v))?;
                if v.prec() != DOUBLE_PRECISION {
                    write!(f, ",{}", v.prec())?;
                }
                f.write_char(')')
            }
            Self::Mpc(v) => {
                let re = mpfr_digits(v.real());
                let im = mpfr_digits(v.imag());
                let sign = if im.starts_with('-') { "" } else { "+" };
                write!(f, "mpc('{re}{sign}{im}j'")?;
                let (re_prec, im_prec) = v.prec();
                if re_prec != DOUBLE_PRECISION || im_prec != DOUBLE_PRECISION {
                    write!(f, ",({re_prec},{im_prec})")?;
                }
                f.write_char(')')
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.py_repr_fmt(f)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<BigInt> for Value {
    fn from(v: BigInt) -> Self {
        Self::Mpz(v)
    }
}

impl From<BigRational> for Value {
    fn from(v: BigRational) -> Self {
        Self::Mpq(v)
    }
}

impl From<Float> for Value {
    fn from(v: Float) -> Self {
        Self::Mpfr(v)
    }
}

impl From<Complex> for Value {
    fn from(v: Complex) -> Self {
        Self::Mpc(v)
    }
}

fn bits_to_bytes(bits: u64) -> usize {
    usize::try_from(bits.div_ceil(8)).unwrap_or(usize::MAX)
}

/// Formats a float the way Python's `repr` does for the common cases.
fn float_repr(v: f64) -> String {
    if v.is_nan() {
        "nan".to_owned()
    } else if v.is_infinite() {
        if v > 0.0 { "inf" } else { "-inf" }.to_owned()
    } else {
        let s = v.to_string();
        if s.contains('.') {
            s
        } else {
            format!("{s}.0")
        }
    }
}

/// The digits inside an `mpfr('...')` repr.
///
/// Values that fit a double exactly use the shortest round-trip digits,
/// anything wider falls back to MPFR's decimal output with trailing zeros removed.
fn mpfr_digits(v: &Float) -> String {
    if v.is_nan() {
        return "nan".to_owned();
    }
    if v.is_infinite() {
        return if v.is_sign_negative() { "-inf" } else { "inf" }.to_owned();
    }
    if v.is_zero() {
        return if v.is_sign_negative() { "-0.0" } else { "0.0" }.to_owned();
    }
    if v.prec() <= DOUBLE_PRECISION {
        if let Some(exp) = v.get_exp() {
            if (-1021..=1024).contains(&exp) {
                return float_repr(v.to_f64());
            }
        }
    }
    let s = v.to_string_radix(10, None);
    let (mantissa, exponent) = match s.split_once('e') {
        Some((m, e)) => (m, Some(e)),
        None => (s.as_str(), None),
    };
    let mut out = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').to_owned()
    } else {
        format!("{mantissa}.")
    };
    if out.ends_with('.') {
        out.push('0');
    }
    if let Some(e) = exponent {
        out.push('e');
        out.push_str(e);
    }
    out
}

/// Writes a Python repr() string for a given string slice to a formatter.
///
/// Chooses between single and double quotes based on the string content:
/// - Uses double quotes if the string contains single quotes but not double quotes
/// - Uses single quotes by default, escaping any single quotes present
pub(crate) fn string_repr_fmt(s: &str, f: &mut impl Write) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    f.write_char(quote)?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            '\'' if quote == '\'' => f.write_str("\\'")?,
            _ => f.write_char(c)?,
        }
    }
    f.write_char(quote)
}
