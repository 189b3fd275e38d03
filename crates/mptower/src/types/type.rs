use strum::{Display, EnumString, IntoStaticStr};

use crate::types::Layer;

/// Represents the Python type of a value.
///
/// The string form is the name Python reports for the type, so it is used
/// directly in `TypeError` messages.
#[derive(Debug, Clone, Copy, Display, EnumString, IntoStaticStr, PartialEq, Eq, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum Type {
    #[strum(serialize = "NoneType")]
    NoneType,
    Bool,
    Int,
    Float,
    Str,
    Mpz,
    Mpq,
    Mpfr,
    Mpc,
}

impl Type {
    /// The lowest tower layer values of this type embed into.
    ///
    /// `None` and `str` are not numbers and belong to no layer.
    #[must_use]
    pub fn layer(self) -> Option<Layer> {
        match self {
            Self::Bool | Self::Int | Self::Mpz => Some(Layer::Integer),
            Self::Mpq => Some(Layer::Rational),
            Self::Float | Self::Mpfr => Some(Layer::Real),
            Self::Mpc => Some(Layer::Complex),
            Self::NoneType | Self::Str => None,
        }
    }

    /// The layer the `divmod` slot of this type starts dispatching from.
    ///
    /// Only the multiple-precision types own a slot; natives return `None`.
    #[must_use]
    pub fn slot_layer(self) -> Option<Layer> {
        match self {
            Self::Mpz | Self::Mpq | Self::Mpfr | Self::Mpc => self.layer(),
            _ => None,
        }
    }

    /// True for the builtin numeric types Python itself implements `divmod` for.
    #[must_use]
    pub fn is_native_number(self) -> bool {
        matches!(self, Self::Bool | Self::Int | Self::Float)
    }
}
