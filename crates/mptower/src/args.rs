use crate::{
    exception::{ExcType, RunResult},
    value::Value,
};

/// Positional arguments for a context-bound call.
///
/// Uses specific variants for the common cases (0-2 arguments) so the
/// two-operand call never needs a `Vec`.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValues {
    Zero,
    One(Value),
    Two(Value, Value),
    Many(Vec<Value>),
}

impl ArgValues {
    /// Checks that exactly two arguments were passed, returning them as a tuple.
    pub fn get_two_args(self, name: &str) -> RunResult<(Value, Value)> {
        match self {
            Self::Two(a1, a2) => Ok((a1, a2)),
            _ => Err(ExcType::type_error_arg_count(name, 2)),
        }
    }
}

impl From<Vec<Value>> for ArgValues {
    fn from(mut values: Vec<Value>) -> Self {
        match values.len() {
            0 => Self::Zero,
            1 => Self::One(values.remove(0)),
            2 => {
                let b = values.remove(1);
                let a = values.remove(0);
                Self::Two(a, b)
            }
            _ => Self::Many(values),
        }
    }
}

impl From<(Value, Value)> for ArgValues {
    fn from((a, b): (Value, Value)) -> Self {
        Self::Two(a, b)
    }
}
