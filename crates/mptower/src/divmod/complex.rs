use crate::exception::{ExcType, RunError};

/// Complex numbers have no ordering, so floor division is undefined for them.
///
/// Fails before any conversion or allocation, regardless of the context traps.
pub(super) fn divmod() -> RunError {
    ExcType::type_error_complex_floor()
}
