#![doc = include_str!("../../../README.md")]
mod args;
mod context;
mod convert;
mod divmod;
mod exception;
mod resource;
mod types;
mod value;

pub use crate::{
    args::ArgValues,
    context::{
        get_context, local_context, reset_context, set_context, with_current_context, Context, Flags, LocalContext,
        RoundingMode, DEFAULT_PRECISION, EXP_MAX, EXP_MIN,
    },
    divmod::{divmod, divmod_slot, divmod_tracked, py_divmod},
    exception::{ExcType, RunError, RunResult, SimpleException},
    resource::{LimitedTracker, NoLimitTracker, ResourceError, ResourceLimits, ResourceTracker},
    types::{Layer, Type},
    value::Value,
};
