//! Argument extraction helpers shared by the capability modules.
//!
//! The gateway validates arguments against the declared schema before
//! dispatch, so lookups here only fail on layer defects or undeclared use.

use serde_json::Value;

use secmesh_core::ToolError;

pub(crate) fn str_arg<'a>(args: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArgument(format!("missing string argument '{name}'")))
}

pub(crate) fn opt_str_arg<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

pub(crate) fn int_arg_or(args: &Value, name: &str, default: i64) -> i64 {
    args.get(name).and_then(Value::as_i64).unwrap_or(default)
}
