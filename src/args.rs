//! Argument-list helpers shared by the built-in method tables.

use crate::exceptions::{raise_fmt, ErrorKind, ObjectResult};
use crate::value::Value;

/// Requires exactly `count` arguments.
pub(crate) fn exactly(method: &str, args: &[Value], count: usize) -> ObjectResult<()> {
    if args.len() != count {
        raise_fmt!(ErrorKind::TypeError;
            "{method}() takes exactly {count} argument{} ({} given)",
            if count == 1 { "" } else { "s" },
            args.len());
    }
    Ok(())
}

/// Requires between `min` and `max` arguments inclusive.
pub(crate) fn between(method: &str, args: &[Value], min: usize, max: usize) -> ObjectResult<()> {
    if args.len() < min || args.len() > max {
        raise_fmt!(ErrorKind::TypeError;
            "{method}() takes {min} to {max} arguments ({} given)", args.len());
    }
    Ok(())
}

/// The argument at `idx` as a string slice.
pub(crate) fn str_arg<'a>(method: &str, args: &'a [Value], idx: usize) -> ObjectResult<&'a str> {
    match args.get(idx) {
        Some(Value::Str(s)) => Ok(s),
        Some(other) => {
            raise_fmt!(ErrorKind::TypeError;
                "{method}() argument {idx} must be a str, got '{}'", other.type_str())
        }
        None => raise_fmt!(ErrorKind::TypeError; "{method}() is missing argument {idx}"),
    }
}

/// The argument at `idx` as an integer.
pub(crate) fn int_arg(method: &str, args: &[Value], idx: usize) -> ObjectResult<i64> {
    match args.get(idx) {
        Some(Value::Int(v)) => Ok(*v),
        Some(other) => {
            raise_fmt!(ErrorKind::TypeError;
                "{method}() argument {idx} must be an int, got '{}'", other.type_str())
        }
        None => raise_fmt!(ErrorKind::TypeError; "{method}() is missing argument {idx}"),
    }
}

/// The argument at `idx` as an optional integer: absent or `none` is `None`.
pub(crate) fn opt_int_arg(method: &str, args: &[Value], idx: usize) -> ObjectResult<Option<i64>> {
    match args.get(idx) {
        None | Some(Value::None) => Ok(None),
        _ => int_arg(method, args, idx).map(Some),
    }
}

/// The argument at `idx` in its scalar key form (str or int).
pub(crate) fn key_arg(method: &str, args: &[Value], idx: usize) -> ObjectResult<String> {
    match args.get(idx) {
        Some(value) => value.as_key().ok_or_else(|| {
            crate::exceptions::err_fmt!(ErrorKind::TypeError;
                "{method}() argument {idx} must be a str or int key, got '{}'", value.type_str())
        }),
        None => raise_fmt!(ErrorKind::TypeError; "{method}() is missing argument {idx}"),
    }
}
