use std::borrow::Cow;
use std::fmt;

use strum::Display;

/// Kind of failure surfaced by the object model.
///
/// Lookup misses (`is_child`, `has_method`, `is_callable`) are reported as
/// `false` by their operations, never through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    /// A callable pair violated the two-element shape at construction.
    InvalidReference,
    /// An invocation was attempted while the reference had no invocable target.
    NotCallable,
    /// An operation named a type that is not in the registry.
    UnknownType,
    /// An argument had the wrong shape or type for the operation.
    TypeError,
    /// An argument had the right type but an unusable value.
    ValueError,
}

/// Error raised by the object model.
///
/// Factory failures travel through this type unchanged: `create`, `cast` and
/// `instance` never wrap what a factory returns.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

pub type ObjectResult<T> = Result<T, Error>;

macro_rules! err_static {
    ($kind:expr; $msg:expr) => {
        crate::exceptions::Error::new($kind, $msg)
    };
}
pub(crate) use err_static;

macro_rules! err_fmt {
    ($kind:expr; $($fmt_args:tt)*) => {
        crate::exceptions::Error::new($kind, format!($($fmt_args)*))
    };
}
pub(crate) use err_fmt;

macro_rules! raise_static {
    ($kind:expr; $msg:expr) => {
        return Err(crate::exceptions::err_static!($kind; $msg))
    };
}
pub(crate) use raise_static;

macro_rules! raise_fmt {
    ($kind:expr; $($fmt_args:tt)*) => {
        return Err(crate::exceptions::err_fmt!($kind; $($fmt_args)*))
    };
}
pub(crate) use raise_fmt;
