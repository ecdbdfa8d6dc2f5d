use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

/// Error kinds for rowset operations.
///
/// Each kind names a category of failure so callers can match on the
/// condition instead of parsing messages.
///
/// # Examples
///
/// ```rust,ignore
/// use rowset::errors::{ErrorKind, RowsetError, RowsetResult};
///
/// fn example() -> RowsetResult<()> {
///     Err(RowsetError::new("pop on an empty collection", ErrorKind::EmptyCollection))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// A precondition-violating operation on an empty collection
    /// (`pop`, `shift`, `minimum`, `maximum`, `average`).
    EmptyCollection,
    /// A search pattern failed to compile as a regular expression.
    InvalidPattern,
    /// A row column name was rejected (empty names are not allowed).
    InvalidColumnName,
    /// The operation is not valid in the current context.
    InvalidOperation,
    /// Internal error (usually indicates a bug).
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::EmptyCollection => write!(f, "Empty collection"),
            ErrorKind::InvalidPattern => write!(f, "Invalid pattern"),
            ErrorKind::InvalidColumnName => write!(f, "Invalid column name"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom rowset error type.
///
/// `RowsetError` carries the error message, its kind, and an optional cause.
/// It supports error chaining and captures a backtrace for debugging.
///
/// The `RowsetResult<T>` alias is equivalent to `Result<T, RowsetError>` and
/// is used by every fallible operation in the crate.
#[derive(Clone)]
pub struct RowsetError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<RowsetError>>,
    backtrace: Backtrace,
}

impl RowsetError {
    /// Creates a new `RowsetError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        RowsetError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Backtrace::new(),
        }
    }

    /// Creates a new `RowsetError` with a cause error attached, preserving
    /// the chain for debugging.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: RowsetError) -> Self {
        RowsetError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Backtrace::new(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&RowsetError> {
        self.cause.as_deref()
    }
}

impl Display for RowsetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for RowsetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace),
        }
    }
}

impl Error for RowsetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for rowset operations.
pub type RowsetResult<T> = Result<T, RowsetError>;

impl From<String> for RowsetError {
    fn from(msg: String) -> Self {
        RowsetError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for RowsetError {
    fn from(msg: &str) -> Self {
        RowsetError::new(msg, ErrorKind::InternalError)
    }
}
