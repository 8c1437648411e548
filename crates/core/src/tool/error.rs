use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input provided to the tool was invalid.
    InvalidInput,
    /// Error occurred while executing the tool.
    ExecutionError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidInput => write!(f, "Invalid input"),
            ErrorKind::ExecutionError => write!(f, "Execution error"),
        }
    }
}

/// Describes a tool call error.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
}

impl Error {
    /// Creates a new error with the `InvalidInput` kind.
    #[inline]
    pub fn invalid_input() -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            reason: None,
        }
    }

    /// Creates a new error with the `ExecutionError` kind.
    #[inline]
    pub fn execution_error() -> Self {
        Self {
            kind: ErrorKind::ExecutionError,
            reason: None,
        }
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Self {
            kind: self.kind,
            reason: Some(reason.into()),
        }
    }

    /// Returns the kind of the error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the reason for the error.
    #[inline]
    pub fn reason(&self) -> Cow<'_, str> {
        match self.reason.as_deref() {
            Some(reason) => Cow::Borrowed(reason),
            None => Cow::Owned(format!("{}", self.kind)),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::InvalidInput => write!(f, "{}: {}", self.kind, self.reason()),
            ErrorKind::ExecutionError => write!(f, "{}", self.reason()),
        }
    }
}

impl StdError for Error {}

/// The error returned when dispatching a tool call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DispatchError {
    /// No tool is registered under the name.
    ToolNotFound(String),
    /// The tool ran but failed.
    Execution(Error),
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::ToolNotFound(name) => {
                write!(f, "Tool {name} not found")
            }
            DispatchError::Execution(err) => Display::fmt(err, f),
        }
    }
}

impl StdError for DispatchError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DispatchError::ToolNotFound(_) => None,
            DispatchError::Execution(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::execution_error().with_reason("Location is required");
        assert_eq!(err.to_string(), "Location is required");

        let err = Error::invalid_input().with_reason("missing field `location`");
        assert_eq!(err.to_string(), "Invalid input: missing field `location`");

        assert_eq!(Error::execution_error().to_string(), "Execution error");

        let err = DispatchError::ToolNotFound("translate".to_owned());
        assert_eq!(err.to_string(), "Tool translate not found");
    }
}
