//! Error kinds and value-model construction errors

use thiserror::Error;

/// Native error type carried in an error object's internal slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// `Error`
    Error,
    /// `EvalError`
    EvalError,
    /// `RangeError`
    RangeError,
    /// `ReferenceError`
    ReferenceError,
    /// `SyntaxError`
    SyntaxError,
    /// `TypeError`
    TypeError,
    /// `URIError`
    UriError,
    /// `AggregateError`
    AggregateError,
}

impl ErrorKind {
    /// Constructor name
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::EvalError => "EvalError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::UriError => "URIError",
            ErrorKind::AggregateError => "AggregateError",
        }
    }

    /// Parse a constructor name
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Error" => ErrorKind::Error,
            "EvalError" => ErrorKind::EvalError,
            "RangeError" => ErrorKind::RangeError,
            "ReferenceError" => ErrorKind::ReferenceError,
            "SyntaxError" => ErrorKind::SyntaxError,
            "TypeError" => ErrorKind::TypeError,
            "URIError" => ErrorKind::UriError,
            "AggregateError" => ErrorKind::AggregateError,
            _ => return None,
        })
    }
}

/// Errors raised while constructing values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// View construction over something that is not an ArrayBuffer
    #[error("TypeError: {0} requires an ArrayBuffer")]
    NotABuffer(&'static str),

    /// View framing outside the buffer or misaligned
    #[error("RangeError: {0}")]
    Range(String),

    /// Operation on a detached ArrayBuffer
    #[error("TypeError: ArrayBuffer is detached")]
    Detached,

    /// Invalid regular expression flags
    #[error("SyntaxError: Invalid regular expression flags '{0}'")]
    InvalidFlags(String),
}

impl ValueError {
    /// Create a range error
    pub fn range(msg: impl Into<String>) -> Self {
        Self::Range(msg.into())
    }
}

/// Result type for value-model operations
pub type ValueResult<T> = std::result::Result<T, ValueError>;
