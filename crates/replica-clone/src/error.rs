//! Clone error types
//!
//! Most variants describe recoverable degradations: they are handed to the
//! log sink and cloning continues with a placeholder. Only
//! [`CloneError::Customizer`] (with `let_customizer_throw`) and
//! [`CloneError::InvalidOptions`] ever fail a call.

use replica_value::{ErrorKind, JsObject, Value};
use thiserror::Error;

use crate::path::ClonePath;

/// Boxed error returned by customizers
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for clone operations
pub type CloneResult<T> = Result<T, CloneError>;

/// Clone errors and degradation reports
#[derive(Debug, Error)]
pub enum CloneError {
    /// A kind with no faithful copy (functions, weak containers, opaque host kinds)
    #[error("{kind} cannot be cloned{}; substituted an empty object", at(.path))]
    Unclonable {
        /// Brand name of the value
        kind: &'static str,
        /// Location, in verbose mode
        path: Option<ClonePath>,
    },

    /// A `Symbol.toStringTag` claim the internal slot does not back up
    #[error(
        "object claims to be {claimed} but is {actual}{}; substituted an empty object",
        at(.path)
    )]
    BrandMismatch {
        /// The claimed kind
        claimed: &'static str,
        /// The kind actually found in the slot
        actual: &'static str,
        /// Location, in verbose mode
        path: Option<ClonePath>,
    },

    /// A view or buffer whose storage has been detached
    #[error("{kind} is backed by a detached ArrayBuffer{}; substituted an empty object", at(.path))]
    DetachedBuffer {
        /// Brand name of the value
        kind: &'static str,
        /// Location, in verbose mode
        path: Option<ClonePath>,
    },

    /// A customizer returned an error
    #[error("customizer failed{}: {source}", at(.path))]
    Customizer {
        /// Location, in verbose mode
        path: Option<ClonePath>,
        /// What the customizer reported
        #[source]
        source: BoxError,
    },

    /// A `Symbol.cloningMethod` threw or returned something unusable
    #[error("cloning method failed{}: {reason}", at(.path))]
    CloningMethod {
        /// Location, in verbose mode
        path: Option<ClonePath>,
        /// Description of the failure
        reason: String,
    },

    /// An awaited additional value rejected; its assignment was skipped
    #[error("awaited value rejected{}: {reason}", at(.path))]
    SettlementRejected {
        /// Location, in verbose mode
        path: Option<ClonePath>,
        /// Description of the rejection reason
        reason: String,
    },

    /// Options could not be parsed or are inconsistent
    #[error("invalid clone options: {0}")]
    InvalidOptions(String),
}

fn at(path: &Option<ClonePath>) -> String {
    match path {
        Some(path) => format!(" at {path}"),
        None => String::new(),
    }
}

impl CloneError {
    /// Where the problem was found (verbose mode only)
    pub fn path(&self) -> Option<&ClonePath> {
        match self {
            CloneError::Unclonable { path, .. }
            | CloneError::BrandMismatch { path, .. }
            | CloneError::DetachedBuffer { path, .. }
            | CloneError::Customizer { path, .. }
            | CloneError::CloningMethod { path, .. }
            | CloneError::SettlementRejected { path, .. } => path.as_ref(),
            CloneError::InvalidOptions(_) => None,
        }
    }

    /// Check if this is a degradation (a placeholder was substituted)
    pub fn is_degradation(&self) -> bool {
        matches!(
            self,
            CloneError::Unclonable { .. }
                | CloneError::BrandMismatch { .. }
                | CloneError::DetachedBuffer { .. }
        )
    }

    /// The error as an `Error` object, for rejecting a promise
    pub fn to_value(&self) -> Value {
        Value::object(JsObject::error(ErrorKind::Error, &self.to_string()))
    }
}

/// Short human-readable description of a thrown value or rejection reason
pub(crate) fn describe(value: &Value) -> String {
    if let Some(obj) = value.as_object()
        && let Some(kind) = obj.error_kind()
    {
        return match value.get("message").as_str() {
            Some(message) => format!("{}: {message}", kind.name()),
            None => kind.name().to_string(),
        };
    }
    match value.as_str() {
        Some(s) => s.to_string(),
        None => format!("{value:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Segment;
    use replica_value::PropertyKey;

    #[test]
    fn test_message_includes_path() {
        let path = ClonePath::root().child(Segment::Key(PropertyKey::string("f")));
        let err = CloneError::Unclonable {
            kind: "Function",
            path: Some(path),
        };
        assert_eq!(
            err.to_string(),
            "Function cannot be cloned at $.f; substituted an empty object"
        );
        assert!(err.is_degradation());
    }

    #[test]
    fn test_message_without_path() {
        let err = CloneError::SettlementRejected {
            path: None,
            reason: "boom".into(),
        };
        assert_eq!(err.to_string(), "awaited value rejected: boom");
        assert!(err.path().is_none());
    }

    #[test]
    fn test_describe_error_object() {
        let err = Value::object(JsObject::error(ErrorKind::TypeError, "bad"));
        assert_eq!(describe(&err), "TypeError: bad");
        assert_eq!(describe(&Value::from("plain")), "plain");
        assert_eq!(describe(&Value::int32(3)), "3");
    }

    #[test]
    fn test_to_value_is_error_object() {
        let err = CloneError::InvalidOptions("nope".into());
        let value = err.to_value();
        assert_eq!(
            value.get("message").as_str(),
            Some("invalid clone options: nope")
        );
    }
}
