use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StepwiseError {
    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(ErrorCollection),

    // Infrastructure errors
    #[error("Infrastructure error: {0}")]
    Infrastructure(String),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StepwiseError>;

/// User-facing validation messages collected during an operation.
///
/// General messages keep their insertion order; field errors are keyed by the
/// form field they belong to (one message per field, last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCollection {
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

impl ErrorCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection holding a single general message.
    pub fn with_message(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add_error_message(message);
        errors
    }

    pub fn add_error_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(field.into(), message.into());
    }

    /// Append every message and field error of `other`.
    pub fn merge(&mut self, other: &ErrorCollection) {
        self.messages.extend(other.messages.iter().cloned());
        for (field, message) in &other.errors {
            self.errors.insert(field.clone(), message.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.errors.is_empty()
    }

    pub fn has_any_errors(&self) -> bool {
        !self.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len() + self.errors.len()
    }

    /// Turn a non-empty collection into an `Err`.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(StepwiseError::Validation(self))
        }
    }
}

impl fmt::Display for ErrorCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for message in &self.messages {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}", message)?;
            first = false;
        }
        for (field, message) in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collection_is_ok() {
        let errors = ErrorCollection::new();
        assert!(errors.is_empty());
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn merge_keeps_message_order() {
        let mut a = ErrorCollection::with_message("first");
        let mut b = ErrorCollection::with_message("second");
        b.add_error("name", "must not be blank");
        a.merge(&b);

        assert_eq!(a.messages, vec!["first", "second"]);
        assert_eq!(a.errors.get("name").map(String::as_str), Some("must not be blank"));
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn display_joins_messages_and_fields() {
        let mut errors = ErrorCollection::with_message("Step is a transition target");
        errors.add_error("stepName", "duplicate");
        assert_eq!(errors.to_string(), "Step is a transition target; stepName: duplicate");
    }

    #[test]
    fn non_empty_collection_becomes_validation_error() {
        let err = ErrorCollection::with_message("bad").into_result().unwrap_err();
        assert!(matches!(err, StepwiseError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: bad");
    }
}
