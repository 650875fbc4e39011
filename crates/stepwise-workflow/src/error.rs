use thiserror::Error;

use stepwise_core::{ActionId, ErrorCollection, StepId, StepwiseError};

/// A dotted path that does not resolve to a node.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("Malformed path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("Path '{path}' is out of range: index {index} but only {len} children")]
    AddressOutOfRange { path: String, index: usize, len: usize },

    #[error("Path '{path}' descends through a condition leaf")]
    LeafNotTraversable { path: String },
}

/// Structural edit failures. The tree is left untouched whenever one is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EditError {
    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("Invalid address '{path}': {reason}")]
    InvalidAddress { path: String, reason: String },

    #[error("Nothing to delete at '{path}'")]
    NothingToDelete { path: String },

    #[error("Transition has no conditions")]
    NoRestriction,

    #[error("Condition group '{path}' is empty")]
    EmptyGroup { path: String },

    #[error("Invalid index {index} for list of {len}")]
    InvalidIndex { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Validation failed: {0}")]
    Validation(ErrorCollection),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("Step not found: {0}")]
    StepNotFound(StepId),

    #[error("Transition not found: {0}")]
    ActionNotFound(ActionId),

    #[error("Workflow '{0}' is active and cannot be edited")]
    NotEditable(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl WorkflowError {
    /// Single-message validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        WorkflowError::Validation(ErrorCollection::with_message(message))
    }

    /// `Err(Validation)` when `errors` holds anything.
    pub fn check(errors: ErrorCollection) -> Result<(), WorkflowError> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(WorkflowError::Validation(errors))
        }
    }

    /// Whether the caller may report this to the user and carry on.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, WorkflowError::Infrastructure(_))
    }
}

impl From<WorkflowError> for StepwiseError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Validation(errors) => StepwiseError::Validation(errors),
            WorkflowError::Infrastructure(message) => StepwiseError::Infrastructure(message),
            other => StepwiseError::Validation(ErrorCollection::with_message(other.to_string())),
        }
    }
}
