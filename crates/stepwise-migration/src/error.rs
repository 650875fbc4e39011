use thiserror::Error;

use stepwise_core::{ErrorCollection, StepwiseError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MigrationError {
    #[error("Invalid migration result: {0}")]
    InvalidResult(String),

    #[error("Inconsistent migration results: {0}")]
    InconsistentResults(String),

    #[error("Migration already terminated; project '{0}' was not started")]
    AlreadyTerminated(String),
}

impl From<MigrationError> for StepwiseError {
    fn from(err: MigrationError) -> Self {
        StepwiseError::Validation(ErrorCollection::with_message(err.to_string()))
    }
}
