use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use stepwise_core::{ErrorCollection, IssueId};

use crate::error::MigrationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultCode {
    Success,
    Terminated,
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultCode::Success => f.write_str("success"),
            ResultCode::Terminated => f.write_str("terminated"),
        }
    }
}

/// Outcome of moving one project's issues to a new workflow.
///
/// A `Success` never carries errors but may list issues that failed below
/// the tolerance threshold. A `Terminated` carries exactly one of: the
/// pre-flight errors (nothing was touched) or the issues that failed before
/// the run was aborted. Every constructor and deserialization enforces this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMigrationResult")]
pub struct MigrationResult {
    code: ResultCode,
    failed_issues: BTreeMap<IssueId, String>,
    errors: ErrorCollection,
}

#[derive(Deserialize)]
struct RawMigrationResult {
    code: ResultCode,
    #[serde(default)]
    failed_issues: BTreeMap<IssueId, String>,
    #[serde(default)]
    errors: ErrorCollection,
}

impl TryFrom<RawMigrationResult> for MigrationResult {
    type Error = MigrationError;

    fn try_from(raw: RawMigrationResult) -> Result<Self, Self::Error> {
        Self::try_new(raw.code, raw.failed_issues, raw.errors)
    }
}

impl MigrationResult {
    /// Completed migration; `failed_issues` lists tolerated failures.
    pub fn success(failed_issues: BTreeMap<IssueId, String>) -> Self {
        Self {
            code: ResultCode::Success,
            failed_issues,
            errors: ErrorCollection::new(),
        }
    }

    /// Migration refused before any issue was touched.
    pub fn terminated_with_errors(errors: ErrorCollection) -> Result<Self, MigrationError> {
        Self::try_new(ResultCode::Terminated, BTreeMap::new(), errors)
    }

    /// Migration aborted after too many issues failed.
    pub fn terminated_with_failures(failed_issues: BTreeMap<IssueId, String>) -> Result<Self, MigrationError> {
        Self::try_new(ResultCode::Terminated, failed_issues, ErrorCollection::new())
    }

    pub fn try_new(
        code: ResultCode,
        failed_issues: BTreeMap<IssueId, String>,
        errors: ErrorCollection,
    ) -> Result<Self, MigrationError> {
        check_invariant(code, &failed_issues, &errors).map_err(MigrationError::InvalidResult)?;
        Ok(Self {
            code,
            failed_issues,
            errors,
        })
    }

    pub fn code(&self) -> ResultCode {
        self.code
    }

    pub fn is_success(&self) -> bool {
        self.code == ResultCode::Success
    }

    pub fn is_terminated(&self) -> bool {
        self.code == ResultCode::Terminated
    }

    pub fn failed_issues(&self) -> &BTreeMap<IssueId, String> {
        &self.failed_issues
    }

    pub fn errors(&self) -> &ErrorCollection {
        &self.errors
    }

    pub fn failed_count(&self) -> usize {
        self.failed_issues.len()
    }
}

/// `Err` describes the violated rule.
pub(crate) fn check_invariant(
    code: ResultCode,
    failed_issues: &BTreeMap<IssueId, String>,
    errors: &ErrorCollection,
) -> Result<(), String> {
    match code {
        ResultCode::Success if !errors.is_empty() => {
            Err(format!("a successful migration cannot carry errors ({})", errors))
        }
        ResultCode::Success => Ok(()),
        ResultCode::Terminated => match (errors.is_empty(), failed_issues.is_empty()) {
            (false, false) => Err("a terminated migration carries either errors or failed issues, not both".into()),
            (true, true) => Err("a terminated migration must carry errors or failed issues".into()),
            _ => Ok(()),
        },
    }
}
