//! Merging per-project migration results into one overall outcome.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use stepwise_core::{ErrorCollection, IssueId};

use crate::error::MigrationError;
use crate::result::{check_invariant, MigrationResult, ResultCode};

/// Combine results: terminated if any input is, with the union of all errors
/// and all failed issues. The merge is re-validated before it is returned.
pub fn combine(results: &[MigrationResult]) -> Result<MigrationResult, MigrationError> {
    let code = if results.iter().any(MigrationResult::is_terminated) {
        ResultCode::Terminated
    } else {
        ResultCode::Success
    };

    let mut errors = ErrorCollection::new();
    let mut failed: BTreeMap<IssueId, String> = BTreeMap::new();
    for result in results {
        errors.merge(result.errors());
        for (id, key) in result.failed_issues() {
            match failed.entry(*id) {
                Entry::Vacant(slot) => {
                    slot.insert(key.clone());
                }
                Entry::Occupied(slot) if slot.get() == key => {}
                Entry::Occupied(slot) => {
                    return Err(MigrationError::InconsistentResults(format!(
                        "issue {} reported as both '{}' and '{}'",
                        id,
                        slot.get(),
                        key
                    )));
                }
            }
        }
    }

    check_invariant(code, &failed, &errors).map_err(MigrationError::InconsistentResults)?;
    debug!(inputs = results.len(), %code, failed = failed.len(), "Combined migration results");
    MigrationResult::try_new(code, failed, errors)
}

/// Result of one project within a multi-project migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectOutcome {
    pub project: String,
    pub result: MigrationResult,
}

/// Ordered per-project results of a migration spanning several projects.
///
/// Projects are migrated one after another; once one terminates no further
/// project is accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiProjectMigration {
    outcomes: Vec<ProjectOutcome>,
}

impl MultiProjectMigration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, project: impl Into<String>, result: MigrationResult) -> Result<(), MigrationError> {
        let project = project.into();
        if self.is_terminated() {
            warn!(project = %project, "Skipping project after terminated migration");
            return Err(MigrationError::AlreadyTerminated(project));
        }
        self.outcomes.push(ProjectOutcome { project, result });
        Ok(())
    }

    pub fn is_terminated(&self) -> bool {
        self.outcomes.iter().any(|o| o.result.is_terminated())
    }

    pub fn outcomes(&self) -> &[ProjectOutcome] {
        &self.outcomes
    }

    /// Project whose migration terminated, if any.
    pub fn terminated_project(&self) -> Option<&str> {
        self.outcomes
            .iter()
            .find(|o| o.result.is_terminated())
            .map(|o| o.project.as_str())
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.result.failed_count()).sum()
    }

    /// The combined outcome of every project so far.
    pub fn result(&self) -> Result<MigrationResult, MigrationError> {
        let results: Vec<MigrationResult> = self.outcomes.iter().map(|o| o.result.clone()).collect();
        combine(&results)
    }
}
