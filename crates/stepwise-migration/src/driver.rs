//! Per-project migration driver and its failure threshold.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use stepwise_core::config::MigrationConfig;
use stepwise_core::{ErrorCollection, IssueId};

use crate::error::MigrationError;
use crate::result::MigrationResult;

/// An issue selected for migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub id: IssueId,
    pub key: String,
}

impl IssueRef {
    pub fn new(id: u64, key: impl Into<String>) -> Self {
        Self {
            id: IssueId(id),
            key: key.into(),
        }
    }
}

/// Whether the driver should keep going after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Abort,
}

/// Counts failed issues against the abort threshold.
#[derive(Debug, Clone)]
pub struct FailureTracker {
    threshold: usize,
    failed: BTreeMap<IssueId, String>,
}

impl FailureTracker {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            failed: BTreeMap::new(),
        }
    }

    /// Record a failed issue; the failure that reaches the threshold aborts.
    pub fn record_failure(&mut self, issue: &IssueRef) -> Decision {
        self.failed.insert(issue.id, issue.key.clone());
        if self.failed.len() >= self.threshold {
            Decision::Abort
        } else {
            Decision::Continue
        }
    }

    pub fn failed(&self) -> &BTreeMap<IssueId, String> {
        &self.failed
    }

    pub fn into_failed(self) -> BTreeMap<IssueId, String> {
        self.failed
    }
}

/// Work done on individual issues, supplied by the caller.
pub trait IssueMigrator {
    /// Check every issue can be migrated; any error refuses the whole project.
    fn verify(&mut self, issues: &[IssueRef]) -> ErrorCollection;

    /// Move one issue; `Err` carries the reason it failed.
    fn migrate(&mut self, issue: &IssueRef) -> Result<(), String>;
}

/// Migrates the issues of one project, tolerating failures up to a threshold.
pub struct ProjectMigrator {
    project: String,
    failure_threshold: usize,
}

impl ProjectMigrator {
    pub fn new(project: impl Into<String>, config: &MigrationConfig) -> Self {
        Self {
            project: project.into(),
            failure_threshold: config.failure_threshold,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn run<M>(&self, issues: &[IssueRef], migrator: &mut M) -> Result<MigrationResult, MigrationError>
    where
        M: IssueMigrator + ?Sized,
    {
        info!(project = %self.project, issues = issues.len(), "Verifying issues for migration");
        let errors = migrator.verify(issues);
        if !errors.is_empty() {
            warn!(project = %self.project, errors = %errors, "Migration refused by verification");
            return MigrationResult::terminated_with_errors(errors);
        }

        let mut tracker = FailureTracker::new(self.failure_threshold);
        for issue in issues {
            let Err(reason) = migrator.migrate(issue) else {
                continue;
            };
            warn!(project = %self.project, issue = %issue.key, reason = %reason, "Issue migration failed");
            if tracker.record_failure(issue) == Decision::Abort {
                error!(
                    project = %self.project,
                    failed = tracker.failed().len(),
                    "Too many issues failed; terminating migration"
                );
                return MigrationResult::terminated_with_failures(tracker.into_failed());
            }
        }

        let failed = tracker.into_failed();
        info!(project = %self.project, failed = failed.len(), "Migration complete");
        Ok(MigrationResult::success(failed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        verify_errors: Vec<String>,
        failing: Vec<u64>,
        migrated: Vec<u64>,
    }

    impl Scripted {
        fn failing(ids: impl IntoIterator<Item = u64>) -> Self {
            Self {
                verify_errors: Vec::new(),
                failing: ids.into_iter().collect(),
                migrated: Vec::new(),
            }
        }
    }

    impl IssueMigrator for Scripted {
        fn verify(&mut self, _issues: &[IssueRef]) -> ErrorCollection {
            let mut errors = ErrorCollection::new();
            for message in &self.verify_errors {
                errors.add_error_message(message.clone());
            }
            errors
        }

        fn migrate(&mut self, issue: &IssueRef) -> Result<(), String> {
            if self.failing.contains(&issue.id.0) {
                return Err("status has no mapping".into());
            }
            self.migrated.push(issue.id.0);
            Ok(())
        }
    }

    fn issues(n: u64) -> Vec<IssueRef> {
        (1..=n).map(|i| IssueRef::new(i, format!("HSP-{}", i))).collect()
    }

    fn migrator() -> ProjectMigrator {
        ProjectMigrator::new("Homosapien", &MigrationConfig::default())
    }

    #[test]
    fn tracker_aborts_at_threshold() {
        let mut tracker = FailureTracker::new(2);
        assert_eq!(tracker.record_failure(&IssueRef::new(1, "A-1")), Decision::Continue);
        assert_eq!(tracker.record_failure(&IssueRef::new(2, "A-2")), Decision::Abort);
    }

    #[test]
    fn clean_run_is_success() {
        let mut scripted = Scripted::failing([]);
        let result = migrator().run(&issues(5), &mut scripted).unwrap();
        assert!(result.is_success());
        assert_eq!(scripted.migrated, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn failures_below_threshold_still_succeed() {
        let mut scripted = Scripted::failing(1..=9);
        let result = migrator().run(&issues(20), &mut scripted).unwrap();
        assert!(result.is_success());
        assert_eq!(result.failed_count(), 9);
        assert_eq!(scripted.migrated.len(), 11);
    }

    #[test]
    fn reaching_threshold_terminates_with_failures_so_far() {
        let mut scripted = Scripted::failing(1..=15);
        let result = migrator().run(&issues(20), &mut scripted).unwrap();
        assert!(result.is_terminated());
        assert_eq!(result.failed_count(), 10);
        assert!(result.errors().is_empty());
        assert!(scripted.migrated.is_empty());
    }

    #[test]
    fn verification_errors_terminate_before_migrating() {
        let mut scripted = Scripted::failing([]);
        scripted.verify_errors.push("Issue HSP-2 has an unmapped status".into());
        let result = migrator().run(&issues(3), &mut scripted).unwrap();
        assert!(result.is_terminated());
        assert!(result.failed_issues().is_empty());
        assert_eq!(result.errors().len(), 1);
        assert!(scripted.migrated.is_empty());
    }
}
