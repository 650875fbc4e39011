//! Outcomes of moving issues from one workflow to another.
//!
//! `MigrationResult` records a single project's outcome, `combine` and
//! `MultiProjectMigration` merge several, and `ProjectMigrator` drives one
//! project's issues through a caller-supplied `IssueMigrator`, aborting once
//! the configured number of issues has failed.

pub mod aggregate;
pub mod driver;
pub mod error;
mod property_tests;
pub mod result;

pub use aggregate::{combine, MultiProjectMigration, ProjectOutcome};
pub use driver::{Decision, FailureTracker, IssueMigrator, IssueRef, ProjectMigrator};
pub use error::MigrationError;
pub use result::{MigrationResult, ResultCode};
