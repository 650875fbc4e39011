//! Fixtures and fakes shared by the Stepwise test suites.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;

use stepwise_core::{ActionId, ErrorCollection, IssueId, StepId};
use stepwise_migration::{IssueMigrator, IssueRef};
use stepwise_workflow::{
    Action, Descriptor, ModuleDescriptor, ModuleKind, ModuleRegistry, ResultTarget, Step, Workflow,
};

/// Workflow `W`: step S1 (id 1) with unconditional T1 (id 1) to S2, and
/// step S2 (id 2) whose T2 (id 2) leads back to S1.
pub fn two_step_workflow() -> Workflow {
    Workflow::new("W")
        .with_step(
            Step::new(StepId(1), "S1")
                .with_status("1")
                .with_action(Action::new(ActionId(1), "T1", ResultTarget::Step(StepId(2)))),
        )
        .with_step(
            Step::new(StepId(2), "S2")
                .with_status("2")
                .with_action(Action::new(ActionId(2), "T2", ResultTarget::Step(StepId(1)))),
        )
}

/// A classic issue workflow with initial, common and step transitions.
///
/// Steps: Open(1), In Progress(3), Resolved(4), Closed(6).
/// Transitions: Create(1, initial), Start Progress(4), Stop Progress(301),
/// Resolve Issue(5, common to Open and In Progress), Close Issue(2),
/// Reopen Issue(3, common to Resolved and Closed).
pub fn classic_workflow() -> Workflow {
    let create = Action::new(ActionId(1), "Create", ResultTarget::Step(StepId(1)))
        .with_post_function(Descriptor::class("IssueCreateFunction"))
        .with_post_function(Descriptor::class("IssueReindexFunction"));
    let resolve = Action::new(ActionId(5), "Resolve Issue", ResultTarget::Step(StepId(4)))
        .with_post_function(Descriptor::class("UpdateIssueStatusFunction"))
        .with_post_function(Descriptor::class("IssueReindexFunction"));
    let reopen = Action::new(ActionId(3), "Reopen Issue", ResultTarget::Step(StepId(1)));

    Workflow::new("classic")
        .with_initial_action(create)
        .with_common_action(resolve)
        .with_common_action(reopen)
        .with_step(
            Step::new(StepId(1), "Open")
                .with_status("1")
                .with_action(
                    Action::new(ActionId(4), "Start Progress", ResultTarget::Step(StepId(3)))
                        .with_post_function(Descriptor::class("UpdateIssueStatusFunction")),
                )
                .with_common_action(ActionId(5)),
        )
        .with_step(
            Step::new(StepId(3), "In Progress")
                .with_status("3")
                .with_action(Action::new(ActionId(301), "Stop Progress", ResultTarget::Step(StepId(1))))
                .with_common_action(ActionId(5)),
        )
        .with_step(
            Step::new(StepId(4), "Resolved")
                .with_status("5")
                .with_action(Action::new(ActionId(2), "Close Issue", ResultTarget::Step(StepId(6))))
                .with_common_action(ActionId(3)),
        )
        .with_step(
            Step::new(StepId(6), "Closed")
                .with_status("6")
                .with_common_action(ActionId(3)),
        )
}

/// Module registry covering the classes used by the fixtures.
pub fn standard_modules() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    for (key, class, kind) in [
        ("core:always-true", "AlwaysTrueCondition", ModuleKind::Condition),
        ("core:only-assignee", "AllowOnlyAssignee", ModuleKind::Condition),
        ("core:only-reporter", "AllowOnlyReporter", ModuleKind::Condition),
        ("core:permission-validator", "PermissionValidator", ModuleKind::Validator),
        ("core:assign-to-lead", "AssignToLeadFunction", ModuleKind::Function),
    ] {
        registry.register(ModuleDescriptor::new(key, class, kind));
    }
    registry.register(
        ModuleDescriptor::new("core:in-group", "InGroupCondition", ModuleKind::Condition).unique(),
    );
    for (key, class, weight) in [
        ("core:create", "IssueCreateFunction", 10),
        ("core:update-status", "UpdateIssueStatusFunction", 20),
        ("core:fire-event", "FireIssueEventFunction", 70),
        ("core:reindex", "IssueReindexFunction", 90),
    ] {
        registry.register(ModuleDescriptor::new(key, class, ModuleKind::Function).weighted(weight));
    }
    registry
}

/// Weight lookup from fixed `(class, weight)` pairs.
pub fn weights(pairs: &[(&str, i32)]) -> impl Fn(&str) -> Option<i32> {
    let table: HashMap<String, i32> = pairs.iter().map(|(c, w)| (c.to_string(), *w)).collect();
    move |class_name: &str| table.get(class_name).copied()
}

pub fn issues(project_key: &str, count: u64) -> Vec<IssueRef> {
    (1..=count)
        .map(|i| IssueRef::new(i, format!("{}-{}", project_key, i)))
        .collect()
}

pub fn failed_map(pairs: &[(u64, &str)]) -> BTreeMap<IssueId, String> {
    pairs.iter().map(|(id, key)| (IssueId(*id), key.to_string())).collect()
}

/// Issue migrator with scripted verification errors and failing issues.
#[derive(Debug, Default)]
pub struct FakeIssueMigrator {
    pub verify_errors: Vec<String>,
    pub failing: HashSet<IssueId>,
    pub migrated: Vec<IssueId>,
}

impl FakeIssueMigrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            failing: ids.into_iter().map(IssueId).collect(),
            ..Self::default()
        }
    }

    pub fn refusing(message: impl Into<String>) -> Self {
        Self {
            verify_errors: vec![message.into()],
            ..Self::default()
        }
    }
}

impl IssueMigrator for FakeIssueMigrator {
    fn verify(&mut self, _issues: &[IssueRef]) -> ErrorCollection {
        let mut errors = ErrorCollection::new();
        for message in &self.verify_errors {
            errors.add_error_message(message.clone());
        }
        errors
    }

    fn migrate(&mut self, issue: &IssueRef) -> Result<(), String> {
        if self.failing.contains(&issue.id) {
            return Err(format!("{} could not be moved", issue.key));
        }
        self.migrated.push(issue.id);
        Ok(())
    }
}

/// Write `contents` to a temporary file that lives as long as the handle.
pub fn temp_file(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

/// Serialize a workflow to a temporary JSON file.
pub fn workflow_file(workflow: &Workflow) -> tempfile::NamedTempFile {
    let json = serde_json::to_string_pretty(workflow).expect("serialize workflow");
    temp_file(&json, ".json")
}
