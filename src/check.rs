use std::collections::{BTreeMap, BTreeSet};

use stepwise_core::ErrorCollection;
use stepwise_workflow::validation::{check_invalid_characters, is_acceptable_name};
use stepwise_workflow::{ResultTarget, Workflow};

struct CheckResult {
    label: String,
    ok: bool,
    detail: String,
}

impl CheckResult {
    fn from_problems(label: &str, problems: Vec<String>, ok_detail: String) -> Self {
        if problems.is_empty() {
            CheckResult {
                label: label.into(),
                ok: true,
                detail: ok_detail,
            }
        } else {
            CheckResult {
                label: label.into(),
                ok: false,
                detail: problems.join(", "),
            }
        }
    }
}

/// Print one line per check; returns whether every check passed.
pub fn run_checks(workflow: &Workflow) -> bool {
    let checks = vec![
        check_name(workflow),
        check_step_ids(workflow),
        check_action_ids(workflow),
        check_targets(workflow),
        check_common_actions(workflow),
        check_descriptor_names(workflow),
        check_restrictions(workflow),
    ];

    let mut ok_count = 0;
    let mut fail_count = 0;

    for check in &checks {
        let icon = if check.ok { "[OK]" } else { "[!!]" };
        println!("  {} {}: {}", icon, check.label, check.detail);
        if check.ok {
            ok_count += 1;
        } else {
            fail_count += 1;
        }
    }

    println!();
    println!("  {} passed, {} issues found", ok_count, fail_count);
    fail_count == 0
}

fn check_name(workflow: &Workflow) -> CheckResult {
    if is_acceptable_name(&workflow.name) {
        CheckResult {
            label: "Name".into(),
            ok: true,
            detail: workflow.name.clone(),
        }
    } else {
        CheckResult {
            label: "Name".into(),
            ok: false,
            detail: format!("'{}' is blank, padded or not ASCII", workflow.name),
        }
    }
}

fn check_step_ids(workflow: &Workflow) -> CheckResult {
    let mut seen = BTreeSet::new();
    let problems = workflow
        .steps
        .iter()
        .filter(|s| !seen.insert(s.id))
        .map(|s| format!("duplicate step id {}", s.id))
        .collect();
    CheckResult::from_problems("Steps", problems, format!("{} steps", workflow.steps.len()))
}

fn check_action_ids(workflow: &Workflow) -> CheckResult {
    let mut counts = BTreeMap::new();
    for action in workflow.actions() {
        *counts.entry(action.id).or_insert(0usize) += 1;
    }
    let problems = counts
        .iter()
        .filter(|(_, n)| **n > 1)
        .map(|(id, n)| format!("transition id {} used {} times", id, n))
        .collect();
    CheckResult::from_problems("Transitions", problems, format!("{} transitions", counts.len()))
}

fn check_targets(workflow: &Workflow) -> CheckResult {
    let problems = workflow
        .actions()
        .filter_map(|a| match a.result.target {
            ResultTarget::Step(id) if workflow.step(id).is_none() => {
                Some(format!("'{}' leads to missing step {}", a.name, id))
            }
            _ => None,
        })
        .collect();
    CheckResult::from_problems("Results", problems, "all destinations exist".into())
}

fn check_common_actions(workflow: &Workflow) -> CheckResult {
    let mut problems = Vec::new();
    for step in &workflow.steps {
        for id in &step.common_actions {
            if !workflow.common_actions.iter().any(|a| a.id == *id) {
                problems.push(format!("step '{}' refers to unknown common transition {}", step.name, id));
            }
        }
    }
    CheckResult::from_problems(
        "Common transitions",
        problems,
        format!("{} shared", workflow.common_actions.len()),
    )
}

fn check_descriptor_names(workflow: &Workflow) -> CheckResult {
    let mut errors = ErrorCollection::new();
    for step in &workflow.steps {
        check_invalid_characters(&step.name, &format!("step {}", step.id), &mut errors);
    }
    for action in workflow.actions() {
        check_invalid_characters(&action.name, &format!("transition {}", action.id), &mut errors);
    }
    let problems = errors.errors.keys().map(|field| format!("{} has a reserved character", field)).collect();
    CheckResult::from_problems("Names", problems, "no reserved characters".into())
}

fn check_restrictions(workflow: &Workflow) -> CheckResult {
    let mut conditioned = 0;
    let mut problems = Vec::new();
    for action in workflow.actions() {
        let Some(root) = action.restriction.as_ref() else {
            continue;
        };
        conditioned += 1;
        let missing_class = root.walk().into_iter().any(|(_, node)| {
            node.as_leaf()
                .is_some_and(|leaf| leaf.is_class() && leaf.class_name().is_none())
        });
        if missing_class {
            problems.push(format!("'{}' has a class condition without class.name", action.name));
        }
    }
    CheckResult::from_problems("Conditions", problems, format!("{} conditioned transitions", conditioned))
}
