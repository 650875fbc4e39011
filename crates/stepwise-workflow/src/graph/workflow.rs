use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use stepwise_core::{ActionId, ErrorCollection, StepId, WorkflowMode};

use super::action::{Action, ResultTarget};
use super::step::Step;
use crate::error::WorkflowError;
use crate::validation;

/// Snapshot of the live workflow a draft was created from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRef {
    pub name: String,
    /// Live step ids with their outgoing transition counts.
    #[serde(default)]
    pub steps: BTreeMap<StepId, usize>,
}

impl WorkflowRef {
    pub fn of(workflow: &Workflow) -> Self {
        Self {
            name: workflow.name.clone(),
            steps: workflow
                .steps
                .iter()
                .map(|step| (step.id, step.outgoing_count()))
                .collect(),
        }
    }

    pub fn contains_step(&self, id: StepId) -> bool {
        self.steps.contains_key(&id)
    }

    pub fn outgoing_count(&self, id: StepId) -> Option<usize> {
        self.steps.get(&id).copied()
    }
}

/// A named workflow: steps plus the transitions between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mode: WorkflowMode,
    /// A live workflow in use by some project.
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub initial_actions: Vec<Action>,
    #[serde(default)]
    pub global_actions: Vec<Action>,
    #[serde(default)]
    pub common_actions: Vec<Action>,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Set on drafts only.
    #[serde(default)]
    pub live: Option<WorkflowRef>,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            mode: WorkflowMode::Live,
            active: false,
            initial_actions: Vec::new(),
            global_actions: Vec::new(),
            common_actions: Vec::new(),
            steps: Vec::new(),
            live: None,
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_initial_action(mut self, action: Action) -> Self {
        self.initial_actions.push(action);
        self
    }

    pub fn with_global_action(mut self, action: Action) -> Self {
        self.global_actions.push(action);
        self
    }

    pub fn with_common_action(mut self, action: Action) -> Self {
        self.common_actions.push(action);
        self
    }

    pub fn is_draft(&self) -> bool {
        self.mode == WorkflowMode::Draft
    }

    // ── Queries ─────────────────────────────────────────────────

    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn step_mut(&mut self, id: StepId) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    /// Every transition of the workflow: initial, global, common, then per step.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.initial_actions
            .iter()
            .chain(self.global_actions.iter())
            .chain(self.common_actions.iter())
            .chain(self.steps.iter().flat_map(|s| s.actions.iter()))
    }

    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions().find(|a| a.id == id)
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut Action> {
        self.initial_actions
            .iter_mut()
            .chain(self.global_actions.iter_mut())
            .chain(self.common_actions.iter_mut())
            .chain(self.steps.iter_mut().flat_map(|s| s.actions.iter_mut()))
            .find(|a| a.id == id)
    }

    /// Steps the transition can be taken from.
    pub fn steps_for_transition(&self, id: ActionId) -> Vec<&Step> {
        self.steps.iter().filter(|s| s.has_action(id)).collect()
    }

    /// Transitions anywhere in the workflow whose result leads to `step`.
    pub fn actions_with_result(&self, step: StepId) -> Vec<&Action> {
        self.actions().filter(|a| a.targets(step)).collect()
    }

    pub fn is_global_action(&self, id: ActionId) -> bool {
        self.global_actions.iter().any(|a| a.id == id)
    }

    /// Shared by two or more steps.
    pub fn is_common_action(&self, id: ActionId) -> bool {
        self.steps_for_transition(id).len() >= 2
    }

    pub fn is_initial_action(&self, id: ActionId) -> bool {
        self.initial_actions.iter().any(|a| a.id == id)
    }

    pub fn next_step_id(&self) -> StepId {
        StepId(self.steps.iter().map(|s| s.id.0).max().map_or(1, |max| max + 1))
    }

    pub fn next_action_id(&self) -> ActionId {
        ActionId(self.actions().map(|a| a.id.0).max().map_or(1, |max| max + 1))
    }

    /// A step inherited from the live workflow this draft was created from.
    pub fn is_old_step(&self, id: StepId) -> bool {
        self.is_draft() && self.live.as_ref().is_some_and(|live| live.contains_step(id))
    }

    /// Active live workflows are read-only; edits go through a draft.
    pub fn is_editable(&self) -> bool {
        !(self.mode == WorkflowMode::Live && self.active)
    }

    pub fn ensure_editable(&self) -> Result<(), WorkflowError> {
        if self.is_editable() {
            Ok(())
        } else {
            Err(WorkflowError::NotEditable(self.name.clone()))
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Editable copy of this workflow that remembers its live steps.
    pub fn create_draft(&self) -> Workflow {
        let mut draft = self.clone();
        draft.mode = WorkflowMode::Draft;
        draft.active = false;
        draft.live = Some(WorkflowRef::of(self));
        debug!(workflow = %self.name, steps = self.steps.len(), "Created draft");
        draft
    }

    pub fn rename(&mut self, name: &str) -> Result<(), WorkflowError> {
        let mut errors = ErrorCollection::new();
        if !validation::check_workflow_name(name, "newWorkflowName", &mut errors) {
            return Err(WorkflowError::Validation(errors));
        }
        self.name = name.to_string();
        Ok(())
    }

    // ── Steps ───────────────────────────────────────────────────

    pub fn add_step(&mut self, name: &str, status_id: Option<&str>) -> Result<StepId, WorkflowError> {
        self.ensure_editable()?;
        let mut errors = ErrorCollection::new();
        self.check_step_name(name, None, &mut errors);
        if let Some(status) = status_id {
            self.check_status_free(status, None, &mut errors);
        }
        WorkflowError::check(errors)?;

        let id = self.next_step_id();
        let mut step = Step::new(id, name.trim());
        step.status_id = status_id.map(str::to_string);
        self.steps.push(step);
        debug!(workflow = %self.name, step_id = %id, "Added step");
        Ok(id)
    }

    pub fn rename_step(&mut self, id: StepId, name: &str) -> Result<(), WorkflowError> {
        self.ensure_editable()?;
        if self.step(id).is_none() {
            return Err(WorkflowError::StepNotFound(id));
        }
        let mut errors = ErrorCollection::new();
        self.check_step_name(name, Some(id), &mut errors);
        WorkflowError::check(errors)?;

        if let Some(step) = self.step_mut(id) {
            step.name = name.trim().to_string();
        }
        Ok(())
    }

    pub fn link_status(&mut self, id: StepId, status_id: &str) -> Result<(), WorkflowError> {
        self.ensure_editable()?;
        let step = self.step(id).ok_or(WorkflowError::StepNotFound(id))?;
        if self.is_old_step(id) {
            return Err(WorkflowError::validation(format!(
                "Cannot change the status of step '{}': it exists on the live workflow.",
                step.name
            )));
        }
        let mut errors = ErrorCollection::new();
        self.check_status_free(status_id, Some(id), &mut errors);
        WorkflowError::check(errors)?;

        if let Some(step) = self.step_mut(id) {
            step.status_id = Some(status_id.to_string());
        }
        Ok(())
    }

    /// Remove a step that no transition leads to.
    pub fn remove_step(&mut self, id: StepId) -> Result<Step, WorkflowError> {
        self.ensure_editable()?;
        let index = self
            .steps
            .iter()
            .position(|s| s.id == id)
            .ok_or(WorkflowError::StepNotFound(id))?;
        let name = &self.steps[index].name;

        if self.is_old_step(id) {
            return Err(WorkflowError::validation(format!(
                "Cannot delete step '{}': it exists on the live workflow.",
                name
            )));
        }

        let incoming: Vec<&str> = self.actions_with_result(id).iter().map(|a| a.name.as_str()).collect();
        if !incoming.is_empty() {
            return Err(WorkflowError::validation(format!(
                "Cannot delete step '{}': it is the destination of transition(s) {}.",
                name,
                incoming.join(", ")
            )));
        }

        let step = self.steps.remove(index);
        debug!(workflow = %self.name, step_id = %id, "Removed step");
        Ok(step)
    }

    fn check_step_name(&self, name: &str, current: Option<StepId>, errors: &mut ErrorCollection) {
        if !validation::check_descriptor_name(name, "stepName", errors) {
            return;
        }
        let taken = self
            .steps
            .iter()
            .any(|s| Some(s.id) != current && s.name.eq_ignore_ascii_case(name.trim()));
        if taken {
            errors.add_error("stepName", "A step with this name already exists.");
        }
    }

    fn check_status_free(&self, status_id: &str, current: Option<StepId>, errors: &mut ErrorCollection) {
        let owner = self
            .steps
            .iter()
            .find(|s| Some(s.id) != current && s.status_id.as_deref() == Some(status_id));
        if let Some(owner) = owner {
            errors.add_error(
                "stepStatus",
                format!("Status is already linked to step '{}'.", owner.name),
            );
        }
    }

    // ── Transitions ─────────────────────────────────────────────

    /// Add a transition from `origin`, or a global transition when `origin`
    /// is `None`.
    pub fn add_transition(
        &mut self,
        origin: Option<StepId>,
        name: &str,
        description: Option<&str>,
        target: ResultTarget,
    ) -> Result<ActionId, WorkflowError> {
        self.ensure_editable()?;
        let siblings: Vec<&str> = match origin {
            Some(step_id) => {
                let step = self.step(step_id).ok_or(WorkflowError::StepNotFound(step_id))?;
                self.actions()
                    .filter(|a| step.has_action(a.id))
                    .map(|a| a.name.as_str())
                    .collect()
            }
            None => self.global_actions.iter().map(|a| a.name.as_str()).collect(),
        };

        let mut errors = ErrorCollection::new();
        if validation::check_descriptor_name(name, "transitionName", &mut errors)
            && siblings.iter().any(|s| s.eq_ignore_ascii_case(name.trim()))
        {
            errors.add_error("transitionName", "A transition with this name already exists from this step.");
        }
        if let ResultTarget::Step(destination) = target {
            if self.step(destination).is_none() {
                errors.add_error("destinationStep", format!("Step {} does not exist.", destination));
            }
        }
        if let Some(step_id) = origin {
            let live_outgoing = self.live.as_ref().and_then(|live| live.outgoing_count(step_id));
            if self.is_old_step(step_id) && live_outgoing == Some(0) {
                errors.add_error_message(format!(
                    "Cannot add transitions to step {}: it has no outgoing transitions on the live workflow.",
                    step_id
                ));
            }
        }
        WorkflowError::check(errors)?;

        let id = self.next_action_id();
        let mut action = Action::new(id, name.trim(), target);
        action.description = description.map(str::to_string);
        match origin.and_then(|step_id| self.step_mut(step_id)) {
            Some(step) => step.actions.push(action),
            None => self.global_actions.push(action),
        }
        debug!(workflow = %self.name, action_id = %id, "Added transition");
        Ok(id)
    }

    /// Remove a step, global or common transition. Initial transitions stay.
    pub fn remove_transition(&mut self, id: ActionId) -> Result<Action, WorkflowError> {
        self.ensure_editable()?;
        if self.is_initial_action(id) {
            return Err(WorkflowError::validation("Cannot delete the initial transition."));
        }
        if let Some(index) = self.global_actions.iter().position(|a| a.id == id) {
            return Ok(self.global_actions.remove(index));
        }

        let origins: Vec<StepId> = self.steps_for_transition(id).iter().map(|s| s.id).collect();
        for &step_id in &origins {
            self.check_keeps_outgoing(step_id)?;
        }

        let removed = if let Some(index) = self.common_actions.iter().position(|a| a.id == id) {
            for step in &mut self.steps {
                step.common_actions.retain(|&common| common != id);
            }
            Some(self.common_actions.remove(index))
        } else {
            self.steps.iter_mut().find_map(|step| {
                let index = step.actions.iter().position(|a| a.id == id)?;
                Some(step.actions.remove(index))
            })
        };

        let action = removed.ok_or(WorkflowError::ActionNotFound(id))?;
        debug!(workflow = %self.name, action_id = %id, "Removed transition");
        Ok(action)
    }

    /// On a draft an old step that had outgoing transitions must keep one.
    fn check_keeps_outgoing(&self, step_id: StepId) -> Result<(), WorkflowError> {
        let live_outgoing = self.live.as_ref().and_then(|live| live.outgoing_count(step_id));
        let remaining = self.step(step_id).map_or(0, Step::outgoing_count);
        if self.is_old_step(step_id) && live_outgoing.unwrap_or(0) > 0 && remaining <= 1 {
            return Err(WorkflowError::validation(format!(
                "Cannot delete the last outgoing transition of step {} on a draft.",
                step_id
            )));
        }
        Ok(())
    }
}
