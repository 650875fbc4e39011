//! Mutation entry points used by the admin layer.
//!
//! `WorkflowEditor` locates the transition, checks that the workflow may be
//! edited and that the descriptor's module fits, then delegates to the
//! condition editor or the post-function list. Positions are 1-based, as
//! shown to the user.

use tracing::{debug, error, info, warn};

use stepwise_core::config::EditorConfig;
use stepwise_core::{ActionId, ErrorCollection, LogicOperator};

use crate::addressing::DescriptorPath;
use crate::condition::ConditionNode;
use crate::descriptor::Descriptor;
use crate::editor::ConditionEditor;
use crate::error::{EditError, WorkflowError};
use crate::graph::{Action, Workflow};
use crate::module::{ModuleDescriptor, ModuleKind, ModuleResolver};
use crate::post_function::{self, WeightResolver};

pub struct WorkflowEditor<'a, R: ?Sized> {
    modules: &'a R,
    config: EditorConfig,
}

impl<'a, R> WorkflowEditor<'a, R>
where
    R: ModuleResolver + WeightResolver + ?Sized,
{
    pub fn new(modules: &'a R, config: EditorConfig) -> Self {
        Self { modules, config }
    }

    fn conditions(&self) -> ConditionEditor {
        ConditionEditor::new(self.config.default_operator)
    }

    // ── Conditions ──────────────────────────────────────────────

    /// Add a condition to the group at `path`, optionally wrapped in its own
    /// nested group. Returns the path of the new condition.
    pub fn add_condition(
        &self,
        workflow: &mut Workflow,
        action_id: ActionId,
        path: &str,
        condition: Descriptor,
        nested: bool,
    ) -> Result<DescriptorPath, WorkflowError> {
        workflow.ensure_editable()?;
        let module = self.check_module(workflow, action_id, path, &condition, ModuleKind::Condition)?;
        let action = find_action(workflow, action_id)?;
        check_unique(module.as_ref(), &condition, &action.conditions())?;

        let editor = self.conditions();
        let result = if nested {
            editor.add_nested_condition(&mut action.restriction, path, condition)
        } else {
            editor.add_condition(&mut action.restriction, path, condition)
        };
        let new_path = result.map_err(|e| edit_failed(&workflow.name, action_id, path, e))?;
        info!(workflow = %workflow.name, action_id = %action_id, path = %new_path, nested, "Added condition");
        Ok(new_path)
    }

    pub fn delete_condition(
        &self,
        workflow: &mut Workflow,
        action_id: ActionId,
        path: &str,
    ) -> Result<ConditionNode, WorkflowError> {
        workflow.ensure_editable()?;
        let action = find_action(workflow, action_id)?;
        let result = self.conditions().delete_condition(&mut action.restriction, path);
        let emptied = action.restriction.is_none();
        let removed = result.map_err(|e| edit_failed(&workflow.name, action_id, path, e))?;
        info!(workflow = %workflow.name, action_id = %action_id, path, emptied, "Deleted condition");
        Ok(removed)
    }

    pub fn change_logic_operator(
        &self,
        workflow: &mut Workflow,
        action_id: ActionId,
        path: &str,
    ) -> Result<LogicOperator, WorkflowError> {
        workflow.ensure_editable()?;
        let action = find_action(workflow, action_id)?;
        let operator = self
            .conditions()
            .change_logic_operator(&mut action.restriction, path)
            .map_err(|e| edit_failed(&workflow.name, action_id, path, e))?;
        info!(workflow = %workflow.name, action_id = %action_id, path, %operator, "Changed logic operator");
        Ok(operator)
    }

    // ── Validators ──────────────────────────────────────────────

    /// Append a validator; returns its position.
    pub fn add_validator(
        &self,
        workflow: &mut Workflow,
        action_id: ActionId,
        validator: Descriptor,
    ) -> Result<usize, WorkflowError> {
        workflow.ensure_editable()?;
        let module = self.check_module(workflow, action_id, "", &validator, ModuleKind::Validator)?;
        let action = find_action(workflow, action_id)?;
        check_unique(module.as_ref(), &validator, &action.validators.iter().collect::<Vec<_>>())?;

        action.validators.push(validator);
        let position = action.validators.len();
        info!(workflow = %workflow.name, action_id = %action_id, position, "Added validator");
        Ok(position)
    }

    pub fn delete_validator(
        &self,
        workflow: &mut Workflow,
        action_id: ActionId,
        position: usize,
    ) -> Result<Descriptor, WorkflowError> {
        workflow.ensure_editable()?;
        let action = find_action(workflow, action_id)?;
        let removed = post_function::remove_at(&mut action.validators, position)?;
        info!(workflow = %workflow.name, action_id = %action_id, position, "Deleted validator");
        Ok(removed)
    }

    // ── Post-functions ──────────────────────────────────────────

    /// Insert a post-function by its module weight; returns its position.
    pub fn add_post_function(
        &self,
        workflow: &mut Workflow,
        action_id: ActionId,
        function: Descriptor,
    ) -> Result<usize, WorkflowError> {
        workflow.ensure_editable()?;
        let module = self.check_module(workflow, action_id, "", &function, ModuleKind::Function)?;
        let action = find_action(workflow, action_id)?;
        let existing: Vec<&Descriptor> = action.result.post_functions.iter().collect();
        check_unique(module.as_ref(), &function, &existing)?;

        let weight = module.and_then(|m| m.weight);
        let position = post_function::insert(
            &mut action.result.post_functions,
            function,
            weight,
            self.modules,
            self.config.new_function_position,
        );
        info!(workflow = %workflow.name, action_id = %action_id, position, ?weight, "Added post-function");
        Ok(position)
    }

    pub fn delete_post_function(
        &self,
        workflow: &mut Workflow,
        action_id: ActionId,
        position: usize,
    ) -> Result<Descriptor, WorkflowError> {
        workflow.ensure_editable()?;
        let action = find_action(workflow, action_id)?;
        let removed = post_function::remove_at(&mut action.result.post_functions, position)?;
        info!(workflow = %workflow.name, action_id = %action_id, position, "Deleted post-function");
        Ok(removed)
    }

    pub fn move_post_function_up(
        &self,
        workflow: &mut Workflow,
        action_id: ActionId,
        position: usize,
    ) -> Result<(), WorkflowError> {
        self.move_post_function(workflow, action_id, position, true)
    }

    pub fn move_post_function_down(
        &self,
        workflow: &mut Workflow,
        action_id: ActionId,
        position: usize,
    ) -> Result<(), WorkflowError> {
        self.move_post_function(workflow, action_id, position, false)
    }

    fn move_post_function(
        &self,
        workflow: &mut Workflow,
        action_id: ActionId,
        position: usize,
        up: bool,
    ) -> Result<(), WorkflowError> {
        workflow.ensure_editable()?;
        let action = find_action(workflow, action_id)?;
        let list = &mut action.result.post_functions;
        let index = position.checked_sub(1).ok_or(EditError::InvalidIndex {
            index: position,
            len: list.len(),
        })?;
        if up {
            post_function::move_up(list, index)?;
        } else {
            post_function::move_down(list, index)?;
        }
        debug!(workflow = %workflow.name, action_id = %action_id, position, up, "Moved post-function");
        Ok(())
    }

    // ── Module checks ───────────────────────────────────────────

    /// Resolve the descriptor's module and make sure it provides `expected`.
    /// Unknown modules pass unchecked.
    fn check_module(
        &self,
        workflow: &Workflow,
        action_id: ActionId,
        path: &str,
        descriptor: &Descriptor,
        expected: ModuleKind,
    ) -> Result<Option<ModuleDescriptor>, WorkflowError> {
        if !descriptor.is_class() {
            return Ok(None);
        }
        let Some(class_name) = descriptor.class_name() else {
            error!(workflow = %workflow.name, action_id = %action_id, path, "Descriptor has no class name");
            return Err(WorkflowError::Infrastructure(format!(
                "{} descriptor is missing its class name",
                expected
            )));
        };

        match self.modules.resolve(class_name, descriptor.module_key()) {
            None => {
                warn!(workflow = %workflow.name, action_id = %action_id, class_name, "No module registered for class");
                Ok(None)
            }
            Some(module) if module.kind != expected => {
                error!(
                    workflow = %workflow.name,
                    action_id = %action_id,
                    path,
                    module = %module.key,
                    kind = %module.kind,
                    %expected,
                    "Module does not provide the expected capability"
                );
                Err(WorkflowError::Infrastructure(format!(
                    "Module '{}' is a {} module, expected a {} module",
                    module.key, module.kind, expected
                )))
            }
            Some(module) => Ok(Some(module)),
        }
    }
}

fn find_action(workflow: &mut Workflow, action_id: ActionId) -> Result<&mut Action, WorkflowError> {
    workflow
        .action_mut(action_id)
        .ok_or(WorkflowError::ActionNotFound(action_id))
}

fn check_unique(
    module: Option<&ModuleDescriptor>,
    candidate: &Descriptor,
    existing: &[&Descriptor],
) -> Result<(), WorkflowError> {
    let Some(module) = module.filter(|m| m.unique) else {
        return Ok(());
    };
    if existing.iter().any(|d| d.class_name() == candidate.class_name()) {
        let mut errors = ErrorCollection::new();
        errors.add_error_message(format!(
            "Module '{}' can only be added once to a transition.",
            module.key
        ));
        return Err(WorkflowError::Validation(errors));
    }
    Ok(())
}

fn edit_failed(workflow: &str, action_id: ActionId, path: &str, err: EditError) -> WorkflowError {
    debug!(workflow, action_id = %action_id, path, error = %err, "Edit rejected");
    WorkflowError::Edit(err)
}
