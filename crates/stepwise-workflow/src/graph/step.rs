use serde::{Deserialize, Serialize};

use stepwise_core::{ActionId, StepId};

use super::action::Action;

/// A state of the workflow, linked to an issue status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub name: String,
    #[serde(default)]
    pub status_id: Option<String>,
    /// Transitions owned by this step.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Workflow-level common transitions available from this step.
    #[serde(default)]
    pub common_actions: Vec<ActionId>,
}

impl Step {
    pub fn new(id: StepId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status_id: None,
            actions: Vec::new(),
            common_actions: Vec::new(),
        }
    }

    pub fn with_status(mut self, status_id: impl Into<String>) -> Self {
        self.status_id = Some(status_id.into());
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_common_action(mut self, id: ActionId) -> Self {
        self.common_actions.push(id);
        self
    }

    /// Whether the transition is available from this step, owned or common.
    pub fn has_action(&self, id: ActionId) -> bool {
        self.actions.iter().any(|a| a.id == id) || self.common_actions.contains(&id)
    }

    /// Number of outgoing transitions, owned and common.
    pub fn outgoing_count(&self) -> usize {
        self.actions.len() + self.common_actions.len()
    }
}
