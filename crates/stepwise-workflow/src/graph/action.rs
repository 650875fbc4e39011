use serde::{Deserialize, Deserializer, Serialize};

use stepwise_core::{ActionId, StepId};

use crate::condition::{ConditionGroup, ConditionNode};
use crate::descriptor::Descriptor;

/// Where a transition leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultTarget {
    Step(StepId),
    /// Stay on the step the transition was taken from.
    SameStep,
}

/// Unconditional result of a transition: destination plus post-functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub target: ResultTarget,
    #[serde(default)]
    pub post_functions: Vec<Descriptor>,
}

impl ActionResult {
    pub fn new(target: ResultTarget) -> Self {
        Self {
            target,
            post_functions: Vec::new(),
        }
    }
}

/// A transition (action) between steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Conditions guarding the transition; `None` means unconditional.
    /// Empty groups are dropped on load.
    #[serde(default, deserialize_with = "pruned_restriction")]
    pub restriction: Option<ConditionGroup>,
    #[serde(default)]
    pub validators: Vec<Descriptor>,
    pub result: ActionResult,
}

impl Action {
    pub fn new(id: ActionId, name: impl Into<String>, target: ResultTarget) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            restriction: None,
            validators: Vec::new(),
            result: ActionResult::new(target),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the restriction, dropping any empty groups.
    pub fn with_restriction(mut self, restriction: ConditionGroup) -> Self {
        self.restriction = restriction.pruned();
        self
    }

    pub fn with_validator(mut self, validator: Descriptor) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn with_post_function(mut self, function: Descriptor) -> Self {
        self.result.post_functions.push(function);
        self
    }

    /// Whether the result leads to `step`. A same-step result leads nowhere new.
    pub fn targets(&self, step: StepId) -> bool {
        self.result.target == ResultTarget::Step(step)
    }

    /// Every condition leaf of the restriction, depth-first.
    pub fn conditions(&self) -> Vec<&Descriptor> {
        self.restriction
            .as_ref()
            .map(|root| {
                root.walk()
                    .into_iter()
                    .filter_map(|(_, node)| match node {
                        ConditionNode::Leaf(leaf) => Some(leaf),
                        ConditionNode::Group(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn pruned_restriction<'de, D>(deserializer: D) -> Result<Option<ConditionGroup>, D::Error>
where
    D: Deserializer<'de>,
{
    let restriction = Option::<ConditionGroup>::deserialize(deserializer)?;
    Ok(restriction.and_then(|root| root.pruned()))
}
