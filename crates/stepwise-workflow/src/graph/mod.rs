//! Workflow graph: steps, transitions and their results.
//!
//! Transitions live in one of four places: owned by a step, in the global
//! action list, in the common action list (shared by id between steps), or in
//! the initial action list taken from the synthetic "no step" origin.
//! Classification is always derived from these lists.

pub mod action;
pub mod step;
pub mod workflow;

pub use action::{Action, ActionResult, ResultTarget};
pub use step::Step;
pub use workflow::{Workflow, WorkflowRef};
