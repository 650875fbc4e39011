//! Workflow graph model and the structural editors for transitions.
//!
//! A `Workflow` owns steps, transitions (actions) and their results. Each
//! transition carries an optional restriction: a tree of AND/OR condition
//! groups addressed by dotted 1-based paths (`"2.1"`), with the root group
//! implicit (`""`). Validators and post-functions are flat ordered lists.
//!
//! `ConditionEditor` and the `post_function` helpers mutate a single
//! transition; `WorkflowEditor` is the entry point that resolves the
//! transition, applies module checks, and logs.

pub mod addressing;
pub mod condition;
pub mod descriptor;
pub mod editor;
pub mod error;
pub mod graph;
pub mod module;
pub mod post_function;
pub mod service;
pub mod validation;

pub use addressing::{resolve, DescriptorPath, NodeRef};
pub use condition::{ConditionGroup, ConditionNode};
pub use descriptor::Descriptor;
pub use editor::ConditionEditor;
pub use error::{AddressError, EditError, WorkflowError};
pub use graph::{Action, ActionResult, ResultTarget, Step, Workflow, WorkflowRef};
pub use module::{ModuleDescriptor, ModuleKind, ModuleRegistry, ModuleResolver};
pub use post_function::WeightResolver;
pub use service::WorkflowEditor;
