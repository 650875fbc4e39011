//! Structural edits on a transition restriction.
//!
//! Every operation takes the transition's current restriction
//! (`Option<ConditionGroup>`, absent meaning unconditional) and a dotted path.
//! Paths are validated and resolved before anything is changed, so an `Err`
//! always leaves the restriction as it was. Sibling indices shift after a
//! delete: callers must re-resolve any paths they held.
//!
//! A restriction the editor changes never holds an empty group: adds only
//! create groups with a child, deletes remove the groups they empty, and a
//! restriction that already holds one is refused with `EmptyGroup`.

use stepwise_core::LogicOperator;

use crate::addressing::{resolve, resolve_mut, DescriptorPath, NodeMut, NodeRef};
use crate::condition::{ConditionGroup, ConditionNode};
use crate::descriptor::Descriptor;
use crate::error::{AddressError, EditError};

/// Condition tree editor; the operator is the one given to groups it creates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEditor {
    pub default_operator: LogicOperator,
}

impl ConditionEditor {
    pub fn new(default_operator: LogicOperator) -> Self {
        Self { default_operator }
    }

    /// Append `leaf` as the last child of the group at `path`.
    ///
    /// On an absent restriction only the root path is valid; it creates the
    /// root group. Returns the path of the inserted leaf.
    pub fn add_condition(
        &self,
        restriction: &mut Option<ConditionGroup>,
        path: &str,
        leaf: Descriptor,
    ) -> Result<DescriptorPath, EditError> {
        let path = DescriptorPath::parse(path)?;
        let root = match restriction {
            Some(root) => root,
            None => return self.create_root(restriction, &path, leaf),
        };
        ensure_no_empty_group(root)?;
        let group = target_group_mut(root, &path, "cannot add a condition below a condition leaf")?;
        group.children.push(ConditionNode::Leaf(leaf));
        Ok(path.child(group.len()))
    }

    /// Append a new `Group(default_operator, [leaf])` to the group at `path`.
    ///
    /// On an absent restriction this is the same as [`Self::add_condition`]:
    /// the leaf goes straight into the newly created root. Returns the path of
    /// the inserted leaf.
    pub fn add_nested_condition(
        &self,
        restriction: &mut Option<ConditionGroup>,
        path: &str,
        leaf: Descriptor,
    ) -> Result<DescriptorPath, EditError> {
        let path = DescriptorPath::parse(path)?;
        let root = match restriction {
            Some(root) => root,
            None => return self.create_root(restriction, &path, leaf),
        };
        ensure_no_empty_group(root)?;
        let group = target_group_mut(root, &path, "cannot nest a condition below a condition leaf")?;
        group
            .children
            .push(ConditionNode::Group(ConditionGroup::with_leaf(self.default_operator, leaf)));
        Ok(path.child(group.len()).child(1))
    }

    fn create_root(
        &self,
        restriction: &mut Option<ConditionGroup>,
        path: &DescriptorPath,
        leaf: Descriptor,
    ) -> Result<DescriptorPath, EditError> {
        if let Some(&index) = path.indices().first() {
            return Err(AddressError::AddressOutOfRange {
                path: path.to_string(),
                index,
                len: 0,
            }
            .into());
        }
        *restriction = Some(ConditionGroup::with_leaf(self.default_operator, leaf));
        Ok(DescriptorPath::root().child(1))
    }

    /// Remove the node at `path` from its parent group and return it.
    ///
    /// A group emptied by the removal is removed from its own parent, up to
    /// the root; an emptied root makes the whole restriction absent.
    pub fn delete_condition(
        &self,
        restriction: &mut Option<ConditionGroup>,
        path: &str,
    ) -> Result<ConditionNode, EditError> {
        let path = DescriptorPath::parse(path)?;
        let root = match restriction {
            Some(root) if !path.is_root() => root,
            _ => return Err(EditError::NothingToDelete { path: path.to_string() }),
        };
        ensure_no_empty_group(root)?;

        let removed = match resolve(root, &path)? {
            NodeRef::Group(group) => ConditionNode::Group(group.clone()),
            NodeRef::Leaf(leaf) => ConditionNode::Leaf(leaf.clone()),
        };

        // Climb while the containing group would be left empty.
        let mut target = path.clone();
        while let Some(parent) = target.parent() {
            if parent.is_root() || group_len(root, &parent) != 1 {
                break;
            }
            target = parent;
        }

        if target.depth() == 1 && root.len() == 1 {
            *restriction = None;
            return Ok(removed);
        }

        let parent = target.parent().unwrap_or_default();
        let position = target.last().unwrap_or(1) - 1;
        let group = target_group_mut(root, &parent, "parent is not a group")?;
        group.children.remove(position);
        Ok(removed)
    }

    /// Flip AND/OR of the group at `path`; returns the new operator.
    pub fn change_logic_operator(
        &self,
        restriction: &mut Option<ConditionGroup>,
        path: &str,
    ) -> Result<LogicOperator, EditError> {
        let path = DescriptorPath::parse(path)?;
        let root = restriction.as_mut().ok_or(EditError::NoRestriction)?;
        ensure_no_empty_group(root)?;
        let group = target_group_mut(root, &path, "a condition leaf has no logic operator")?;
        group.operator = group.operator.toggled();
        Ok(group.operator)
    }

    /// The group one level above `path`.
    pub fn parent_group<'a>(
        &self,
        restriction: &'a Option<ConditionGroup>,
        path: &str,
    ) -> Result<&'a ConditionGroup, EditError> {
        let path = DescriptorPath::parse(path)?;
        let root = restriction.as_ref().ok_or(EditError::NoRestriction)?;
        let parent = path.parent().ok_or_else(|| EditError::InvalidAddress {
            path: path.to_string(),
            reason: "the root group has no parent".to_string(),
        })?;
        resolve(root, &path)?;
        match resolve(root, &parent)? {
            NodeRef::Group(group) => Ok(group),
            NodeRef::Leaf(_) => Err(EditError::InvalidAddress {
                path: parent.to_string(),
                reason: "parent is not a group".to_string(),
            }),
        }
    }

    /// Children of the group at `path`, each with its own path.
    pub fn conditions_at<'a>(
        &self,
        restriction: &'a Option<ConditionGroup>,
        path: &str,
    ) -> Result<Vec<(DescriptorPath, &'a ConditionNode)>, EditError> {
        let path = DescriptorPath::parse(path)?;
        let root = match restriction {
            Some(root) => root,
            None if path.is_root() => return Ok(Vec::new()),
            None => return Err(EditError::NoRestriction),
        };
        match resolve(root, &path)? {
            NodeRef::Group(group) => Ok(group
                .children
                .iter()
                .enumerate()
                .map(|(i, child)| (path.child(i + 1), child))
                .collect()),
            NodeRef::Leaf(_) => Err(EditError::InvalidAddress {
                path: path.to_string(),
                reason: "a condition leaf has no children".to_string(),
            }),
        }
    }
}

fn target_group_mut<'a>(
    root: &'a mut ConditionGroup,
    path: &DescriptorPath,
    leaf_reason: &str,
) -> Result<&'a mut ConditionGroup, EditError> {
    match resolve_mut(root, path)? {
        NodeMut::Group(group) => Ok(group),
        NodeMut::Leaf(_) => Err(EditError::InvalidAddress {
            path: path.to_string(),
            reason: leaf_reason.to_string(),
        }),
    }
}

fn ensure_no_empty_group(root: &ConditionGroup) -> Result<(), EditError> {
    match root.first_empty_group() {
        Some(path) => Err(EditError::EmptyGroup { path: path.to_string() }),
        None => Ok(()),
    }
}

fn group_len(root: &ConditionGroup, path: &DescriptorPath) -> usize {
    match resolve(root, path) {
        Ok(NodeRef::Group(group)) => group.len(),
        _ => 0,
    }
}
