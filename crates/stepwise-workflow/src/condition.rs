use serde::{Deserialize, Serialize};

use stepwise_core::LogicOperator;

use crate::addressing::DescriptorPath;
use crate::descriptor::Descriptor;

/// One node of a transition restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum ConditionNode {
    /// A single condition (`<condition>` element).
    Leaf(Descriptor),
    /// A nested block (`<conditions type="AND|OR">` element).
    Group(ConditionGroup),
}

impl ConditionNode {
    pub fn is_group(&self) -> bool {
        matches!(self, ConditionNode::Group(_))
    }

    pub fn as_group(&self) -> Option<&ConditionGroup> {
        match self {
            ConditionNode::Group(group) => Some(group),
            ConditionNode::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Descriptor> {
        match self {
            ConditionNode::Leaf(leaf) => Some(leaf),
            ConditionNode::Group(_) => None,
        }
    }
}

/// AND/OR block of conditions. The restriction of a transition is always a
/// group at its root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub operator: LogicOperator,
    #[serde(default)]
    pub children: Vec<ConditionNode>,
}

impl ConditionGroup {
    pub fn new(operator: LogicOperator, children: Vec<ConditionNode>) -> Self {
        Self { operator, children }
    }

    /// Group holding exactly one leaf.
    pub fn with_leaf(operator: LogicOperator, leaf: Descriptor) -> Self {
        Self::new(operator, vec![ConditionNode::Leaf(leaf)])
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth-first, left-to-right listing of every node below this group with
    /// its path relative to this group.
    pub fn walk(&self) -> Vec<(DescriptorPath, &ConditionNode)> {
        let mut out = Vec::new();
        self.walk_into(&DescriptorPath::root(), &mut out);
        out
    }

    fn walk_into<'a>(&'a self, base: &DescriptorPath, out: &mut Vec<(DescriptorPath, &'a ConditionNode)>) {
        for (i, child) in self.children.iter().enumerate() {
            let path = base.child(i + 1);
            out.push((path.clone(), child));
            if let ConditionNode::Group(group) = child {
                group.walk_into(&path, out);
            }
        }
    }

    /// Number of leaves in the whole subtree.
    pub fn leaf_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                ConditionNode::Leaf(_) => 1,
                ConditionNode::Group(group) => group.leaf_count(),
            })
            .sum()
    }

    /// Path of the first group with no children, the root included.
    pub fn first_empty_group(&self) -> Option<DescriptorPath> {
        if self.is_empty() {
            return Some(DescriptorPath::root());
        }
        self.walk()
            .into_iter()
            .find(|(_, node)| node.as_group().is_some_and(ConditionGroup::is_empty))
            .map(|(path, _)| path)
    }

    /// This group with every empty nested group removed, bottom-up, so a
    /// group emptied by the removal goes too. `None` when nothing is left.
    pub fn pruned(&self) -> Option<ConditionGroup> {
        let children: Vec<ConditionNode> = self
            .children
            .iter()
            .filter_map(|child| match child {
                ConditionNode::Leaf(leaf) => Some(ConditionNode::Leaf(leaf.clone())),
                ConditionNode::Group(group) => group.pruned().map(ConditionNode::Group),
            })
            .collect();
        if children.is_empty() {
            None
        } else {
            Some(ConditionGroup::new(self.operator, children))
        }
    }

    /// Canonical form for the serialized descriptor.
    ///
    /// Inside every block nested `conditions` precede `condition` leaves
    /// (relative order kept within each kind), empty nested blocks are
    /// dropped, and a nested block left with a single child is replaced by
    /// that child. A root with a single nested block adopts that block.
    pub fn normalized(&self) -> ConditionGroup {
        let mut root = self.normalize_children();
        while root.children.len() == 1 && root.children[0].is_group() {
            match root.children.pop() {
                Some(ConditionNode::Group(inner)) => root = inner,
                Some(leaf) => root.children.push(leaf),
                None => break,
            }
        }
        root
    }

    fn normalize_children(&self) -> ConditionGroup {
        let mut groups = Vec::new();
        let mut leaves = Vec::new();
        for child in &self.children {
            match child {
                ConditionNode::Leaf(leaf) => leaves.push(ConditionNode::Leaf(leaf.clone())),
                ConditionNode::Group(group) => {
                    let mut inner = group.normalize_children();
                    match inner.children.len() {
                        0 => {}
                        1 => match inner.children.pop() {
                            Some(ConditionNode::Leaf(leaf)) => leaves.push(ConditionNode::Leaf(leaf)),
                            Some(nested) => groups.push(nested),
                            None => {}
                        },
                        _ => groups.push(ConditionNode::Group(inner)),
                    }
                }
            }
        }
        groups.extend(leaves);
        ConditionGroup::new(self.operator, groups)
    }
}
