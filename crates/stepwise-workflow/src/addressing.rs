//! Dotted-path addressing of condition tree nodes.
//!
//! A path is a sequence of 1-based child indices starting below the root
//! group, so the root itself is the empty path `""`, its first child `"1"`,
//! and the second child of its third child `"3.2"`. The last segment is the
//! node's position among its siblings; the preceding segments locate the
//! parent chain. Resolution never clamps: an index past the end is an error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::condition::{ConditionGroup, ConditionNode};
use crate::descriptor::Descriptor;
use crate::error::AddressError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DescriptorPath(Vec<usize>);

impl DescriptorPath {
    /// The root group.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dotted path. The empty string is the root.
    pub fn parse(path: &str) -> Result<Self, AddressError> {
        if path.is_empty() {
            return Ok(Self::root());
        }
        let mut indices = Vec::new();
        for segment in path.split('.') {
            if segment.is_empty() {
                return Err(AddressError::MalformedPath {
                    path: path.to_string(),
                    reason: "empty segment".to_string(),
                });
            }
            let index: usize = segment.parse().map_err(|_| AddressError::MalformedPath {
                path: path.to_string(),
                reason: format!("'{}' is not a positive integer", segment),
            })?;
            if index == 0 {
                return Err(AddressError::MalformedPath {
                    path: path.to_string(),
                    reason: "indices start at 1".to_string(),
                });
            }
            indices.push(index);
        }
        Ok(Self(indices))
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Nesting depth; the root is 0.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Path of the containing group, `None` for the root.
    pub fn parent(&self) -> Option<DescriptorPath> {
        if self.is_root() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// 1-based position among siblings, `None` for the root.
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Path of the `index`-th (1-based) child of this node.
    pub fn child(&self, index: usize) -> DescriptorPath {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    fn prefix(&self, len: usize) -> DescriptorPath {
        Self(self.0[..len].to_vec())
    }
}

impl fmt::Display for DescriptorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", index)?;
        }
        Ok(())
    }
}

impl FromStr for DescriptorPath {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DescriptorPath {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<DescriptorPath> for String {
    fn from(path: DescriptorPath) -> Self {
        path.to_string()
    }
}

/// Borrowed view of a resolved node.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Group(&'a ConditionGroup),
    Leaf(&'a Descriptor),
}

/// Mutable view of a resolved node.
#[derive(Debug)]
pub enum NodeMut<'a> {
    Group(&'a mut ConditionGroup),
    Leaf(&'a mut Descriptor),
}

/// Walk `root` along `path`.
pub fn resolve<'a>(root: &'a ConditionGroup, path: &DescriptorPath) -> Result<NodeRef<'a>, AddressError> {
    let indices = path.indices();
    let mut current = root;
    for (depth, &index) in indices.iter().enumerate() {
        let child = index
            .checked_sub(1)
            .and_then(|i| current.children.get(i))
            .ok_or_else(|| AddressError::AddressOutOfRange {
                path: path.to_string(),
                index,
                len: current.children.len(),
            })?;
        match child {
            ConditionNode::Group(group) => current = group,
            ConditionNode::Leaf(leaf) => {
                if depth + 1 == indices.len() {
                    return Ok(NodeRef::Leaf(leaf));
                }
                return Err(AddressError::LeafNotTraversable {
                    path: path.prefix(depth + 1).to_string(),
                });
            }
        }
    }
    Ok(NodeRef::Group(current))
}

/// Mutable counterpart of [`resolve`].
pub fn resolve_mut<'a>(
    root: &'a mut ConditionGroup,
    path: &DescriptorPath,
) -> Result<NodeMut<'a>, AddressError> {
    let indices = path.indices();
    let mut current = root;
    for (depth, &index) in indices.iter().enumerate() {
        let len = current.children.len();
        let child = match index.checked_sub(1) {
            Some(i) if i < len => &mut current.children[i],
            _ => {
                return Err(AddressError::AddressOutOfRange {
                    path: path.to_string(),
                    index,
                    len,
                })
            }
        };
        match child {
            ConditionNode::Group(group) => current = group,
            ConditionNode::Leaf(leaf) => {
                if depth + 1 == indices.len() {
                    return Ok(NodeMut::Leaf(leaf));
                }
                return Err(AddressError::LeafNotTraversable {
                    path: path.prefix(depth + 1).to_string(),
                });
            }
        }
    }
    Ok(NodeMut::Group(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise_core::LogicOperator;

    fn leaf(name: &str) -> ConditionNode {
        ConditionNode::Leaf(Descriptor::class(name))
    }

    fn sample() -> ConditionGroup {
        // root: [ Group(OR, [a, b]), c ]
        ConditionGroup::new(
            LogicOperator::And,
            vec![
                ConditionNode::Group(ConditionGroup::new(LogicOperator::Or, vec![leaf("a"), leaf("b")])),
                leaf("c"),
            ],
        )
    }

    #[test]
    fn parse_and_display() {
        let path = DescriptorPath::parse("1.3.2").unwrap();
        assert_eq!(path.indices(), &[1, 3, 2]);
        assert_eq!(path.to_string(), "1.3.2");
        assert_eq!(path.last(), Some(2));
        assert_eq!(path.parent().unwrap().to_string(), "1.3");
        assert_eq!(path.depth(), 3);
    }

    #[test]
    fn empty_string_is_root() {
        let path = DescriptorPath::parse("").unwrap();
        assert!(path.is_root());
        assert_eq!(path.parent(), None);
        assert_eq!(path.to_string(), "");
        assert_eq!(path.child(4).to_string(), "4");
    }

    #[test]
    fn malformed_paths() {
        for bad in ["1..2", ".1", "1.", "a", "1.x", "0", "2.0", "-1", " 1"] {
            assert!(
                matches!(DescriptorPath::parse(bad), Err(AddressError::MalformedPath { .. })),
                "expected '{}' to be malformed",
                bad
            );
        }
    }

    #[test]
    fn resolves_leaf_and_group() {
        let tree = sample();
        match resolve(&tree, &"1".parse().unwrap()).unwrap() {
            NodeRef::Group(g) => assert_eq!(g.operator, LogicOperator::Or),
            NodeRef::Leaf(_) => panic!("expected group"),
        }
        match resolve(&tree, &"1.2".parse().unwrap()).unwrap() {
            NodeRef::Leaf(d) => assert_eq!(d.class_name(), Some("b")),
            NodeRef::Group(_) => panic!("expected leaf"),
        }
        assert!(matches!(resolve(&tree, &DescriptorPath::root()).unwrap(), NodeRef::Group(_)));
    }

    #[test]
    fn out_of_range_is_not_clamped() {
        let tree = sample();
        let err = resolve(&tree, &"3".parse().unwrap()).unwrap_err();
        assert_eq!(
            err,
            AddressError::AddressOutOfRange { path: "3".into(), index: 3, len: 2 }
        );
        let err = resolve(&tree, &"1.3".parse().unwrap()).unwrap_err();
        assert!(matches!(err, AddressError::AddressOutOfRange { index: 3, len: 2, .. }));
    }

    #[test]
    fn cannot_descend_through_leaf() {
        let mut tree = sample();
        let err = resolve(&tree, &"2.1".parse().unwrap()).unwrap_err();
        assert_eq!(err, AddressError::LeafNotTraversable { path: "2".into() });
        let err = resolve_mut(&mut tree, &"1.1.1".parse().unwrap()).unwrap_err();
        assert_eq!(err, AddressError::LeafNotTraversable { path: "1.1".into() });
    }

    #[test]
    fn resolve_mut_allows_in_place_change() {
        let mut tree = sample();
        if let NodeMut::Group(g) = resolve_mut(&mut tree, &"1".parse().unwrap()).unwrap() {
            g.operator = LogicOperator::And;
        }
        assert!(matches!(
            &tree.children[0],
            ConditionNode::Group(g) if g.operator == LogicOperator::And
        ));
    }

    #[test]
    fn serde_as_string() {
        let path: DescriptorPath = serde_json::from_str("\"2.1\"").unwrap();
        assert_eq!(path.indices(), &[2, 1]);
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"2.1\"");
        assert!(serde_json::from_str::<DescriptorPath>("\"2..1\"").is_err());
    }
}
