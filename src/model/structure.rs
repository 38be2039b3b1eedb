//! Accessibility structure tree nodes.

use serde::{Deserialize, Serialize};

/// One node of a PDF structure tree.
///
/// Built by the parser from `/S` and `/K`; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructNode {
    /// Structure type (`/S`), e.g. "Document", "H1", "P"
    pub tag: Option<String>,
    /// What `/K` held
    pub kids: StructKids,
}

/// The child entry of a structure node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructKids {
    /// No `/K` entry at all
    Absent,
    /// Nested structure elements
    Nodes(Vec<StructNode>),
    /// Terminal content (marked-content id, text)
    Content(String),
}

impl StructNode {
    /// A node without a `/K` entry.
    pub fn leaf(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            kids: StructKids::Absent,
        }
    }

    /// A node with nested children.
    pub fn with_children(tag: impl Into<String>, children: Vec<StructNode>) -> Self {
        Self {
            tag: Some(tag.into()),
            kids: StructKids::Nodes(children),
        }
    }

    /// A node holding terminal content.
    pub fn with_content(tag: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            kids: StructKids::Content(content.into()),
        }
    }

    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        match &self.kids {
            StructKids::Nodes(children) => 1 + children.iter().map(|c| c.node_count()).sum::<usize>(),
            StructKids::Absent | StructKids::Content(_) => 1,
        }
    }

    /// Depth of this subtree (a lone node has depth 1).
    pub fn depth(&self) -> usize {
        match &self.kids {
            StructKids::Nodes(children) => {
                1 + children.iter().map(|c| c.depth()).max().unwrap_or(0)
            }
            StructKids::Absent | StructKids::Content(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let tree = StructNode::with_children(
            "Document",
            vec![
                StructNode::with_content("H1", "0"),
                StructNode::with_children("L", vec![StructNode::leaf("LI")]),
            ],
        );
        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.depth(), 3);
        assert_eq!(StructNode::leaf("P").depth(), 1);
    }
}
