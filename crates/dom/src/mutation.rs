//! Structural mutation records.

use crate::node::NodeId;

/// A child-list mutation: nodes added to or removed from `target`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRecord {
    /// Parent whose children changed.
    pub target: NodeId,
    /// Added nodes.
    pub added_nodes: Vec<NodeId>,
    /// Removed nodes.
    pub removed_nodes: Vec<NodeId>,
    /// Media elements inside the removed subtrees when they were removed.
    pub removed_media: Vec<NodeId>,
    /// Previous sibling of the changed nodes.
    pub previous_sibling: Option<NodeId>,
    /// Next sibling of the changed nodes.
    pub next_sibling: Option<NodeId>,
}

impl MutationRecord {
    /// Create an empty child list mutation record.
    pub fn child_list(target: NodeId) -> Self {
        Self {
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            removed_media: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
        }
    }

    pub fn with_added(mut self, nodes: Vec<NodeId>) -> Self {
        self.added_nodes = nodes;
        self
    }

    pub fn with_removed(mut self, nodes: Vec<NodeId>) -> Self {
        self.removed_nodes = nodes;
        self
    }

    pub fn with_removed_media(mut self, nodes: Vec<NodeId>) -> Self {
        self.removed_media = nodes;
        self
    }

    pub fn with_siblings(mut self, previous: Option<NodeId>, next: Option<NodeId>) -> Self {
        self.previous_sibling = previous;
        self.next_sibling = next;
        self
    }
}
