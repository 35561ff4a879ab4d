//! DOM Tree implementation.

use crate::element::ElementData;
use crate::node::{Node, NodeData, NodeId};
use slotmap::SlotMap;

/// Elements whose text never renders.
const NON_RENDERED_TAGS: &[&str] = &["script", "style", "template", "noscript"];

/// The DOM tree structure.
///
/// Detached nodes stay in the arena so that a removed subtree can still be
/// inspected (mutation observers traverse removed nodes).
pub struct DomTree {
    /// All nodes, attached or not.
    nodes: SlotMap<NodeId, Node>,
    /// Root node (document).
    root: NodeId,
}

impl DomTree {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert_with_key(Node::new_document);
        Self { nodes, root }
    }

    /// Get the root document node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a mutable node by ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Get element data for a node.
    pub fn get_element(&self, id: NodeId) -> Option<&ElementData> {
        self.nodes.get(id).and_then(|n| n.as_element())
    }

    /// Get mutable element data for a node.
    pub fn get_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.nodes.get_mut(id).and_then(|n| n.as_element_mut())
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, data: ElementData) -> NodeId {
        self.nodes.insert_with_key(|id| Node::new_element(id, data))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.nodes
            .insert_with_key(|id| Node::new_text(id, content.to_string()))
    }

    /// Append a child, detaching it from its old parent first.
    ///
    /// Returns `false` (and changes nothing) when either node is unknown, the
    /// parent cannot have children, or the insertion would create a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.insert_before(parent, child, None)
    }

    /// Insert a child before a reference child (append when `None`).
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> bool {
        if !self.can_insert(parent, child) {
            return false;
        }
        if let Some(reference) = reference {
            if reference == child || self.parent(reference) != Some(parent) {
                return false;
            }
        }

        self.detach(child);

        let Some(parent_node) = self.nodes.get_mut(parent) else {
            return false;
        };
        let position = reference
            .and_then(|r| parent_node.children.iter().position(|&id| id == r))
            .unwrap_or(parent_node.children.len());
        parent_node.children.insert(position, child);

        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = Some(parent);
        }
        true
    }

    fn can_insert(&self, parent: NodeId, child: NodeId) -> bool {
        let (Some(parent_node), Some(child_node)) = (self.nodes.get(parent), self.nodes.get(child))
        else {
            return false;
        };
        if child_node.is_document() || !matches!(parent_node.data, NodeData::Element(_) | NodeData::Document) {
            return false;
        }
        !self.contains(child, parent)
    }

    /// Detach a node from its parent. The subtree stays intact.
    ///
    /// Returns the old parent.
    pub fn detach(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(node)?.parent?;

        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|id| *id != node);
        }
        if let Some(node_data) = self.nodes.get_mut(node) {
            node_data.parent = None;
        }
        Some(parent)
    }

    /// Get parent node.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    /// Get first child.
    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.children.first().copied())
    }

    /// Get previous sibling.
    pub fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        let siblings = &self.nodes.get(self.parent(node)?)?.children;
        let index = siblings.iter().position(|&id| id == node)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    /// Get next sibling.
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let siblings = &self.nodes.get(self.parent(node)?)?.children;
        let index = siblings.iter().position(|&id| id == node)?;
        siblings.get(index + 1).copied()
    }

    /// Get all children.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(node)
            .into_iter()
            .flat_map(|n| n.children.iter().copied())
    }

    /// Get ancestors, nearest first.
    pub fn ancestors(&self, node: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(node),
        }
    }

    /// Get descendants in document order (pre-order), excluding `node`.
    pub fn descendants(&self, node: NodeId) -> DescendantIterator<'_> {
        let mut stack = Vec::new();
        if let Some(n) = self.nodes.get(node) {
            stack.extend(n.children.iter().rev().copied());
        }
        DescendantIterator { tree: self, stack }
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Whether the node is attached to the document.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node) && self.contains(self.root, node)
    }

    /// Find a connected element by ID.
    pub fn find_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root).find(|&node| {
            self.get_element(node)
                .and_then(|e| e.id.as_deref())
                .map(|v| v == id)
                .unwrap_or(false)
        })
    }

    /// Get the text a user would see: descendant text, skipping non-rendered
    /// elements and subtrees marked `hidden`.
    pub fn visible_text(&self, node: NodeId) -> String {
        let mut result = String::new();
        self.collect_visible_text(node, &mut result);
        result
    }

    fn collect_visible_text(&self, node: NodeId, result: &mut String) {
        let Some(node_data) = self.nodes.get(node) else {
            return;
        };
        match &node_data.data {
            NodeData::Text { content } => result.push_str(content),
            NodeData::Element(elem) => {
                if elem.is_hidden() || NON_RENDERED_TAGS.contains(&elem.tag_name.as_str()) {
                    return;
                }
                for &child in &node_data.children {
                    self.collect_visible_text(child, result);
                }
            }
            NodeData::Document => {
                for &child in &node_data.children {
                    self.collect_visible_text(child, result);
                }
            }
        }
    }

    /// Get total number of nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the document has no children.
    pub fn is_empty(&self) -> bool {
        self.first_child(self.root).is_none()
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestor nodes.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl<'a> Iterator for AncestorIterator<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.tree.parent(current);
        Some(current)
    }
}

/// Iterator over descendant nodes (pre-order traversal).
pub struct DescendantIterator<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DescendantIterator<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        if let Some(node) = self.tree.nodes.get(current) {
            self.stack.extend(node.children.iter().rev().copied());
        }

        Some(current)
    }
}
