//! DOM Node implementation.

use crate::element::ElementData;
use slotmap::new_key_type;
use smallvec::SmallVec;

new_key_type! {
    /// Unique identifier for a DOM node.
    pub struct NodeId;
}

/// Type of DOM node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    Document = 9,
}

/// Data specific to each node type.
#[derive(Clone, Debug)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text { content: String },
}

/// A DOM node.
#[derive(Clone, Debug)]
pub struct Node {
    /// Unique identifier.
    pub id: NodeId,
    /// Node type.
    pub node_type: NodeType,
    /// Node-specific data.
    pub data: NodeData,
    /// Parent node.
    pub parent: Option<NodeId>,
    /// Child nodes.
    pub children: SmallVec<[NodeId; 8]>,
}

impl Node {
    pub fn new(id: NodeId, node_type: NodeType, data: NodeData) -> Self {
        Self {
            id,
            node_type,
            data,
            parent: None,
            children: SmallVec::new(),
        }
    }

    pub fn new_document(id: NodeId) -> Self {
        Self::new(id, NodeType::Document, NodeData::Document)
    }

    pub fn new_element(id: NodeId, data: ElementData) -> Self {
        Self::new(id, NodeType::Element, NodeData::Element(data))
    }

    pub fn new_text(id: NodeId, content: String) -> Self {
        Self::new(id, NodeType::Text, NodeData::Text { content })
    }

    /// Node name: `#text`, `#document` or the tag name.
    pub fn node_name(&self) -> &str {
        match &self.data {
            NodeData::Document => "#document",
            NodeData::Element(elem) => elem.tag_name.as_str(),
            NodeData::Text { .. } => "#text",
        }
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    #[inline]
    pub fn is_document(&self) -> bool {
        self.node_type == NodeType::Document
    }

    /// Get element data if this is an element.
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Get mutable element data if this is an element.
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Get text content if this is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text { content } => Some(content),
            _ => None,
        }
    }
}
