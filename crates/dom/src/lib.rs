//! DOM (Document Object Model) implementation.
//!
//! This crate provides the document the thumbar bridge runs against: the node
//! tree, media element state, event dispatch and structural mutation records.

pub mod attributes;
pub mod document;
pub mod element;
pub mod events;
pub mod mutation;
pub mod node;
pub mod tree;

pub use attributes::AttributeMap;
pub use document::Document;
pub use element::{ElementData, TagName};
pub use events::{Event, EventCallback, EventManager, EventPhase, EventType, ListenerId};
pub use mutation::MutationRecord;
pub use node::{Node, NodeData, NodeId, NodeType};
pub use tree::DomTree;
