//! DOM Document implementation.

use crate::element::{ElementData, TagName};
use crate::events::{Event, EventCallback, EventListenerOptions, EventManager, EventType, ListenerId};
use crate::mutation::MutationRecord;
use crate::node::NodeId;
use crate::tree::DomTree;
use browser_media::MediaElement;
use common::{BridgeError, BridgeResult};
use slotmap::SecondaryMap;
use tracing::{debug, trace};

/// DOM Document.
///
/// Owns the node tree, the listeners attached to its nodes, the playback state
/// of its media elements and the child-list mutations not yet delivered to
/// observers.
pub struct Document {
    /// The DOM tree.
    tree: DomTree,
    /// Event listeners.
    events: EventManager,
    /// Playback state for `<audio>`/`<video>` nodes.
    media: SecondaryMap<NodeId, MediaElement>,
    /// Mutations waiting for the next observer delivery.
    pending_mutations: Vec<MutationRecord>,
    /// Document element (<html>).
    document_element: Option<NodeId>,
    /// Head element.
    head: Option<NodeId>,
    /// Body element.
    body: Option<NodeId>,
}

impl Document {
    /// Create a document with an empty `<html><head></head><body></body></html>` skeleton.
    pub fn new() -> Self {
        let mut tree = DomTree::new();
        let root = tree.root();

        let html = tree.create_element(ElementData::new(TagName::html()));
        let head = tree.create_element(ElementData::new(TagName::head()));
        let body = tree.create_element(ElementData::new(TagName::body()));
        tree.append_child(root, html);
        tree.append_child(html, head);
        tree.append_child(html, body);

        Self {
            tree,
            events: EventManager::new(),
            media: SecondaryMap::new(),
            pending_mutations: Vec::new(),
            document_element: Some(html),
            head: Some(head),
            body: Some(body),
        }
    }

    /// Get the tree.
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Get the root document node.
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn document_element(&self) -> Option<NodeId> {
        self.document_element
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub fn body(&self) -> Option<NodeId> {
        self.body
    }

    /// Create a detached element by tag name.
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.create_element_with(ElementData::new(TagName::new(tag_name)))
    }

    /// Create a detached element. Media elements get fresh, paused playback state.
    pub fn create_element_with(&mut self, data: ElementData) -> NodeId {
        let is_media = data.is_media();
        let id = self.tree.create_element(data);
        if is_media {
            self.media.insert(id, MediaElement::new());
        }
        id
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.tree.create_text(content)
    }

    /// Get element data for a node.
    pub fn get_element(&self, node: NodeId) -> Option<&ElementData> {
        self.tree.get_element(node)
    }

    /// Append a child, moving it if it already has a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.insert_before(parent, child, None)
    }

    /// Insert a child before a reference child (append when `None`).
    ///
    /// Queues a removal record for the old parent and an addition record for
    /// the new one, each only if that parent is connected.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> bool {
        let removal = self.removal_record(child);

        if !self.tree.insert_before(parent, child, reference) {
            return false;
        }

        if let Some(record) = removal {
            self.queue_mutation(record);
        }
        if self.tree.is_connected(parent) {
            let record = MutationRecord::child_list(parent)
                .with_added(vec![child])
                .with_siblings(self.tree.prev_sibling(child), self.tree.next_sibling(child));
            self.queue_mutation(record);
        }
        true
    }

    /// Remove a node from its parent. The subtree stays alive, detached.
    ///
    /// Returns `false` if the node had no parent.
    pub fn remove(&mut self, node: NodeId) -> bool {
        let removal = self.removal_record(node);
        if self.tree.detach(node).is_none() {
            return false;
        }
        if let Some(record) = removal {
            self.queue_mutation(record);
        }
        true
    }

    /// The record describing `node` leaving a connected parent, if it has one.
    fn removal_record(&self, node: NodeId) -> Option<MutationRecord> {
        let parent = self.tree.parent(node)?;
        if !self.tree.is_connected(parent) {
            return None;
        }
        Some(
            MutationRecord::child_list(parent)
                .with_removed(vec![node])
                .with_removed_media(self.media_in_subtree(node))
                .with_siblings(self.tree.prev_sibling(node), self.tree.next_sibling(node)),
        )
    }

    fn queue_mutation(&mut self, record: MutationRecord) {
        trace!(
            added = record.added_nodes.len(),
            removed = record.removed_nodes.len(),
            "queued child list mutation"
        );
        self.pending_mutations.push(record);
    }

    /// Whether mutations are waiting for delivery.
    pub fn has_pending_mutations(&self) -> bool {
        !self.pending_mutations.is_empty()
    }

    /// Take all queued mutation records, oldest first.
    pub fn take_mutation_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.pending_mutations)
    }

    /// Set an attribute. Returns `false` if the node is not an element.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> bool {
        match self.tree.get_element_mut(node) {
            Some(elem) => {
                elem.set_attribute(name, value);
                true
            }
            None => false,
        }
    }

    /// Remove an attribute.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Option<String> {
        self.tree.get_element_mut(node)?.remove_attribute(name)
    }

    /// Playback state of a media element, attached or not.
    pub fn media(&self, node: NodeId) -> Option<&MediaElement> {
        self.media.get(node)
    }

    /// Connected media elements in document order.
    pub fn media_elements(&self) -> Vec<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .filter(|&id| self.media.contains_key(id))
            .collect()
    }

    /// The node itself if it is a media element, otherwise its media
    /// descendants in document order.
    pub fn media_in_subtree(&self, node: NodeId) -> Vec<NodeId> {
        if self.media.contains_key(node) {
            return vec![node];
        }
        self.tree
            .descendants(node)
            .filter(|&id| self.media.contains_key(id))
            .collect()
    }

    /// Request playback. Fires `play` only when leaving the paused state.
    ///
    /// Fails if the node is not a media element or playback is rejected.
    pub fn play(&mut self, node: NodeId) -> BridgeResult<bool> {
        let media = self.media_state(node)?;
        let started = media.play().map_err(|e| BridgeError::media(e.to_string()))?;
        if started {
            debug!(?node, "media play");
            self.fire(node, EventType::Play);
        }
        Ok(started)
    }

    /// Pause playback. Fires `pause` only when the element was playing.
    pub fn pause(&mut self, node: NodeId) -> BridgeResult<bool> {
        let paused = self.media_state(node)?.pause();
        if paused {
            debug!(?node, "media pause");
            self.fire(node, EventType::Pause);
        }
        Ok(paused)
    }

    /// Play to the end of the resource.
    ///
    /// A playing, non-looping element fires `pause` followed by `ended`.
    pub fn finish(&mut self, node: NodeId) -> BridgeResult<bool> {
        let media = self.media_state(node)?;
        let was_playing = media.is_playing();
        let ended = media.finish();
        if ended {
            if was_playing {
                self.fire(node, EventType::Pause);
            }
            self.fire(node, EventType::Ended);
        }
        Ok(ended)
    }

    fn media_state(&self, node: NodeId) -> BridgeResult<&MediaElement> {
        self.media
            .get(node)
            .ok_or_else(|| BridgeError::not_found(format!("no media element for {:?}", node)))
    }

    /// Synthetic activation: dispatch a bubbling `click`.
    ///
    /// Returns `false` when nothing was dispatched because the node is not an
    /// element or is a disabled form control.
    pub fn click(&mut self, node: NodeId) -> bool {
        match self.tree.get_element(node) {
            Some(elem) if !elem.is_disabled() => {}
            _ => return false,
        }
        self.fire(node, EventType::Click);
        true
    }

    fn fire(&mut self, node: NodeId, event_type: EventType) {
        let mut event = Event::trusted(event_type);
        self.dispatch_event(node, &mut event);
    }

    /// Dispatch an event at a node through its ancestor path.
    pub fn dispatch_event(&mut self, node: NodeId, event: &mut Event) -> bool {
        let ancestors: Vec<NodeId> = self.tree.ancestors(node).collect();
        self.events.dispatch(node, event, &ancestors)
    }

    /// Attach a listener to a node.
    pub fn add_event_listener(&mut self, node: NodeId, event_type: &str, callback: EventCallback) -> ListenerId {
        self.events
            .add_listener(node, event_type, callback, EventListenerOptions::default())
    }

    /// Detach exactly one listener. Returns `false` if it was not attached.
    pub fn remove_event_listener(&mut self, node: NodeId, id: ListenerId) -> bool {
        self.events.remove_listener(node, id)
    }

    /// Number of listeners of a type on a node.
    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.events.listener_count(node, event_type)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
