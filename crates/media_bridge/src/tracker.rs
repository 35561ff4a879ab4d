//! Element Tracker: keeps a play/pause reaction pair attached to every media
//! element in the document.

use crate::host::HostNotifier;
use dom::{Document, Event, MutationRecord, NodeId, ListenerId};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// The reactions attached to one media element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registration {
    pub on_play: ListenerId,
    pub on_pause: ListenerId,
}

/// Tracks registrations in a side map; nothing is stored on the elements.
pub struct ElementTracker {
    registrations: IndexMap<NodeId, Registration>,
    notifier: Arc<HostNotifier>,
}

impl ElementTracker {
    pub fn new(notifier: Arc<HostNotifier>) -> Self {
        Self {
            registrations: IndexMap::new(),
            notifier,
        }
    }

    /// Register every media element already in the document.
    pub fn initialize(&mut self, document: &mut Document) -> usize {
        let existing = document.media_elements();
        let registered = existing
            .into_iter()
            .filter(|&node| self.register(document, node))
            .count();
        debug!(registered, "element tracker initialized");
        registered
    }

    /// Attach play/pause reactions and report the element's current state.
    ///
    /// Returns `false` without side effects if the element is already
    /// registered or is not a media element.
    pub fn register(&mut self, document: &mut Document, node: NodeId) -> bool {
        if self.registrations.contains_key(&node) {
            trace!(?node, "already registered");
            return false;
        }
        let Some(playing) = document.media(node).map(|m| m.is_playing()) else {
            debug!(?node, "not a media element; skipping registration");
            return false;
        };

        let on_play = {
            let notifier = self.notifier.clone();
            document.add_event_listener(node, "play", Arc::new(move |_: &mut Event| notifier.notify_playing(true)))
        };
        let on_pause = {
            let notifier = self.notifier.clone();
            document.add_event_listener(node, "pause", Arc::new(move |_: &mut Event| notifier.notify_playing(false)))
        };
        self.registrations.insert(node, Registration { on_play, on_pause });

        debug!(?node, playing, "media element registered");
        self.notifier.notify_playing(playing);
        true
    }

    /// Detach the reactions. A no-op for elements never registered.
    pub fn unregister(&mut self, document: &mut Document, node: NodeId) -> bool {
        let Some(registration) = self.registrations.shift_remove(&node) else {
            return false;
        };
        document.remove_event_listener(node, registration.on_play);
        document.remove_event_listener(node, registration.on_pause);

        debug!(?node, "media element unregistered");
        self.notifier.notify_playing(false);
        true
    }

    /// React to a batch of child-list mutations.
    ///
    /// Added subtrees are walked at delivery. Removals use the media captured
    /// in the record, since the subtree may have been rearranged since.
    pub fn handle_mutations(&mut self, document: &mut Document, records: &[MutationRecord]) {
        for record in records {
            for &added in &record.added_nodes {
                for node in document.media_in_subtree(added) {
                    self.register(document, node);
                }
            }
            for &node in &record.removed_media {
                self.unregister(document, node);
            }
        }
    }

    pub fn is_registered(&self, node: NodeId) -> bool {
        self.registrations.contains_key(&node)
    }

    pub fn registration(&self, node: NodeId) -> Option<&Registration> {
        self.registrations.get(&node)
    }

    pub fn registered_count(&self) -> usize {
        self.registrations.len()
    }

    /// Registered elements, oldest registration first.
    pub fn registered(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.registrations.keys().copied()
    }
}
