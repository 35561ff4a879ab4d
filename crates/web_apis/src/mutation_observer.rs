//! Mutation Observer API implementation.

use dom::mutation::MutationRecord;
use dom::node::NodeId;
use dom::tree::DomTree;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Invalid `observe()` options.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ObserveError {
    #[error("at least one of childList, attributes, or characterData must be true")]
    NothingObserved,
    #[error("attributeOldValue requires attributes to be true")]
    AttributeOldValueWithoutAttributes,
    #[error("characterDataOldValue requires characterData to be true")]
    CharacterDataOldValueWithoutCharacterData,
}

/// Mutation Observer.
///
/// Records are collected from the document's pending mutations and held until
/// the owner takes them.
#[derive(Debug)]
pub struct MutationObserver {
    /// Observer ID.
    id: u64,
    /// Observed targets and their options.
    targets: Vec<(NodeId, MutationObserverInit)>,
    /// Pending mutation records.
    pending_records: VecDeque<MutationRecord>,
}

impl MutationObserver {
    /// Create a new Mutation Observer.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);

        Self {
            id: COUNTER.fetch_add(1, Ordering::Relaxed),
            targets: Vec::new(),
            pending_records: VecDeque::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Observe a target node, replacing any earlier options for it.
    pub fn observe(&mut self, target: NodeId, options: MutationObserverInit) -> Result<(), ObserveError> {
        if !options.child_list && !options.attributes && !options.character_data {
            return Err(ObserveError::NothingObserved);
        }

        if options.attribute_old_value && !options.attributes {
            return Err(ObserveError::AttributeOldValueWithoutAttributes);
        }

        if options.character_data_old_value && !options.character_data {
            return Err(ObserveError::CharacterDataOldValueWithoutCharacterData);
        }

        self.targets.retain(|(t, _)| *t != target);
        self.targets.push((target, options));

        Ok(())
    }

    /// Stop observing all targets and drop pending records.
    pub fn disconnect(&mut self) {
        self.targets.clear();
        self.pending_records.clear();
    }

    /// Take pending records.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.pending_records.drain(..).collect()
    }

    /// Queue a mutation record.
    pub fn queue_record(&mut self, record: MutationRecord) {
        self.pending_records.push_back(record);
    }

    /// Queue the records this observer is interested in. Returns how many were kept.
    pub fn collect<I>(&mut self, tree: &DomTree, records: I) -> usize
    where
        I: IntoIterator<Item = MutationRecord>,
    {
        let mut kept = 0;
        for record in records {
            if self.is_interested(tree, &record) {
                self.queue_record(record);
                kept += 1;
            }
        }
        kept
    }

    fn is_interested(&self, tree: &DomTree, record: &MutationRecord) -> bool {
        self.targets.iter().any(|(target, options)| {
            if !options.child_list {
                return false;
            }
            *target == record.target || (options.subtree && tree.contains(*target, record.target))
        })
    }

    /// Check if the observer is observing a target.
    pub fn is_observing(&self, target: NodeId) -> bool {
        self.targets.iter().any(|(t, _)| *t == target)
    }

    /// Get options for a target.
    pub fn get_options(&self, target: NodeId) -> Option<&MutationObserverInit> {
        self.targets.iter().find(|(t, _)| *t == target).map(|(_, o)| o)
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        !self.targets.is_empty()
    }
}

impl Default for MutationObserver {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutation observer initialization options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MutationObserverInit {
    /// Observe child list changes.
    pub child_list: bool,
    /// Observe attribute changes.
    pub attributes: bool,
    /// Observe character data changes.
    pub character_data: bool,
    /// Observe entire subtree.
    pub subtree: bool,
    /// Record old attribute values.
    pub attribute_old_value: bool,
    /// Record old character data values.
    pub character_data_old_value: bool,
}

impl MutationObserverInit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child_list(mut self) -> Self {
        self.child_list = true;
        self
    }

    pub fn attributes(mut self) -> Self {
        self.attributes = true;
        self
    }

    pub fn character_data(mut self) -> Self {
        self.character_data = true;
        self
    }

    pub fn subtree(mut self) -> Self {
        self.subtree = true;
        self
    }
}
