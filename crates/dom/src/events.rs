//! DOM Events implementation.

use crate::node::NodeId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Event type enumeration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    Play,
    Pause,
    Ended,
    Custom(String),
}

impl EventType {
    pub fn from_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "click" => EventType::Click,
            "play" => EventType::Play,
            "pause" => EventType::Pause,
            "ended" => EventType::Ended,
            other => EventType::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventType::Click => "click",
            EventType::Play => "play",
            EventType::Pause => "pause",
            EventType::Ended => "ended",
            EventType::Custom(s) => s,
        }
    }

    /// Check if event bubbles by default. Media events do not.
    pub fn bubbles(&self) -> bool {
        !matches!(self, EventType::Play | EventType::Pause | EventType::Ended)
    }

    /// Check if event is cancelable by default.
    pub fn cancelable(&self) -> bool {
        matches!(self, EventType::Click)
    }
}

/// Event phase. Listeners only run at the target and while bubbling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPhase {
    None = 0,
    AtTarget = 2,
    Bubbling = 3,
}

/// DOM Event.
#[derive(Clone, Debug)]
pub struct Event {
    /// Event type.
    pub event_type: EventType,
    /// Target element.
    pub target: Option<NodeId>,
    /// Current target during propagation.
    pub current_target: Option<NodeId>,
    /// Event phase.
    pub phase: EventPhase,
    /// Whether event bubbles.
    pub bubbles: bool,
    /// Whether event is cancelable.
    pub cancelable: bool,
    /// Whether default was prevented.
    pub default_prevented: bool,
    /// Whether event is trusted (user agent generated).
    pub is_trusted: bool,
    /// Timestamp in milliseconds.
    pub timestamp: f64,
}

impl Event {
    pub fn new(event_type: EventType) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
            * 1000.0;

        let bubbles = event_type.bubbles();
        let cancelable = event_type.cancelable();

        Self {
            event_type,
            target: None,
            current_target: None,
            phase: EventPhase::None,
            bubbles,
            cancelable,
            default_prevented: false,
            is_trusted: false,
            timestamp,
        }
    }

    /// Event fired by the user agent itself (media state changes).
    pub fn trusted(event_type: EventType) -> Self {
        let mut event = Self::new(event_type);
        event.is_trusted = true;
        event
    }

    /// Prevent default action.
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }
}

/// Event listener callback type.
pub type EventCallback = Arc<dyn Fn(&mut Event) + Send + Sync>;

/// Handle returned when a listener is added; removes exactly that listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Event listener options.
#[derive(Clone, Debug, Default)]
pub struct EventListenerOptions {
    pub once: bool,
}

/// Event listener.
#[derive(Clone)]
struct EventListener {
    id: ListenerId,
    callback: EventCallback,
    options: EventListenerOptions,
}

/// Event manager for handling event dispatch.
pub struct EventManager {
    /// Listeners by node and event type.
    listeners: HashMap<NodeId, HashMap<String, Vec<EventListener>>>,
    /// Listener ID counter.
    next_id: u64,
}

impl EventManager {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            next_id: 0,
        }
    }

    /// Add event listener for a node.
    pub fn add_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        callback: EventCallback,
        options: EventListenerOptions,
    ) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);

        self.listeners
            .entry(node)
            .or_default()
            .entry(event_type.to_string())
            .or_default()
            .push(EventListener {
                id,
                callback,
                options,
            });
        id
    }

    /// Remove one listener. Returns `false` if it was not registered.
    pub fn remove_listener(&mut self, node: NodeId, id: ListenerId) -> bool {
        let Some(node_listeners) = self.listeners.get_mut(&node) else {
            return false;
        };

        let mut removed = false;
        for type_listeners in node_listeners.values_mut() {
            let before = type_listeners.len();
            type_listeners.retain(|l| l.id != id);
            removed |= type_listeners.len() != before;
        }
        node_listeners.retain(|_, l| !l.is_empty());
        if node_listeners.is_empty() {
            self.listeners.remove(&node);
        }
        removed
    }

    /// Number of listeners for a node and event type.
    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.listeners
            .get(&node)
            .and_then(|n| n.get(event_type))
            .map(|l| l.len())
            .unwrap_or(0)
    }

    /// Dispatch event to target.
    ///
    /// `ancestors` lists the target's ancestors, nearest first. Returns `false`
    /// if the default action was prevented.
    pub fn dispatch(&mut self, target: NodeId, event: &mut Event, ancestors: &[NodeId]) -> bool {
        event.target = Some(target);

        event.phase = EventPhase::AtTarget;
        event.current_target = Some(target);
        self.invoke_listeners(target, event);

        if event.bubbles {
            event.phase = EventPhase::Bubbling;
            for &node in ancestors {
                event.current_target = Some(node);
                self.invoke_listeners(node, event);
            }
        }

        event.phase = EventPhase::None;
        event.current_target = None;
        !event.default_prevented
    }

    fn invoke_listeners(&mut self, node: NodeId, event: &mut Event) {
        let event_type = event.event_type.as_str().to_string();

        // Snapshot so listeners added or removed during dispatch do not affect it.
        let snapshot: Vec<EventListener> = self
            .listeners
            .get(&node)
            .and_then(|n| n.get(&event_type))
            .cloned()
            .unwrap_or_default();

        for listener in &snapshot {
            (listener.callback)(event);
            if listener.options.once {
                self.remove_listener(node, listener.id);
            }
        }
    }

    /// Remove all listeners for a node.
    pub fn remove_all(&mut self, node: NodeId) {
        self.listeners.remove(&node);
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn node_ids(count: usize) -> Vec<NodeId> {
        let mut map: SlotMap<NodeId, ()> = SlotMap::with_key();
        (0..count).map(|_| map.insert(())).collect()
    }

    fn counter() -> (Arc<AtomicUsize>, EventCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (count, Arc::new(move |_event: &mut Event| {
            c.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_event_creation() {
        let event = Event::new(EventType::Click);
        assert!(event.bubbles);
        assert!(event.cancelable);

        let play = Event::trusted(EventType::Play);
        assert!(!play.bubbles);
        assert!(play.is_trusted);
    }

    #[test]
    fn test_event_type_from_str() {
        assert_eq!(EventType::from_str("PLAY"), EventType::Play);
        assert_eq!(
            EventType::from_str("thumbar-playpause"),
            EventType::Custom("thumbar-playpause".to_string())
        );
    }

    #[test]
    fn test_remove_exact_listener() {
        let ids = node_ids(1);
        let mut manager = EventManager::new();
        let (first_count, first) = counter();
        let (second_count, second) = counter();

        let first_id = manager.add_listener(ids[0], "play", first, Default::default());
        manager.add_listener(ids[0], "play", second, Default::default());
        assert!(manager.remove_listener(ids[0], first_id));
        assert!(!manager.remove_listener(ids[0], first_id));

        let mut event = Event::trusted(EventType::Play);
        manager.dispatch(ids[0], &mut event, &[]);
        assert_eq!(first_count.load(Ordering::SeqCst), 0);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bubbling_reaches_ancestors() {
        let ids = node_ids(2);
        let (target, parent) = (ids[0], ids[1]);
        let mut manager = EventManager::new();
        let (count, callback) = counter();
        manager.add_listener(parent, "click", callback.clone(), Default::default());

        let mut click = Event::new(EventType::Click);
        manager.dispatch(target, &mut click, &[parent]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(click.target, Some(target));
        assert_eq!(click.phase, EventPhase::None);

        // Media events do not bubble.
        manager.add_listener(parent, "play", callback, Default::default());
        let mut play = Event::trusted(EventType::Play);
        manager.dispatch(target, &mut play, &[parent]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_once_listener() {
        let ids = node_ids(1);
        let mut manager = EventManager::new();
        let (count, callback) = counter();
        let options = EventListenerOptions {
            once: true,
            ..Default::default()
        };
        manager.add_listener(ids[0], "click", callback, options);

        for _ in 0..2 {
            let mut event = Event::new(EventType::Click);
            manager.dispatch(ids[0], &mut event, &[]);
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(manager.listener_count(ids[0], "click"), 0);
    }

    #[test]
    fn test_prevent_default() {
        let ids = node_ids(1);
        let mut manager = EventManager::new();
        manager.add_listener(
            ids[0],
            "click",
            Arc::new(|event: &mut Event| event.prevent_default()),
            Default::default(),
        );

        let mut event = Event::new(EventType::Click);
        assert!(!manager.dispatch(ids[0], &mut event, &[]));
    }
}
