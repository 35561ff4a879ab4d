//! Host capability surfaces and their one-time resolution.
//!
//! The host exposes up to two surfaces to the page: one to subscribe to host
//! events and one to invoke host commands. Each may be published under the
//! current namespace, the legacy one, both or neither.

use common::BridgeResult;
use serde_json::{json, Value};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Handler run when a subscribed host event is delivered.
pub type HostEventHandler = Arc<dyn Fn() + Send + Sync>;

/// Host event subscription surface.
pub trait EventSurface: Send + Sync {
    /// Subscribe to a named host event.
    fn listen(&self, event: &str, handler: HostEventHandler) -> BridgeResult<()>;
}

/// Host command invocation surface.
pub trait InvokeSurface: Send + Sync {
    /// Invoke a host command with JSON arguments.
    fn invoke(&self, command: &str, args: Value) -> BridgeResult<Value>;
}

/// Namespace the host globals are published under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostNamespace {
    /// `__TAURI__`
    Current,
    /// `tauri`
    Legacy,
}

impl HostNamespace {
    /// Probe order.
    pub const ALL: [HostNamespace; 2] = [HostNamespace::Current, HostNamespace::Legacy];

    pub fn as_str(&self) -> &'static str {
        match self {
            HostNamespace::Current => "__TAURI__",
            HostNamespace::Legacy => "tauri",
        }
    }
}

/// The surfaces published under one namespace.
#[derive(Clone, Default)]
pub struct HostApi {
    pub event: Option<Arc<dyn EventSurface>>,
    pub invoke: Option<Arc<dyn InvokeSurface>>,
}

impl HostApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event(mut self, surface: Arc<dyn EventSurface>) -> Self {
        self.event = Some(surface);
        self
    }

    pub fn with_invoke(mut self, surface: Arc<dyn InvokeSurface>) -> Self {
        self.invoke = Some(surface);
        self
    }
}

/// The host globals visible to the page.
#[derive(Clone, Default)]
pub struct HostGlobals {
    current: Option<HostApi>,
    legacy: Option<HostApi>,
}

impl HostGlobals {
    /// No host at all.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_current(mut self, api: HostApi) -> Self {
        self.current = Some(api);
        self
    }

    pub fn with_legacy(mut self, api: HostApi) -> Self {
        self.legacy = Some(api);
        self
    }

    pub fn namespace(&self, namespace: HostNamespace) -> Option<&HostApi> {
        match namespace {
            HostNamespace::Current => self.current.as_ref(),
            HostNamespace::Legacy => self.legacy.as_ref(),
        }
    }
}

/// Surfaces found by probing the host globals once at startup.
#[derive(Clone, Default)]
pub struct HostCapabilities {
    event: Option<(HostNamespace, Arc<dyn EventSurface>)>,
    invoke: Option<(HostNamespace, Arc<dyn InvokeSurface>)>,
}

impl HostCapabilities {
    /// Probe current then legacy namespace; each surface takes the first hit.
    pub fn resolve(globals: &HostGlobals) -> Self {
        let event = HostNamespace::ALL.iter().find_map(|&ns| {
            let surface = globals.namespace(ns)?.event.clone()?;
            Some((ns, surface))
        });
        let invoke = HostNamespace::ALL.iter().find_map(|&ns| {
            let surface = globals.namespace(ns)?.invoke.clone()?;
            Some((ns, surface))
        });

        match &event {
            Some((ns, _)) => debug!(namespace = ns.as_str(), "host event surface resolved"),
            None => warn!("host event API not detected; thumbar events will not be received"),
        }
        match &invoke {
            Some((ns, _)) => debug!(namespace = ns.as_str(), "host invoke surface resolved"),
            None => debug!("host invoke API not detected; playing state will not be reported"),
        }

        Self { event, invoke }
    }

    pub fn event(&self) -> Option<&Arc<dyn EventSurface>> {
        self.event.as_ref().map(|(_, s)| s)
    }

    pub fn invoke(&self) -> Option<&Arc<dyn InvokeSurface>> {
        self.invoke.as_ref().map(|(_, s)| s)
    }

    pub fn event_namespace(&self) -> Option<HostNamespace> {
        self.event.as_ref().map(|(ns, _)| *ns)
    }

    pub fn invoke_namespace(&self) -> Option<HostNamespace> {
        self.invoke.as_ref().map(|(ns, _)| *ns)
    }

    /// Whether either surface is missing.
    pub fn is_degraded(&self) -> bool {
        self.event.is_none() || self.invoke.is_none()
    }
}

impl fmt::Debug for HostCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCapabilities")
            .field("event", &self.event_namespace())
            .field("invoke", &self.invoke_namespace())
            .finish()
    }
}

/// Reports the page's playing state to the host.
///
/// Never fails observably: a missing surface, a failed call or a panicking
/// surface is logged and counted, never retried. Release builds abort on
/// panic, so host surfaces must still not panic.
pub struct HostNotifier {
    invoke: Option<Arc<dyn InvokeSurface>>,
    command: String,
    warned_unavailable: AtomicBool,
    sent: AtomicUsize,
    failures: AtomicUsize,
}

impl HostNotifier {
    pub fn new(capabilities: &HostCapabilities, command: &str) -> Self {
        Self {
            invoke: capabilities.invoke().cloned(),
            command: command.to_string(),
            warned_unavailable: AtomicBool::new(false),
            sent: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    /// Tell the host whether the page is playing.
    pub fn notify_playing(&self, playing: bool) {
        let Some(invoke) = &self.invoke else {
            self.failures.fetch_add(1, Ordering::Relaxed);
            if !self.warned_unavailable.swap(true, Ordering::Relaxed) {
                warn!(playing, "host invoke API unavailable; dropping playing state");
            } else {
                debug!(playing, "host invoke API unavailable; dropping playing state");
            }
            return;
        };

        let args = json!({ "playing": playing });
        // A panic must not unwind into the media event dispatch that called us.
        let result = panic::catch_unwind(AssertUnwindSafe(|| invoke.invoke(&self.command, args)));
        match result {
            Ok(Ok(_)) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                debug!(playing, command = %self.command, "reported playing state");
            }
            Ok(Err(err)) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(playing, command = %self.command, error = %err, "host invoke failed");
            }
            Err(_) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(playing, command = %self.command, "host invoke panicked");
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.invoke.is_some()
    }

    /// Notifications delivered to the host.
    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }

    /// Notifications dropped or rejected.
    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for HostNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostNotifier")
            .field("available", &self.is_available())
            .field("command", &self.command)
            .field("sent", &self.sent_count())
            .field("failures", &self.failure_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::BridgeError;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, Value)>>,
        fail: bool,
    }

    impl InvokeSurface for Recorder {
        fn invoke(&self, command: &str, args: Value) -> BridgeResult<Value> {
            if self.fail {
                return Err(BridgeError::invoke("rejected"));
            }
            self.calls.lock().push((command.to_string(), args));
            Ok(Value::Null)
        }
    }

    impl EventSurface for Recorder {
        fn listen(&self, _event: &str, _handler: HostEventHandler) -> BridgeResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_resolve_prefers_current_namespace() {
        let current = Arc::new(Recorder::default());
        let legacy = Arc::new(Recorder::default());
        let globals = HostGlobals::new()
            .with_current(HostApi::new().with_invoke(current))
            .with_legacy(HostApi::new().with_event(legacy.clone()).with_invoke(legacy));

        let caps = HostCapabilities::resolve(&globals);
        assert_eq!(caps.invoke_namespace(), Some(HostNamespace::Current));
        // Each surface resolves independently.
        assert_eq!(caps.event_namespace(), Some(HostNamespace::Legacy));
        assert!(!caps.is_degraded());
    }

    #[test]
    fn test_resolve_nothing() {
        let caps = HostCapabilities::resolve(&HostGlobals::new());
        assert!(caps.event().is_none());
        assert!(caps.invoke().is_none());
        assert!(caps.is_degraded());
    }

    #[test]
    fn test_notifier_sends_playing_argument() {
        let recorder = Arc::new(Recorder::default());
        let globals = HostGlobals::new().with_current(HostApi::new().with_invoke(recorder.clone()));
        let notifier = HostNotifier::new(&HostCapabilities::resolve(&globals), "thumbar_set_playing");

        notifier.notify_playing(true);
        let calls = recorder.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "thumbar_set_playing");
        assert_eq!(calls[0].1, json!({ "playing": true }));
        assert_eq!(notifier.sent_count(), 1);
    }

    #[test]
    fn test_notifier_swallows_failures() {
        let failing = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let globals = HostGlobals::new().with_legacy(HostApi::new().with_invoke(failing));
        let notifier = HostNotifier::new(&HostCapabilities::resolve(&globals), "thumbar_set_playing");

        notifier.notify_playing(false);
        notifier.notify_playing(true);
        assert_eq!(notifier.failure_count(), 2);
        assert_eq!(notifier.sent_count(), 0);
    }

    #[test]
    fn test_notifier_without_surface() {
        let notifier = HostNotifier::new(&HostCapabilities::default(), "thumbar_set_playing");
        assert!(!notifier.is_available());
        notifier.notify_playing(true);
        notifier.notify_playing(false);
        assert_eq!(notifier.failure_count(), 2);
    }

    struct Panicking;

    impl InvokeSurface for Panicking {
        fn invoke(&self, _command: &str, _args: Value) -> BridgeResult<Value> {
            panic!("host surface crashed");
        }
    }

    #[test]
    fn test_notifier_contains_panicking_surface() {
        let globals = HostGlobals::new().with_current(HostApi::new().with_invoke(Arc::new(Panicking)));
        let notifier = HostNotifier::new(&HostCapabilities::resolve(&globals), "thumbar_set_playing");

        notifier.notify_playing(true);
        notifier.notify_playing(false);
        assert_eq!(notifier.failure_count(), 2);
        assert_eq!(notifier.sent_count(), 0);
    }
}
