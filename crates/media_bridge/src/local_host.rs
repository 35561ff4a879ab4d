//! In-process host: delivers thumbar button presses to the page and keeps the
//! "now playing" indicator state reported back by it.

use crate::config::BridgeConfig;
use crate::host::{EventSurface, HostApi, HostEventHandler, InvokeSurface};
use browser_media::{MediaSession, MediaSessionPlaybackState};
use common::{BridgeError, BridgeResult};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Notification code carried in the high word of a thumb button `WM_COMMAND`.
pub const THBN_CLICKED: u16 = 0x1800;

/// Thumbar button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThumbButton {
    Previous = 100,
    PlayPause = 101,
    Next = 102,
}

impl ThumbButton {
    /// Buttons in toolbar order.
    pub const ALL: [ThumbButton; 3] = [ThumbButton::Previous, ThumbButton::PlayPause, ThumbButton::Next];

    pub fn id(self) -> u16 {
        self as u16
    }

    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            100 => Some(ThumbButton::Previous),
            101 => Some(ThumbButton::PlayPause),
            102 => Some(ThumbButton::Next),
            _ => None,
        }
    }

    /// Decode a `WM_COMMAND` wparam: low word is the button id, high word the
    /// notification code.
    pub fn from_command(wparam: usize) -> Option<Self> {
        let id = (wparam & 0xffff) as u16;
        let code = ((wparam >> 16) & 0xffff) as u16;
        if code != THBN_CLICKED {
            return None;
        }
        Self::from_id(id)
    }

    /// The `WM_COMMAND` wparam a click on this button produces.
    pub fn to_command(self) -> usize {
        ((THBN_CLICKED as usize) << 16) | self.id() as usize
    }

    pub fn tooltip(self) -> &'static str {
        match self {
            ThumbButton::Previous => "Prev",
            ThumbButton::PlayPause => "Play/Pause",
            ThumbButton::Next => "Next",
        }
    }

    /// The host event this button emits.
    pub fn event_name(self, config: &BridgeConfig) -> &str {
        match self {
            ThumbButton::Previous => &config.previous_event,
            ThumbButton::PlayPause => &config.toggle_event,
            ThumbButton::Next => &config.next_event,
        }
    }
}

/// A recorded host command invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct InvokeCall {
    pub command: String,
    pub args: Value,
}

/// Host implementation living in the same process as the page.
pub struct LocalHost {
    handlers: RwLock<HashMap<String, Vec<HostEventHandler>>>,
    calls: Mutex<Vec<InvokeCall>>,
    session: MediaSession,
    playing_command: String,
    fail_invocations: AtomicBool,
}

impl LocalHost {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            session: MediaSession::new(),
            playing_command: config.playing_command.clone(),
            fail_invocations: AtomicBool::new(false),
        }
    }

    /// Both surfaces of this host, ready to publish under a namespace.
    pub fn api(self: &Arc<Self>) -> HostApi {
        HostApi::new()
            .with_event(self.clone())
            .with_invoke(self.clone())
    }

    /// Deliver an event to every handler subscribed to it. Returns how many ran.
    pub fn emit(&self, event: &str) -> usize {
        // Handlers run outside the lock so they may subscribe or emit.
        let handlers: Vec<HostEventHandler> = self
            .handlers
            .read()
            .get(event)
            .cloned()
            .unwrap_or_default();

        trace!(event, handlers = handlers.len(), "emitting host event");
        for handler in &handlers {
            handler();
        }
        handlers.len()
    }

    /// Simulate a click on a thumbar button.
    pub fn press(&self, button: ThumbButton, config: &BridgeConfig) -> usize {
        debug!(button = button.tooltip(), "thumbar button pressed");
        self.emit(button.event_name(config))
    }

    /// Handle a raw `WM_COMMAND`. Returns `false` if it was not a thumb button click.
    pub fn handle_command(&self, wparam: usize, config: &BridgeConfig) -> bool {
        match ThumbButton::from_command(wparam) {
            Some(button) => {
                self.press(button, config);
                true
            }
            None => false,
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.handlers.read().get(event).map(Vec::len).unwrap_or(0)
    }

    /// All invocations received, oldest first.
    pub fn calls(&self) -> Vec<InvokeCall> {
        self.calls.lock().clone()
    }

    /// The most recent playing state reported by the page.
    pub fn last_playing(&self) -> Option<bool> {
        match self.session.playback_state() {
            MediaSessionPlaybackState::None => None,
            state => Some(state == MediaSessionPlaybackState::Playing),
        }
    }

    /// Indicator state.
    pub fn session(&self) -> &MediaSession {
        &self.session
    }

    /// Make every invocation fail.
    pub fn set_fail_invocations(&self, fail: bool) {
        self.fail_invocations.store(fail, Ordering::Relaxed);
    }
}

impl EventSurface for LocalHost {
    fn listen(&self, event: &str, handler: HostEventHandler) -> BridgeResult<()> {
        self.handlers
            .write()
            .entry(event.to_string())
            .or_default()
            .push(handler);
        debug!(event, "host event subscribed");
        Ok(())
    }
}

impl InvokeSurface for LocalHost {
    fn invoke(&self, command: &str, args: Value) -> BridgeResult<Value> {
        if self.fail_invocations.load(Ordering::Relaxed) {
            return Err(BridgeError::invoke(format!("`{}` rejected by host", command)));
        }

        self.calls.lock().push(InvokeCall {
            command: command.to_string(),
            args: args.clone(),
        });

        if command != self.playing_command {
            return Err(BridgeError::invoke(format!("unknown command `{}`", command)));
        }

        let playing = args
            .get("playing")
            .and_then(Value::as_bool)
            .ok_or_else(|| BridgeError::invoke("missing boolean `playing` argument"))?;
        self.session.report_playing(playing);
        Ok(Value::Null)
    }
}
