//! Bridge configuration.

use common::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Event the host emits when the thumbar play/pause button is pressed.
pub const DEFAULT_TOGGLE_EVENT: &str = "thumbar-playpause";
pub const DEFAULT_PREVIOUS_EVENT: &str = "thumbar-previous";
pub const DEFAULT_NEXT_EVENT: &str = "thumbar-next";
/// Host command that receives the page's playing state.
pub const DEFAULT_PLAYING_COMMAND: &str = "thumbar_set_playing";
/// Longest accepted re-attempt delay.
pub const MAX_RETRY_DELAY_MS: u64 = 60_000;

/// Bridge configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Host event that requests a play/pause toggle.
    pub toggle_event: String,
    /// Host event for the previous-track button.
    pub previous_event: String,
    /// Host event for the next-track button.
    pub next_event: String,
    /// Host command invoked with `{ "playing": bool }`.
    pub playing_command: String,
    /// Delays of the re-attempts that follow the immediate toggle attempt.
    pub retry_delays_ms: Vec<u64>,
    /// Whether to subscribe to the previous/next events.
    pub enable_transport_events: bool,
}

impl BridgeConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> BridgeResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> BridgeResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> BridgeResult<()> {
        let names = [
            ("toggle_event", &self.toggle_event),
            ("previous_event", &self.previous_event),
            ("next_event", &self.next_event),
            ("playing_command", &self.playing_command),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(BridgeError::config(format!("`{}` must not be empty", field)));
            }
        }
        if let Some(delay) = self.retry_delays_ms.iter().find(|&&d| d > MAX_RETRY_DELAY_MS) {
            return Err(BridgeError::config(format!(
                "retry delay {} ms exceeds {} ms",
                delay, MAX_RETRY_DELAY_MS
            )));
        }
        Ok(())
    }

    /// Set the re-attempt delays.
    pub fn with_retry_delays(mut self, delays_ms: Vec<u64>) -> Self {
        self.retry_delays_ms = delays_ms;
        self
    }

    /// Enable or disable the previous/next subscriptions.
    pub fn with_transport_events(mut self, enabled: bool) -> Self {
        self.enable_transport_events = enabled;
        self
    }

    /// Set the outward command name.
    pub fn with_playing_command(mut self, command: &str) -> Self {
        self.playing_command = command.to_string();
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            toggle_event: DEFAULT_TOGGLE_EVENT.to_string(),
            previous_event: DEFAULT_PREVIOUS_EVENT.to_string(),
            next_event: DEFAULT_NEXT_EVENT.to_string(),
            playing_command: DEFAULT_PLAYING_COMMAND.to_string(),
            retry_delays_ms: vec![200, 600],
            enable_transport_events: true,
        }
    }
}
