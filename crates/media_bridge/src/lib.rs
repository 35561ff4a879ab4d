//! Thumbar media bridge.
//!
//! This crate connects a page to the taskbar thumbnail toolbar of its host:
//! - Element Tracker: reports play/pause transitions of every media element
//! - Playback Bridge: turns thumbar presses into in-page actions
//! - Host capability probing and the in-process host

pub mod bridge;
pub mod config;
pub mod host;
pub mod local_host;
pub mod page;
pub mod selector_chain;
pub mod tracker;

pub use bridge::{AttemptOutcome, PlaybackBridge, PlaybackIntent, ToggleRequest};
pub use config::BridgeConfig;
pub use host::{
    EventSurface, HostApi, HostCapabilities, HostEventHandler, HostGlobals, HostNamespace, HostNotifier,
    InvokeSurface,
};
pub use local_host::{InvokeCall, LocalHost, ThumbButton};
pub use page::{PageContext, Session};
pub use selector_chain::{ChainMatch, ChainRule, SelectorChain, TransportAction};
pub use tracker::{ElementTracker, Registration};

/// Bridge version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
