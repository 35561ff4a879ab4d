//! Media element state and the host-side media session.
//!
//! This crate provides:
//! - Media element playback state (paused/ended inspection, play/pause control)
//! - Media session state mirrored by the host's "now playing" indicator

pub mod media_element;
pub mod media_session;

pub use media_element::{MediaElement, MediaError};
pub use media_session::{MediaSession, MediaSessionPlaybackState};
