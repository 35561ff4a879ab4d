//! Media session state mirrored by the host's "now playing" indicator.

use parking_lot::RwLock;
use tracing::debug;

/// Host-side media session: whether the thumbar shows the page as playing.
#[derive(Debug, Default)]
pub struct MediaSession {
    playback_state: RwLock<MediaSessionPlaybackState>,
}

impl MediaSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playback_state(&self) -> MediaSessionPlaybackState {
        *self.playback_state.read()
    }

    /// Record a playing/paused report from the page.
    pub fn report_playing(&self, playing: bool) {
        let state = if playing {
            MediaSessionPlaybackState::Playing
        } else {
            MediaSessionPlaybackState::Paused
        };
        let previous = std::mem::replace(&mut *self.playback_state.write(), state);
        if previous != state {
            debug!(?previous, ?state, "media session state changed");
        }
    }

    /// Check if the session is playing.
    pub fn is_playing(&self) -> bool {
        self.playback_state() == MediaSessionPlaybackState::Playing
    }
}

/// Media session playback state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MediaSessionPlaybackState {
    /// Nothing reported yet.
    #[default]
    None,
    Paused,
    Playing,
}

impl MediaSessionPlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaSessionPlaybackState::None => "none",
            MediaSessionPlaybackState::Paused => "paused",
            MediaSessionPlaybackState::Playing => "playing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let session = MediaSession::new();
        assert_eq!(session.playback_state(), MediaSessionPlaybackState::None);
        assert!(!session.is_playing());
    }

    #[test]
    fn test_report_playing() {
        let session = MediaSession::new();
        session.report_playing(true);
        assert!(session.is_playing());
        session.report_playing(false);
        assert_eq!(session.playback_state(), MediaSessionPlaybackState::Paused);
        assert_eq!(session.playback_state().as_str(), "paused");
    }
}
