//! HTMLMediaElement playback state.

use parking_lot::RwLock;

/// Playback state of an `<audio>` or `<video>` element.
#[derive(Debug)]
pub struct MediaElement {
    /// Paused flag.
    paused: RwLock<bool>,
    /// Ended flag.
    ended: RwLock<bool>,
    /// Loop flag.
    loop_: RwLock<bool>,
    /// Error.
    error: RwLock<Option<MediaError>>,
}

impl MediaElement {
    /// Create a new, paused media element.
    pub fn new() -> Self {
        Self {
            paused: RwLock::new(true),
            ended: RwLock::new(false),
            loop_: RwLock::new(false),
            error: RwLock::new(None),
        }
    }

    /// Check if paused.
    pub fn paused(&self) -> bool {
        *self.paused.read()
    }

    /// Check if ended.
    pub fn ended(&self) -> bool {
        *self.ended.read()
    }

    /// Playing means not paused and not ended.
    pub fn is_playing(&self) -> bool {
        !self.paused() && !self.ended()
    }

    pub fn loop_(&self) -> bool {
        *self.loop_.read()
    }

    pub fn set_loop(&self, loop_: bool) {
        *self.loop_.write() = loop_;
    }

    pub fn error(&self) -> Option<MediaError> {
        self.error.read().clone()
    }

    /// Set error. Subsequent `play()` calls are rejected with it.
    pub fn set_error(&self, error: Option<MediaError>) {
        *self.error.write() = error;
    }

    /// Request playback.
    ///
    /// Returns `Ok(true)` when the element transitioned out of the paused state,
    /// `Ok(false)` when it was already playing.
    pub fn play(&self) -> Result<bool, MediaError> {
        if let Some(error) = self.error() {
            return Err(error);
        }

        // Playing an ended element restarts it.
        *self.ended.write() = false;

        let mut paused = self.paused.write();
        let was_paused = *paused;
        *paused = false;
        Ok(was_paused)
    }

    /// Pause playback. Returns `true` if the element was playing.
    pub fn pause(&self) -> bool {
        let mut paused = self.paused.write();
        let was_playing = !*paused;
        *paused = true;
        was_playing
    }

    /// Reach the end of the resource.
    ///
    /// Looping elements keep playing (returns `false`); otherwise the element
    /// becomes paused and ended (returns `true`).
    pub fn finish(&self) -> bool {
        if self.loop_() {
            return false;
        }
        *self.ended.write() = true;
        *self.paused.write() = true;
        true
    }
}

impl Default for MediaElement {
    fn default() -> Self {
        Self::new()
    }
}

/// Media error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("Media aborted")]
    Aborted,

    #[error("Network error")]
    Network,

    #[error("Decode error")]
    Decode,

    #[error("Source not supported")]
    SrcNotSupported,

    #[error("Playback not allowed")]
    NotAllowed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_element_is_paused() {
        let element = MediaElement::new();
        assert!(element.paused());
        assert!(!element.ended());
        assert!(!element.is_playing());
        assert_eq!(element.error(), None);
    }

    #[test]
    fn test_play_pause_transitions() {
        let element = MediaElement::new();
        assert_eq!(element.play(), Ok(true));
        assert!(element.is_playing());

        // Second play is a no-op transition.
        assert_eq!(element.play(), Ok(false));

        assert!(element.pause());
        assert!(!element.pause());
        assert!(!element.is_playing());
    }

    #[test]
    fn test_play_rejected_on_error() {
        let element = MediaElement::new();
        element.set_error(Some(MediaError::SrcNotSupported));
        assert_eq!(element.play(), Err(MediaError::SrcNotSupported));
        assert!(element.paused());

        element.set_error(None);
        assert_eq!(element.play(), Ok(true));
    }

    #[test]
    fn test_finish_and_restart() {
        let element = MediaElement::new();
        element.play().unwrap();

        assert!(element.finish());
        assert!(element.ended());
        assert!(element.paused());
        assert!(!element.is_playing());

        assert_eq!(element.play(), Ok(true));
        assert!(!element.ended());
        assert!(element.is_playing());
    }

    #[test]
    fn test_finish_while_looping() {
        let element = MediaElement::new();
        element.set_loop(true);
        element.play().unwrap();

        assert!(!element.finish());
        assert!(element.is_playing());
    }
}
