//! Playback Bridge: turns host requests into in-page actions and in-page
//! playback transitions into host notifications.

use crate::config::BridgeConfig;
use crate::host::HostNotifier;
use crate::selector_chain::{ChainMatch, SelectorChain, TransportAction};
use common::BridgeResult;
use dom::{Document, NodeId};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Direction a toggle request settled on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackIntent {
    Play,
    Pause,
}

/// Result of one attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// A media element was asked to play.
    Played(NodeId),
    /// A media element was asked to pause.
    Paused(NodeId),
    /// An element was activated.
    Clicked(NodeId),
    /// No rule matched.
    NoMatch,
    /// A rule matched but the action was rejected or ignored.
    Failed,
}

/// One host toggle request, shared by its immediate attempt and its re-attempts.
///
/// The first attempt that toggles a media element fixes the intent; later
/// attempts of the same request apply that intent again instead of flipping.
#[derive(Clone, Debug)]
pub struct ToggleRequest {
    id: u64,
    intent: Arc<Mutex<Option<PlaybackIntent>>>,
}

impl ToggleRequest {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn intent(&self) -> Option<PlaybackIntent> {
        *self.intent.lock()
    }

    fn resolve_intent(&self, paused: bool) -> PlaybackIntent {
        *self.intent.lock().get_or_insert(if paused {
            PlaybackIntent::Play
        } else {
            PlaybackIntent::Pause
        })
    }
}

/// The Playback Bridge.
pub struct PlaybackBridge {
    play_pause: SelectorChain,
    previous: SelectorChain,
    next: SelectorChain,
    retry_delays_ms: Vec<u64>,
    notifier: Arc<HostNotifier>,
    next_request: u64,
}

impl PlaybackBridge {
    pub fn new(config: &BridgeConfig, notifier: Arc<HostNotifier>) -> BridgeResult<Self> {
        Ok(Self {
            play_pause: SelectorChain::for_action(TransportAction::PlayPause)?,
            previous: SelectorChain::for_action(TransportAction::Previous)?,
            next: SelectorChain::for_action(TransportAction::Next)?,
            retry_delays_ms: config.retry_delays_ms.clone(),
            notifier,
            next_request: 0,
        })
    }

    /// Delays of the re-attempts following the immediate one.
    pub fn retry_delays_ms(&self) -> &[u64] {
        &self.retry_delays_ms
    }

    /// Start a new toggle request.
    pub fn begin_toggle(&mut self) -> ToggleRequest {
        self.next_request += 1;
        ToggleRequest {
            id: self.next_request,
            intent: Arc::new(Mutex::new(None)),
        }
    }

    fn chain(&self, action: TransportAction) -> &SelectorChain {
        match action {
            TransportAction::PlayPause => &self.play_pause,
            TransportAction::Previous => &self.previous,
            TransportAction::Next => &self.next,
        }
    }

    /// One play/pause attempt: toggle the first media element, else activate
    /// the first matching control, else do nothing.
    pub fn attempt_toggle(&self, document: &mut Document, request: &ToggleRequest) -> AttemptOutcome {
        let outcome = match self.play_pause.find(document) {
            None => AttemptOutcome::NoMatch,
            Some(ChainMatch::Media(node)) => {
                let paused = document.media(node).map(|m| m.paused()).unwrap_or(true);
                self.apply_intent(document, node, request.resolve_intent(paused))
            }
            Some(ChainMatch::Click { node, rule }) => {
                debug!(rule = %self.play_pause.describe(rule), "play/pause control matched");
                self.activate(document, node)
            }
        };
        debug!(request = request.id, ?outcome, "play/pause attempt");
        outcome
    }

    /// One previous/next attempt over that action's selectors.
    pub fn attempt_transport(&self, document: &mut Document, action: TransportAction) -> AttemptOutcome {
        let chain = self.chain(action);
        let outcome = match chain.find(document) {
            None => AttemptOutcome::NoMatch,
            // Only the play/pause chain has a media rule.
            Some(ChainMatch::Media(_)) => AttemptOutcome::NoMatch,
            Some(ChainMatch::Click { node, rule }) => {
                debug!(action = action.as_str(), rule = %chain.describe(rule), "transport control matched");
                self.activate(document, node)
            }
        };
        debug!(action = action.as_str(), ?outcome, "transport attempt");
        outcome
    }

    fn apply_intent(&self, document: &mut Document, node: NodeId, intent: PlaybackIntent) -> AttemptOutcome {
        let result = match intent {
            PlaybackIntent::Play => document.play(node).map(|_| AttemptOutcome::Played(node)),
            PlaybackIntent::Pause => document.pause(node).map(|_| AttemptOutcome::Paused(node)),
        };
        result.unwrap_or_else(|err| {
            warn!(?node, ?intent, error = %err, "media toggle failed");
            AttemptOutcome::Failed
        })
    }

    fn activate(&self, document: &mut Document, node: NodeId) -> AttemptOutcome {
        if document.click(node) {
            AttemptOutcome::Clicked(node)
        } else {
            debug!(?node, "matched control ignored the click");
            AttemptOutcome::Failed
        }
    }

    /// Report the page's playing state to the host.
    pub fn notify_host_playing_state(&self, playing: bool) {
        self.notifier.notify_playing(playing);
    }

    pub fn notifier(&self) -> &Arc<HostNotifier> {
        &self.notifier
    }
}
