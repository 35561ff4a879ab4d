//! The page the bridge is installed into, and the session that drives it.

use crate::bridge::{AttemptOutcome, PlaybackBridge, ToggleRequest};
use crate::config::BridgeConfig;
use crate::host::{HostCapabilities, HostEventHandler, HostGlobals, HostNotifier};
use crate::selector_chain::TransportAction;
use crate::tracker::ElementTracker;
use common::{BridgeError, BridgeResult};
use dom::Document;
use std::sync::Arc;
use tracing::{debug, info, warn};
use web_apis::{EventLoopContext, MutationObserver, MutationObserverInit, TaskQueue, TaskSender};

/// Script environment of the page: the document and the bridge components
/// living next to it.
pub struct PageContext {
    document: Document,
    observer: MutationObserver,
    tracker: ElementTracker,
    bridge: PlaybackBridge,
    sender: TaskSender<PageContext>,
}

impl EventLoopContext for PageContext {
    fn perform_microtask_checkpoint(&mut self) {
        self.deliver_mutations();
    }
}

impl PageContext {
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn tracker(&self) -> &ElementTracker {
        &self.tracker
    }

    pub fn bridge(&self) -> &PlaybackBridge {
        &self.bridge
    }

    /// Hand the document's pending mutations to the observer, then the
    /// observed batch to the tracker.
    fn deliver_mutations(&mut self) {
        if !self.document.has_pending_mutations() {
            return;
        }
        let records = self.document.take_mutation_records();
        self.observer.collect(self.document.tree(), records);

        let batch = self.observer.take_records();
        if !batch.is_empty() {
            debug!(records = batch.len(), "delivering mutation batch");
            self.tracker.handle_mutations(&mut self.document, &batch);
        }
    }

    /// Attempt now, then schedule one re-attempt after each configured
    /// delay. The re-attempts are never cancelled.
    pub fn handle_toggle_request(&mut self) -> AttemptOutcome {
        let request = self.bridge.begin_toggle();
        let outcome = self.run_toggle_attempt(&request);

        for &delay in self.bridge.retry_delays_ms() {
            let request = request.clone();
            self.sender
                .post_delayed("toggle-retry", delay, move |ctx: &mut PageContext| {
                    ctx.run_toggle_attempt(&request);
                });
        }
        outcome
    }

    fn run_toggle_attempt(&mut self, request: &ToggleRequest) -> AttemptOutcome {
        self.bridge.attempt_toggle(&mut self.document, request)
    }

    /// Previous/next: a single attempt.
    pub fn handle_transport(&mut self, action: TransportAction) -> AttemptOutcome {
        self.bridge.attempt_transport(&mut self.document, action)
    }
}

/// A page with the bridge installed, plus the task queue that runs it.
pub struct Session {
    context: PageContext,
    queue: TaskQueue<PageContext>,
    capabilities: HostCapabilities,
    config: BridgeConfig,
}

impl Session {
    /// Install the bridge into a page.
    ///
    /// Resolves the host surfaces once, registers the media elements already
    /// present, starts observing the document and subscribes to the host
    /// events. A missing host surface only degrades the session.
    pub fn install(mut document: Document, globals: &HostGlobals, config: BridgeConfig) -> BridgeResult<Self> {
        let capabilities = HostCapabilities::resolve(globals);
        let notifier = Arc::new(HostNotifier::new(&capabilities, &config.playing_command));

        let bridge = PlaybackBridge::new(&config, notifier.clone())?;
        let mut tracker = ElementTracker::new(notifier);

        // Mutations from building the page are covered by the initial scan.
        document.take_mutation_records();
        tracker.initialize(&mut document);

        let mut observer = MutationObserver::new();
        observer
            .observe(document.root(), MutationObserverInit::new().child_list().subtree())
            .map_err(|e| BridgeError::internal(e.to_string()))?;

        let queue = TaskQueue::new();
        let context = PageContext {
            document,
            observer,
            tracker,
            bridge,
            sender: queue.sender(),
        };

        let session = Self {
            context,
            queue,
            capabilities,
            config,
        };
        session.subscribe();

        info!(
            media = session.context.tracker.registered_count(),
            events = ?session.capabilities.event_namespace(),
            invoke = ?session.capabilities.invoke_namespace(),
            "thumbar bridge installed"
        );
        Ok(session)
    }

    fn subscribe(&self) {
        let Some(events) = self.capabilities.event() else {
            return;
        };

        let mut subscriptions: Vec<(&str, HostEventHandler)> = Vec::new();

        let sender = self.queue.sender();
        let on_toggle: HostEventHandler = Arc::new(move || {
            sender.post("toggle", |ctx: &mut PageContext| {
                ctx.handle_toggle_request();
            });
        });
        subscriptions.push((self.config.toggle_event.as_str(), on_toggle));

        if self.config.enable_transport_events {
            for (event, action) in [
                (self.config.previous_event.as_str(), TransportAction::Previous),
                (self.config.next_event.as_str(), TransportAction::Next),
            ] {
                let sender = self.queue.sender();
                let on_press: HostEventHandler = Arc::new(move || {
                    sender.post(action.as_str(), move |ctx: &mut PageContext| {
                        ctx.handle_transport(action);
                    });
                });
                subscriptions.push((event, on_press));
            }
        }

        for (event, handler) in subscriptions {
            if let Err(err) = events.listen(event, handler) {
                warn!(event, error = %err, "host event subscription failed");
            }
        }
    }

    /// Run every task that is due now.
    pub fn run_until_idle(&mut self) -> usize {
        self.queue.run_until_idle(&mut self.context)
    }

    /// Move virtual time forward, running timers as they come due.
    pub fn advance(&mut self, ms: u64) -> usize {
        self.queue.advance(&mut self.context, ms)
    }

    /// Mutate the document as page script would; observers see the changes
    /// right after.
    pub fn with_document<R>(&mut self, f: impl FnOnce(&mut Document) -> R) -> R {
        let result = f(&mut self.context.document);
        self.context.perform_microtask_checkpoint();
        result
    }

    pub fn document(&self) -> &Document {
        &self.context.document
    }

    pub fn tracker(&self) -> &ElementTracker {
        &self.context.tracker
    }

    pub fn context(&self) -> &PageContext {
        &self.context
    }

    pub fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn notifier(&self) -> &Arc<HostNotifier> {
        self.context.bridge.notifier()
    }

    /// Current virtual time.
    pub fn now_ms(&self) -> u64 {
        self.queue.now_ms()
    }

    /// Queued tasks, due or not.
    pub fn pending_tasks(&self) -> usize {
        self.queue.pending()
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.queue.next_due_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostApi;
    use crate::local_host::{LocalHost, ThumbButton};
    use dom::{Event, EventType, NodeId};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn install(document: Document, globals: &HostGlobals) -> Session {
        Session::install(document, globals, BridgeConfig::default()).unwrap()
    }

    fn host() -> Arc<LocalHost> {
        Arc::new(LocalHost::new(&BridgeConfig::default()))
    }

    fn media_log(session: &mut Session, node: NodeId) -> Arc<Mutex<Vec<String>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        for event_type in ["play", "pause"] {
            let log = log.clone();
            session.with_document(|doc| {
                doc.add_event_listener(
                    node,
                    event_type,
                    Arc::new(move |event: &mut Event| {
                        log.lock().push(event.event_type.as_str().to_string());
                    }),
                )
            });
        }
        log
    }

    #[test]
    fn test_paused_video_plays_across_all_attempts() {
        let host = host();
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let video = doc.create_element("video");
        doc.set_attribute(video, "id", "v");
        doc.append_child(body, video);

        let mut session = install(doc, &HostGlobals::new().with_current(host.api()));
        let config = session.config().clone();

        host.press(ThumbButton::PlayPause, &config);
        session.run_until_idle();
        assert!(session.document().media(video).unwrap().is_playing());
        assert_eq!(session.pending_tasks(), 2);

        session.advance(200);
        session.advance(400);
        assert_eq!(session.now_ms(), 600);
        assert_eq!(session.pending_tasks(), 0);
        assert!(session.document().media(video).unwrap().is_playing());
        assert_eq!(host.last_playing(), Some(true));
    }

    fn click_counter(session: &mut Session, node: NodeId) -> Arc<AtomicUsize> {
        let clicks = Arc::new(AtomicUsize::new(0));
        let c = clicks.clone();
        session.with_document(|doc| {
            doc.add_event_listener(
                node,
                "click",
                Arc::new(move |_: &mut Event| {
                    c.fetch_add(1, Ordering::SeqCst);
                }),
            )
        });
        clicks
    }

    #[test]
    fn test_immediate_attempt_runs_inline() {
        let host = host();
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let video = doc.create_element("video");
        doc.append_child(body, video);
        let mut session = install(doc, &HostGlobals::new().with_current(host.api()));

        let outcome = session.context.handle_toggle_request();
        assert_eq!(outcome, AttemptOutcome::Played(video));
        assert!(session.document().media(video).unwrap().is_playing());
        assert_eq!(session.pending_tasks(), 2);
        assert_eq!(session.next_due_ms(), Some(200));
        assert_eq!(host.last_playing(), Some(true));
    }

    #[test]
    fn test_overlapping_requests_keep_their_own_intent() {
        let host = host();
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let video = doc.create_element("video");
        doc.append_child(body, video);
        let mut session = install(doc, &HostGlobals::new().with_current(host.api()));
        let log = media_log(&mut session, video);
        let config = session.config().clone();

        // First request plays at 0 and re-plays at 200 and 600.
        host.press(ThumbButton::PlayPause, &config);
        session.run_until_idle();
        session.advance(100);

        // Second request sees a playing video, pauses at 100, 300 and 700.
        host.press(ThumbButton::PlayPause, &config);
        session.run_until_idle();
        assert!(!session.document().media(video).unwrap().is_playing());
        assert_eq!(session.pending_tasks(), 4);

        session.advance(100);
        assert!(session.document().media(video).unwrap().is_playing());
        session.advance(100);
        assert!(!session.document().media(video).unwrap().is_playing());

        session.advance(1000);
        assert_eq!(session.pending_tasks(), 0);
        assert!(!session.document().media(video).unwrap().is_playing());
        assert_eq!(*log.lock(), vec!["play", "pause", "play", "pause", "play", "pause"]);
        assert_eq!(host.last_playing(), Some(false));
    }

    #[test]
    fn test_overlapping_requests_click_per_attempt() {
        let host = host();
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let button = doc.create_element("button");
        doc.set_attribute(button, "class", "play-button");
        doc.append_child(body, button);
        let mut session = install(doc, &HostGlobals::new().with_current(host.api()));
        let clicks = click_counter(&mut session, button);
        let config = session.config().clone();

        host.press(ThumbButton::PlayPause, &config);
        session.run_until_idle();
        session.advance(100);
        host.press(ThumbButton::PlayPause, &config);
        session.run_until_idle();
        assert_eq!(clicks.load(Ordering::SeqCst), 2);

        session.advance(1000);
        assert_eq!(clicks.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_control_appearing_between_attempts_is_clicked() {
        let host = host();
        let mut session = install(Document::new(), &HostGlobals::new().with_current(host.api()));

        assert_eq!(session.context.handle_toggle_request(), AttemptOutcome::NoMatch);
        session.advance(100);

        let button = session.with_document(|doc| {
            let body = doc.body().unwrap();
            let button = doc.create_element("button");
            doc.set_attribute(button, "aria-label", "Play");
            doc.append_child(body, button);
            button
        });
        let clicks = click_counter(&mut session, button);

        session.advance(1000);
        assert_eq!(clicks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_media_appearing_between_attempts_takes_over() {
        let host = host();
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let button = doc.create_element("button");
        doc.set_attribute(button, "class", "play-button");
        doc.append_child(body, button);
        let mut session = install(doc, &HostGlobals::new().with_current(host.api()));
        let clicks = click_counter(&mut session, button);

        assert_eq!(session.context.handle_toggle_request(), AttemptOutcome::Clicked(button));
        session.advance(100);

        let video = session.with_document(|doc| {
            let video = doc.create_element("video");
            doc.append_child(body, video);
            video
        });
        assert!(session.tracker().is_registered(video));
        assert_eq!(host.last_playing(), Some(false));

        // Media elements outrank controls; the later attempts play it.
        session.advance(1000);
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
        assert!(session.document().media(video).unwrap().is_playing());
        assert_eq!(host.last_playing(), Some(true));
    }

    #[test]
    fn test_play_button_clicked_once_per_attempt() {
        let host = host();
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let button = doc.create_element("button");
        doc.set_attribute(button, "class", "play-button");
        doc.append_child(body, button);
        let clicks = Arc::new(AtomicUsize::new(0));
        let c = clicks.clone();
        doc.add_event_listener(
            button,
            "click",
            Arc::new(move |_: &mut Event| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let mut session = install(doc, &HostGlobals::new().with_current(host.api()));
        host.press(ThumbButton::PlayPause, &BridgeConfig::default());
        session.run_until_idle();
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
        session.advance(1000);
        assert_eq!(clicks.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_no_invoke_surface_degrades() {
        let host = host();
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let video = doc.create_element("video");
        doc.append_child(body, video);

        let globals = HostGlobals::new().with_current(HostApi::new().with_event(host.clone()));
        let mut session = install(doc, &globals);
        assert!(session.capabilities().is_degraded());

        host.press(ThumbButton::PlayPause, &BridgeConfig::default());
        session.run_until_idle();
        session.advance(600);
        assert!(session.document().media(video).unwrap().is_playing());
        assert!(session.notifier().failure_count() >= 1);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_no_event_surface_receives_nothing() {
        let host = host();
        let globals = HostGlobals::new().with_current(HostApi::new().with_invoke(host.clone()));
        let session = install(Document::new(), &globals);

        assert_eq!(host.listener_count("thumbar-playpause"), 0);
        assert!(session.capabilities().event().is_none());
    }

    #[test]
    fn test_legacy_namespace() {
        let host = host();
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let audio = doc.create_element("audio");
        doc.append_child(body, audio);

        let mut session = install(doc, &HostGlobals::new().with_legacy(host.api()));
        assert_eq!(session.capabilities().event_namespace(), Some(crate::host::HostNamespace::Legacy));
        // Initial state report.
        assert_eq!(host.last_playing(), Some(false));

        host.press(ThumbButton::PlayPause, &BridgeConfig::default());
        session.run_until_idle();
        assert_eq!(host.last_playing(), Some(true));
    }

    #[test]
    fn test_dynamically_added_media_is_tracked() {
        let host = host();
        let mut session = install(Document::new(), &HostGlobals::new().with_current(host.api()));
        assert_eq!(session.tracker().registered_count(), 0);

        let video = session.with_document(|doc| {
            let body = doc.body().unwrap();
            let wrapper = doc.create_element("div");
            let video = doc.create_element("video");
            doc.append_child(wrapper, video);
            doc.append_child(body, wrapper);
            video
        });
        assert!(session.tracker().is_registered(video));

        session.with_document(|doc| doc.play(video).unwrap());
        assert_eq!(host.last_playing(), Some(true));
    }

    #[test]
    fn test_removed_media_no_longer_notifies() {
        let host = host();
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let video = doc.create_element("video");
        doc.append_child(body, video);
        let mut session = install(doc, &HostGlobals::new().with_current(host.api()));

        session.with_document(|doc| doc.remove(video));
        assert!(!session.tracker().is_registered(video));
        let calls = host.calls().len();

        session.with_document(|doc| doc.play(video).unwrap());
        session.with_document(|doc| doc.pause(video).unwrap());
        assert_eq!(host.calls().len(), calls);
    }

    #[test]
    fn test_double_registration_single_notification() {
        let host = host();
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let wrapper = doc.create_element("div");
        let video = doc.create_element("video");
        doc.append_child(body, wrapper);
        doc.append_child(wrapper, video);
        let mut session = install(doc, &HostGlobals::new().with_current(host.api()));
        let log = media_log(&mut session, video);

        // Moving within the document re-registers; still one reaction pair.
        session.with_document(|doc| doc.append_child(body, video));
        assert_eq!(session.document().listener_count(video, "play"), 2);

        let before = host.calls().len();
        session.with_document(|doc| doc.play(video).unwrap());
        assert_eq!(host.calls().len(), before + 1);
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn test_previous_and_next_run_once() {
        let host = host();
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let next = doc.create_element("button");
        doc.set_attribute(next, "aria-label", "Next track");
        doc.append_child(body, next);
        let clicks = Arc::new(AtomicUsize::new(0));
        let c = clicks.clone();
        doc.add_event_listener(
            next,
            "click",
            Arc::new(move |_: &mut Event| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let mut session = install(doc, &HostGlobals::new().with_current(host.api()));
        assert!(host.handle_command(ThumbButton::Next.to_command(), &BridgeConfig::default()));
        session.run_until_idle();
        session.advance(1000);
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transport_events_can_be_disabled() {
        let host = host();
        let config = BridgeConfig::default().with_transport_events(false);
        let _session =
            Session::install(Document::new(), &HostGlobals::new().with_current(host.api()), config).unwrap();

        assert_eq!(host.listener_count("thumbar-playpause"), 1);
        assert_eq!(host.listener_count("thumbar-next"), 0);
        assert_eq!(host.listener_count("thumbar-previous"), 0);
    }

    #[test]
    fn test_ended_reports_not_playing() {
        let host = host();
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let video = doc.create_element("video");
        doc.append_child(body, video);
        let mut session = install(doc, &HostGlobals::new().with_current(host.api()));

        session.with_document(|doc| doc.play(video).unwrap());
        assert_eq!(host.last_playing(), Some(true));
        session.with_document(|doc| doc.finish(video).unwrap());
        assert_eq!(host.last_playing(), Some(false));

        let mut event = Event::trusted(EventType::Ended);
        session.with_document(|doc| doc.dispatch_event(video, &mut event));
        assert_eq!(host.last_playing(), Some(false));
    }
}
