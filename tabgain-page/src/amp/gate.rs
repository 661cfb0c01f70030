//! Activation gate
//!
//! Platform policy keeps the audio context suspended until the user
//! interacts with the page. The gate listens for the first qualifying
//! gesture, resumes the context, re-applies the last target volume, and
//! reconciles so elements that failed to connect pre-resume get a
//! second chance. The listener fires at most once per session no matter
//! how many gesture kinds are registered.

use crate::amp::graph::AmpGraph;
use crate::amp::tracker::MediaTracker;
use crate::page::Document;
use crate::state::SessionState;
use std::sync::{Arc, Mutex};
use tabgain_common::events::TabgainEvent;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::info;

/// Single-shot first-gesture listener
pub struct ActivationGate {
    document: Arc<Document>,
    graph: Arc<AmpGraph>,
    tracker: Arc<MediaTracker>,
    state: Arc<SessionState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ActivationGate {
    pub fn new(
        document: Arc<Document>,
        graph: Arc<AmpGraph>,
        tracker: Arc<MediaTracker>,
        state: Arc<SessionState>,
    ) -> Self {
        Self {
            document,
            graph,
            tracker,
            state,
            task: Mutex::new(None),
        }
    }

    /// Arm the gate
    ///
    /// Re-arming replaces any previous listener; exactly one is active.
    pub fn arm(&self) {
        let mut slot = self.task.lock().unwrap();
        if let Some(prev) = slot.take() {
            prev.abort();
        }

        // Subscribe before spawning so no gesture is missed in between
        let mut gestures = self.document.subscribe_gestures();
        let graph = Arc::clone(&self.graph);
        let tracker = Arc::clone(&self.tracker);
        let state = Arc::clone(&self.state);

        let handle = tokio::spawn(async move {
            let gesture = loop {
                match gestures.recv().await {
                    Ok(gesture) => break gesture,
                    // Any gesture qualifies; a lagged channel still means
                    // one happened
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return,
                }
            };

            info!(gesture = %gesture, "First user gesture; engaging amplification");
            graph.resume_if_suspended().await;

            // Re-apply the last known target and give earlier failures a
            // second chance
            let target = state.target_volume().await;
            graph.set_target(target).await;
            tracker.reconcile().await;

            state.broadcast(TabgainEvent::PageActivated {
                gesture: gesture.to_string(),
                timestamp: chrono::Utc::now(),
            });
        });
        *slot = Some(handle);
    }

    /// Stop listening (teardown)
    pub fn disarm(&self) {
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }
    }

    /// Whether the listener is still waiting for a gesture
    pub fn is_armed(&self) -> bool {
        self.task
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for ActivationGate {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ContextState;
    use crate::page::{Gesture, MediaElement};
    use std::time::Duration;

    fn setup() -> (Arc<Document>, Arc<AmpGraph>, Arc<MediaTracker>, ActivationGate) {
        let document = Arc::new(Document::new("example.com"));
        let state = Arc::new(SessionState::default());
        let graph = Arc::new(AmpGraph::new(Arc::clone(&document), Arc::clone(&state)));
        let tracker = Arc::new(MediaTracker::new(
            Arc::clone(&document),
            Arc::clone(&graph),
            Arc::clone(&state),
        ));
        let gate = ActivationGate::new(
            Arc::clone(&document),
            Arc::clone(&graph),
            Arc::clone(&tracker),
            state,
        );
        (document, graph, tracker, gate)
    }

    #[tokio::test(start_paused = true)]
    async fn test_pre_gesture_volume_applies_after_first_gesture() {
        let (doc, graph, _tracker, gate) = setup();
        gate.arm();
        tokio::time::sleep(Duration::from_millis(10)).await;

        // 350% requested before any gesture: context stays suspended with
        // the target recorded
        graph.set_target(3.5).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        let ctx = graph.peek_context().await.unwrap();
        assert_eq!(ctx.state(), ContextState::Suspended);
        assert_eq!(ctx.gain().target(), 3.5);

        // First gesture: running, and the gain converges to 3.5 without a
        // second explicit volume set
        doc.dispatch_gesture(Gesture::Click);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ctx.state(), ContextState::Running);
        assert_eq!(ctx.gain().target(), 3.5);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!((ctx.gain().value() - 3.5).abs() < 1e-2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_shot() {
        let (doc, graph, _tracker, gate) = setup();
        graph.ensure_context().await;
        gate.arm();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(gate.is_armed());

        doc.dispatch_gesture(Gesture::KeyDown);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!gate.is_armed());

        let ctx = graph.peek_context().await.unwrap();
        let calls = ctx.resume_call_count();

        // Later gestures do not re-trigger the listener
        doc.dispatch_gesture(Gesture::Click);
        doc.dispatch_gesture(Gesture::TouchStart);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ctx.resume_call_count(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_chance_reconcile_connects_failed_elements() {
        let (doc, graph, tracker, gate) = setup();

        // One element connected while suspended; another inserted later
        // that nothing has picked up yet
        let el = doc.insert_media(MediaElement::video());
        tracker.connect(&el).await;
        let late = doc.insert_media(MediaElement::video());

        gate.arm();
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Past the discovery throttle so the gate's reconcile rescans
        tokio::time::advance(Duration::from_secs(1)).await;

        doc.dispatch_gesture(Gesture::PointerDown);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(tracker.connected_count().await, 2);
        let ctx = graph.peek_context().await.unwrap();
        assert!(ctx.is_wired(late.id()));
        assert_eq!(ctx.state(), ContextState::Running);
    }
}
