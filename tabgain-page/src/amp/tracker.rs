//! Media discovery and connection tracking
//!
//! Finds playable elements, connects each exactly once to the graph,
//! and prunes stale entries. The registry keys on element identity and
//! holds only weak references: the engine is never the reason a
//! detached element cannot be reclaimed.

use crate::amp::graph::AmpGraph;
use crate::page::{Document, MediaElement};
use crate::state::SessionState;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tabgain_common::events::TabgainEvent;
use tabgain_common::params;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// A connected element and the local volume to restore on teardown
struct TrackedElement {
    element: Weak<MediaElement>,
    restore_volume: f32,
}

/// Identity-keyed connection registry
///
/// Lookup only; no iteration-order guarantee. Entries silently vanish
/// when the owning document discards an element.
#[derive(Default)]
struct ConnectionRegistry {
    entries: HashMap<Uuid, TrackedElement>,
}

impl ConnectionRegistry {
    fn contains(&self, id: Uuid) -> bool {
        self.entries.contains_key(&id)
    }

    fn insert(&mut self, element: &Arc<MediaElement>, restore_volume: f32) {
        self.entries.insert(
            element.id(),
            TrackedElement {
                element: Arc::downgrade(element),
                restore_volume,
            },
        );
    }

    /// Drop entries whose element is gone or detached
    fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, tracked| {
            tracked
                .element
                .upgrade()
                .map(|el| !el.is_detached())
                .unwrap_or(false)
        });
        before - self.entries.len()
    }

    /// Live connected elements
    fn live(&self) -> Vec<(Arc<MediaElement>, f32)> {
        self.entries
            .values()
            .filter_map(|t| t.element.upgrade().map(|el| (el, t.restore_volume)))
            .collect()
    }

    fn live_count(&self) -> usize {
        self.entries
            .values()
            .filter(|t| {
                t.element
                    .upgrade()
                    .map(|el| !el.is_detached())
                    .unwrap_or(false)
            })
            .count()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Discovery + connection tracker
pub struct MediaTracker {
    document: Arc<Document>,
    graph: Arc<AmpGraph>,
    state: Arc<SessionState>,
    registry: Mutex<ConnectionRegistry>,
    last_scan: Mutex<Option<Instant>>,
}

impl MediaTracker {
    pub fn new(
        document: Arc<Document>,
        graph: Arc<AmpGraph>,
        state: Arc<SessionState>,
    ) -> Self {
        Self {
            document,
            graph,
            state,
            registry: Mutex::new(ConnectionRegistry::default()),
            last_scan: Mutex::new(None),
        }
    }

    /// Scan the document for untracked playable elements
    ///
    /// Throttled: calls within the minimum scan interval return empty
    /// without touching the document.
    pub async fn discover(&self) -> Vec<Arc<MediaElement>> {
        {
            let mut last = self.last_scan.lock().await;
            let now = Instant::now();
            if let Some(prev) = *last {
                if now.duration_since(prev) < params::DISCOVERY_THROTTLE {
                    debug!("Discovery throttled");
                    return Vec::new();
                }
            }
            *last = Some(now);
        }

        let registry = self.registry.lock().await;
        self.document
            .media_elements()
            .into_iter()
            .filter(|el| !registry.contains(el.id()))
            .collect()
    }

    /// Connect an element to the amplification graph
    ///
    /// No-op returning true when already connected. On success the
    /// element's local volume is pinned to 1.0 and all audible scaling
    /// goes through the shared gain. On failure the element is left
    /// unconnected at its prior volume; there is no local-volume
    /// fallback (mixed control paths would double-apply gain).
    pub async fn connect(&self, element: &Arc<MediaElement>) -> bool {
        let mut registry = self.registry.lock().await;
        if registry.contains(element.id()) {
            return true;
        }

        let restore_volume = element.volume();
        element.set_volume(1.0);

        match self.graph.connect_element(element).await {
            Ok(()) => {
                registry.insert(element, restore_volume);
                debug!(element = %element.id(), kind = %element.kind(), "Connected media element");
                self.state.broadcast(TabgainEvent::ElementConnected {
                    element_id: element.id(),
                    kind: element.kind().to_string(),
                    timestamp: chrono::Utc::now(),
                });
                true
            }
            Err(e) => {
                element.set_volume(restore_volume);
                warn!(element = %element.id(), "Failed to connect media element: {}", e);
                self.state.broadcast(TabgainEvent::ElementConnectionFailed {
                    element_id: element.id(),
                    reason: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                false
            }
        }
    }

    /// Prune stale entries, then discover and connect
    ///
    /// Runs on every volume change, on watcher batch flush, and after
    /// activation resume so earlier failures get a second chance.
    pub async fn reconcile(&self) {
        {
            let mut registry = self.registry.lock().await;
            let removed = registry.prune();
            if removed > 0 {
                debug!(removed, "Pruned stale registry entries");
            }
        }

        for element in self.discover().await {
            self.connect(&element).await;
        }
    }

    /// Number of live connected elements
    pub async fn connected_count(&self) -> usize {
        self.registry.lock().await.live_count()
    }

    /// Restore every connected element's pre-pin volume and forget them
    ///
    /// Teardown path; does not await platform calls.
    pub async fn restore_all(&self) {
        let mut registry = self.registry.lock().await;
        for (element, restore_volume) in registry.live() {
            element.set_volume(restore_volume);
        }
        registry.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Gesture;
    use std::time::Duration;

    fn setup() -> (Arc<Document>, Arc<MediaTracker>) {
        let document = Arc::new(Document::new("example.com"));
        let state = Arc::new(SessionState::default());
        let graph = Arc::new(AmpGraph::new(Arc::clone(&document), Arc::clone(&state)));
        let tracker = Arc::new(MediaTracker::new(
            Arc::clone(&document),
            graph,
            state,
        ));
        (document, tracker)
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_idempotent() {
        let (doc, tracker) = setup();
        let el = doc.insert_media(MediaElement::video().with_volume(0.6));

        assert!(tracker.connect(&el).await);
        assert_eq!(el.volume(), 1.0);
        assert_eq!(tracker.connected_count().await, 1);

        // Second connect is a no-op with the same outcome
        assert!(tracker.connect(&el).await);
        assert_eq!(tracker.connected_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failure_leaves_unconnected() {
        let (doc, tracker) = setup();
        let el = doc.insert_media(MediaElement::video().with_cross_origin().with_volume(0.8));

        assert!(!tracker.connect(&el).await);
        assert_eq!(tracker.connected_count().await, 0);

        // No fallback: volume is back at its prior value, not amplified
        assert_eq!(el.volume(), 0.8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_throttled() {
        let (doc, tracker) = setup();
        doc.insert_media(MediaElement::audio());

        assert_eq!(tracker.discover().await.len(), 1);

        // Within the throttle window: no-op even though the DOM changed
        doc.insert_media(MediaElement::audio());
        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(tracker.discover().await.is_empty());

        // Past the window the new element shows up
        tokio::time::advance(Duration::from_millis(400)).await;
        assert_eq!(tracker.discover().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_skips_tracked() {
        let (doc, tracker) = setup();
        let el = doc.insert_media(MediaElement::video());
        tracker.connect(&el).await;

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(tracker.discover().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconcile_connects_at_current_target() {
        let (doc, tracker) = setup();
        tracker.graph.set_target(2.0).await;

        doc.insert_media(MediaElement::video());
        tokio::time::advance(Duration::from_secs(1)).await;
        tracker.reconcile().await;

        assert_eq!(tracker.connected_count().await, 1);
        let ctx = tracker.graph.peek_context().await.unwrap();
        assert_eq!(ctx.gain().target(), 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconcile_prunes_removed_elements() {
        let (doc, tracker) = setup();
        let el = doc.insert_media(MediaElement::video());
        tracker.connect(&el).await;
        assert_eq!(tracker.connected_count().await, 1);

        doc.remove(el.id());
        drop(el);

        tokio::time::advance(Duration::from_secs(1)).await;
        tracker.reconcile().await;
        assert_eq!(tracker.connected_count().await, 0);

        // A distinct re-inserted element is a fresh connection, not a
        // resurrected entry
        let replacement = doc.insert_media(MediaElement::video());
        tokio::time::advance(Duration::from_secs(1)).await;
        tracker.reconcile().await;
        assert_eq!(tracker.connected_count().await, 1);
        let ctx = tracker.graph.peek_context().await.unwrap();
        assert!(ctx.is_wired(replacement.id()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_weakness() {
        let (doc, tracker) = setup();
        let el = doc.insert_media(MediaElement::audio());
        tracker.connect(&el).await;

        // Document discards the element; the registry must not keep it
        // alive
        doc.remove(el.id());
        let weak = Arc::downgrade(&el);
        drop(el);
        assert!(weak.upgrade().is_none());
        assert_eq!(tracker.connected_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_all() {
        let (doc, tracker) = setup();
        doc.dispatch_gesture(Gesture::Click);
        let el = doc.insert_media(MediaElement::video().with_volume(0.4));
        tracker.connect(&el).await;
        assert_eq!(el.volume(), 1.0);

        tracker.restore_all().await;
        assert_eq!(el.volume(), 0.4);
        assert_eq!(tracker.connected_count().await, 0);
    }
}
