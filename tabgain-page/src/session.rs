//! Page session
//!
//! Wires the amplification components together around one owned
//! session state. Constructed once per page; torn down on unload.

use crate::amp::{ActivationGate, AmpGraph, MediaTracker, MutationWatcher};
use crate::page::Document;
use crate::state::SessionState;
use std::sync::Arc;
use tabgain_common::events::TabgainEvent;
use tokio::sync::broadcast;
use tracing::info;

/// Diagnostic snapshot of a running session
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub hostname: String,
    pub activated: bool,
    pub context_state: String,
    pub target_volume: f32,
    pub connected_elements: usize,
}

/// One page's amplification session
pub struct PageSession {
    document: Arc<Document>,
    state: Arc<SessionState>,
    graph: Arc<AmpGraph>,
    tracker: Arc<MediaTracker>,
    watcher: MutationWatcher,
    gate: ActivationGate,
}

impl PageSession {
    /// Build a session over a document, seeded with the site's saved
    /// volume (gain factor; 1.0 when the site has none)
    pub fn new(document: Arc<Document>, seed_volume: f32) -> Self {
        let state = Arc::new(SessionState::new(seed_volume));
        let graph = Arc::new(AmpGraph::new(Arc::clone(&document), Arc::clone(&state)));
        let tracker = Arc::new(MediaTracker::new(
            Arc::clone(&document),
            Arc::clone(&graph),
            Arc::clone(&state),
        ));
        let watcher = MutationWatcher::new(Arc::clone(&document), Arc::clone(&tracker));
        let gate = ActivationGate::new(
            Arc::clone(&document),
            Arc::clone(&graph),
            Arc::clone(&tracker),
            Arc::clone(&state),
        );
        Self {
            document,
            state,
            graph,
            tracker,
            watcher,
            gate,
        }
    }

    /// Start the session
    ///
    /// Connects the page's existing elements, then arms the mutation
    /// watcher and the activation gate.
    pub async fn start(&self) {
        info!(hostname = %self.document.hostname(), "Starting page session");
        for element in self.tracker.discover().await {
            self.tracker.connect(&element).await;
        }
        self.watcher.observe();
        self.gate.arm();
    }

    /// Apply an external volume request; returns the clamped value
    pub async fn set_volume(&self, volume: f32) -> f32 {
        let applied = self.graph.set_target(volume).await;
        self.tracker.reconcile().await;
        applied
    }

    /// Current target volume (gain factor)
    pub async fn volume(&self) -> f32 {
        self.state.target_volume().await
    }

    /// Subscribe to the session's event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<TabgainEvent> {
        self.state.subscribe()
    }

    /// Diagnostic snapshot for the API layer
    pub async fn status(&self) -> SessionStatus {
        SessionStatus {
            hostname: self.document.hostname().to_string(),
            activated: self.document.is_activated(),
            context_state: self.graph.context_state_label().await.to_string(),
            target_volume: self.state.target_volume().await,
            connected_elements: self.tracker.connected_count().await,
        }
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    /// Tear the session down
    ///
    /// Detaches the observer and the gate, restores element volumes,
    /// and releases the audio context.
    pub async fn shutdown(&self) {
        info!(hostname = %self.document.hostname(), "Shutting down page session");
        self.watcher.disconnect();
        self.gate.disarm();
        self.tracker.restore_all().await;
        self.graph.close().await;
        self.state.broadcast(TabgainEvent::SessionClosed {
            timestamp: chrono::Utc::now(),
        });
    }
}
