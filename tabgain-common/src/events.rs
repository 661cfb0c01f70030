//! Event types for the tabgain event system
//!
//! The engine uses hybrid communication:
//! - **EventBus** (tokio::broadcast): one-to-many event broadcasting
//! - **Shared state** (Arc + tokio sync): read-heavy access
//!
//! Events are serde-serializable so the API layer can stream them to
//! connected clients over SSE.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Tabgain event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TabgainEvent {
    /// Target volume changed (gain factor, 1.0 = 100%)
    VolumeChanged {
        volume: f32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Audio context transitioned between lifecycle states
    ContextStateChanged {
        state: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A media element was wired into the amplification graph
    ElementConnected {
        element_id: Uuid,
        kind: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Wiring a media element failed; it stays at native volume
    ElementConnectionFailed {
        element_id: Uuid,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// First qualifying user gesture was observed
    PageActivated {
        gesture: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session torn down; context released, element state restored
    SessionClosed {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl TabgainEvent {
    /// Event type name used as the SSE event field
    pub fn event_type(&self) -> &'static str {
        match self {
            TabgainEvent::VolumeChanged { .. } => "VolumeChanged",
            TabgainEvent::ContextStateChanged { .. } => "ContextStateChanged",
            TabgainEvent::ElementConnected { .. } => "ElementConnected",
            TabgainEvent::ElementConnectionFailed { .. } => "ElementConnectionFailed",
            TabgainEvent::PageActivated { .. } => "PageActivated",
            TabgainEvent::SessionClosed { .. } => "SessionClosed",
        }
    }
}

/// One-to-many event broadcaster
///
/// Thin wrapper over tokio::broadcast. Emission never blocks; slow
/// subscribers lag and drop old events rather than stalling the
/// engine.
pub struct EventBus {
    tx: broadcast::Sender<TabgainEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus buffering up to `capacity` events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<TabgainEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns an error when no subscriber is listening.
    pub fn emit(
        &self,
        event: TabgainEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<TabgainEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the no-subscriber case
    pub fn emit_lossy(&self, event: TabgainEvent) {
        let _ = self.tx.send(event);
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
