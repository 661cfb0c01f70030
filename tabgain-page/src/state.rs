//! Shared session state
//!
//! The single owned state value for one page: the current target volume
//! and the event broadcaster. Constructed once at session initialization
//! and passed by `Arc` to each component, so there is exactly one source
//! of truth per page and no process-wide singleton.

use tabgain_common::events::{EventBus, TabgainEvent};
use tabgain_common::params;
use tokio::sync::RwLock;

/// State shared by all engine components
///
/// Uses RwLock for concurrent read access with rare writes.
pub struct SessionState {
    /// Target volume as a gain factor (0.0-5.0, 1.0 = 100%)
    target_volume: RwLock<f32>,

    /// Event broadcaster for SSE and internal listeners
    events: EventBus,
}

impl SessionState {
    /// Create session state seeded with an initial target volume
    ///
    /// The seed comes from the per-hostname store (default 100%).
    pub fn new(seed_volume: f32) -> Self {
        Self {
            target_volume: RwLock::new(params::clamp_volume(seed_volume)),
            events: EventBus::new(100),
        }
    }

    /// Get the current target volume (gain factor)
    pub async fn target_volume(&self) -> f32 {
        *self.target_volume.read().await
    }

    /// Set the target volume, clamped to the supported range
    ///
    /// Returns the applied value.
    pub async fn set_target_volume(&self, volume: f32) -> f32 {
        let clamped = params::clamp_volume(volume);
        *self.target_volume.write().await = clamped;
        clamped
    }

    /// Broadcast an event to all listeners
    pub fn broadcast(&self, event: TabgainEvent) {
        // No subscribers is fine
        self.events.emit_lossy(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<TabgainEvent> {
        self.events.subscribe()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(params::DEFAULT_VOLUME)
    }
}
