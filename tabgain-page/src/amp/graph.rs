//! Amplification graph manager
//!
//! Owns the page's one audio context and gain node. Creation is lazy
//! (first volume set or discovery event) and the created-or-failed
//! outcome is cached: a page without audio capability degrades to inert
//! amplification instead of retrying or crashing.

use crate::audio::{AudioContext, ContextState};
use crate::error::{Error, Result};
use crate::page::{Document, MediaElement};
use crate::state::SessionState;
use std::sync::Arc;
use tabgain_common::events::TabgainEvent;
use tabgain_common::params;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Cached context creation outcome
enum ContextSlot {
    Untried,
    Unavailable,
    Ready(Arc<AudioContext>),
}

/// Manager for the page's amplification graph
pub struct AmpGraph {
    document: Arc<Document>,
    state: Arc<SessionState>,
    context: Mutex<ContextSlot>,
    /// Serializes resume attempts so a concurrent caller observes the
    /// in-flight transition instead of re-invoking the platform
    resume_lock: Mutex<()>,
}

impl AmpGraph {
    pub fn new(document: Arc<Document>, state: Arc<SessionState>) -> Self {
        Self {
            document,
            state,
            context: Mutex::new(ContextSlot::Untried),
            resume_lock: Mutex::new(()),
        }
    }

    /// Ensure the context + gain node exist
    ///
    /// Idempotent. Returns whether a usable context exists; a capability
    /// failure is cached and reported on every later call.
    pub async fn ensure_context(&self) -> bool {
        self.context_handle().await.is_some()
    }

    /// Get (creating if needed) the audio context
    pub(crate) async fn context_handle(&self) -> Option<Arc<AudioContext>> {
        let mut slot = self.context.lock().await;
        match &*slot {
            ContextSlot::Ready(ctx) => Some(Arc::clone(ctx)),
            ContextSlot::Unavailable => None,
            ContextSlot::Untried => {
                if !self.document.audio_supported() {
                    warn!("Page has no audio-processing capability; amplification disabled");
                    *slot = ContextSlot::Unavailable;
                    return None;
                }
                let ctx = Arc::new(AudioContext::new(self.document.activation_flag()));
                // A context created mid-session must pick up the current target
                ctx.gain()
                    .set_target_at_time(self.state.target_volume().await, params::GAIN_SMOOTHING);
                debug!(state = %ctx.state(), "Created audio context");
                self.state.broadcast(TabgainEvent::ContextStateChanged {
                    state: ctx.state().to_string(),
                    timestamp: chrono::Utc::now(),
                });
                *slot = ContextSlot::Ready(Arc::clone(&ctx));
                Some(ctx)
            }
        }
    }

    /// Get the context only if it was already created
    pub async fn peek_context(&self) -> Option<Arc<AudioContext>> {
        match &*self.context.lock().await {
            ContextSlot::Ready(ctx) => Some(Arc::clone(ctx)),
            _ => None,
        }
    }

    /// Human-readable context lifecycle label for diagnostics
    pub async fn context_state_label(&self) -> &'static str {
        match &*self.context.lock().await {
            ContextSlot::Untried => "uninitialized",
            ContextSlot::Unavailable => "unavailable",
            ContextSlot::Ready(ctx) => ctx.state().as_str(),
        }
    }

    /// Update the target volume
    ///
    /// Clamps to [0.0, 5.0], records the target (even while suspended or
    /// without a context), applies the gain with the smoothing constant,
    /// and schedules a resume if the context is suspended. Returns the
    /// applied value.
    pub async fn set_target(self: &Arc<Self>, volume: f32) -> f32 {
        let applied = self.state.set_target_volume(volume).await;
        self.state.broadcast(TabgainEvent::VolumeChanged {
            volume: applied,
            timestamp: chrono::Utc::now(),
        });

        if let Some(ctx) = self.context_handle().await {
            ctx.gain().set_target_at_time(applied, params::GAIN_SMOOTHING);
            if ctx.state() == ContextState::Suspended {
                let graph = Arc::clone(self);
                tokio::spawn(async move {
                    graph.resume_if_suspended().await;
                });
            }
        }
        applied
    }

    /// Resume the context if it is suspended
    ///
    /// Idempotent and safe to call redundantly from multiple triggers.
    /// Returns whether the context is running afterwards.
    pub async fn resume_if_suspended(&self) -> bool {
        let _guard = self.resume_lock.lock().await;

        let Some(ctx) = self.context_handle().await else {
            return false;
        };
        match ctx.state() {
            ContextState::Running => true,
            ContextState::Closed => false,
            ContextState::Suspended => match ctx.resume().await {
                Ok(()) => {
                    debug!("Audio context resumed");
                    self.state.broadcast(TabgainEvent::ContextStateChanged {
                        state: ContextState::Running.to_string(),
                        timestamp: chrono::Utc::now(),
                    });
                    true
                }
                Err(e) => {
                    // Target volume stays recorded; a later resume applies it
                    warn!("Audio context resume rejected: {}", e);
                    false
                }
            },
        }
    }

    /// Wire an element into the graph at the current target volume
    ///
    /// The target is read at connection time, never captured earlier, so
    /// the last-applied volume always wins.
    pub(crate) async fn connect_element(&self, element: &Arc<MediaElement>) -> Result<()> {
        let ctx = self
            .context_handle()
            .await
            .ok_or(Error::AudioUnavailable)?;
        ctx.connect_source(element)?;
        ctx.gain()
            .set_target_at_time(self.state.target_volume().await, params::GAIN_SMOOTHING);
        Ok(())
    }

    /// Release the context on teardown
    pub async fn close(&self) {
        if let Some(ctx) = self.peek_context().await {
            if let Err(e) = ctx.close().await {
                warn!("Failed to close audio context: {}", e);
            }
            self.state.broadcast(TabgainEvent::ContextStateChanged {
                state: ContextState::Closed.to_string(),
                timestamp: chrono::Utc::now(),
            });
        }
    }
}
