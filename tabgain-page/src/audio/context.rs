//! Audio context lifecycle
//!
//! One context per page. A context created before the first qualifying
//! gesture starts Suspended per autoplay policy, and resume attempts are
//! rejected until the page is activated. Each media element may be wired
//! into the context at most once; a second wiring attempt errors, as
//! does wiring tainted cross-origin media.

use crate::audio::gain::GainNode;
use crate::error::{Error, Result};
use crate::page::MediaElement;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Lifecycle states of the audio context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Created but not yet allowed to process audio
    Suspended,
    /// Actively processing
    Running,
    /// Released; no further processing possible
    Closed,
}

impl ContextState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextState::Suspended => "suspended",
            ContextState::Running => "running",
            ContextState::Closed => "closed",
        }
    }
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The page's audio-processing context
pub struct AudioContext {
    state: Mutex<ContextState>,
    gain: GainNode,
    activation: Arc<AtomicBool>,
    wired: Mutex<HashSet<Uuid>>,
    resume_calls: AtomicU64,
}

impl AudioContext {
    /// Create a context under the page's activation flag
    ///
    /// A context created after activation starts Running directly;
    /// otherwise it starts Suspended.
    pub fn new(activation: Arc<AtomicBool>) -> Self {
        let initial = if activation.load(Ordering::SeqCst) {
            ContextState::Running
        } else {
            ContextState::Suspended
        };
        Self {
            state: Mutex::new(initial),
            gain: GainNode::new(1.0),
            activation,
            wired: Mutex::new(HashSet::new()),
            resume_calls: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> ContextState {
        *self.state.lock().unwrap()
    }

    /// The shared gain stage
    pub fn gain(&self) -> &GainNode {
        &self.gain
    }

    /// Attempt to resume a suspended context
    ///
    /// Completion is observed asynchronously. Rejected while the page
    /// has not seen a qualifying gesture; the context stays Suspended.
    pub async fn resume(&self) -> Result<()> {
        match self.state() {
            ContextState::Closed => return Err(Error::ContextClosed),
            ContextState::Running => return Ok(()),
            ContextState::Suspended => {}
        }

        self.resume_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if self.activation.load(Ordering::SeqCst) {
            let mut state = self.state.lock().unwrap();
            // A close that raced the resume wins
            if *state == ContextState::Closed {
                return Err(Error::ContextClosed);
            }
            *state = ContextState::Running;
            Ok(())
        } else {
            Err(Error::AutoplayBlocked)
        }
    }

    /// Release the context
    pub async fn close(&self) -> Result<()> {
        tokio::task::yield_now().await;
        *self.state.lock().unwrap() = ContextState::Closed;
        self.wired.lock().unwrap().clear();
        Ok(())
    }

    /// Wire a media element into the graph
    ///
    /// Errors if the context is closed, the element is detached or
    /// tainted, or the element already has a source.
    pub fn connect_source(&self, element: &Arc<MediaElement>) -> Result<()> {
        if self.state() == ContextState::Closed {
            return Err(Error::ContextClosed);
        }
        if element.is_detached() {
            return Err(Error::ElementDetached(element.id()));
        }
        if element.is_cross_origin() {
            return Err(Error::MediaTainted(element.id()));
        }

        let mut wired = self.wired.lock().unwrap();
        if !wired.insert(element.id()) {
            return Err(Error::AlreadyWired(element.id()));
        }
        Ok(())
    }

    /// Whether this element already has a source in the graph
    pub fn is_wired(&self, id: Uuid) -> bool {
        self.wired.lock().unwrap().contains(&id)
    }

    /// Number of elements wired into the graph
    pub fn wired_count(&self) -> usize {
        self.wired.lock().unwrap().len()
    }

    /// How many times the platform resume primitive has been invoked
    pub fn resume_call_count(&self) -> u64 {
        self.resume_calls.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activation(active: bool) -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(active))
    }

    #[tokio::test]
    async fn test_starts_suspended_before_activation() {
        let ctx = AudioContext::new(activation(false));
        assert_eq!(ctx.state(), ContextState::Suspended);
    }

    #[tokio::test]
    async fn test_starts_running_after_activation() {
        let ctx = AudioContext::new(activation(true));
        assert_eq!(ctx.state(), ContextState::Running);
    }

    #[tokio::test]
    async fn test_resume_blocked_without_gesture() {
        let ctx = AudioContext::new(activation(false));

        let err = ctx.resume().await.unwrap_err();
        assert!(matches!(err, Error::AutoplayBlocked));
        assert_eq!(ctx.state(), ContextState::Suspended);
        assert_eq!(ctx.resume_call_count(), 1);
    }

    #[tokio::test]
    async fn test_resume_after_activation() {
        let flag = activation(false);
        let ctx = AudioContext::new(Arc::clone(&flag));

        flag.store(true, Ordering::SeqCst);
        ctx.resume().await.unwrap();
        assert_eq!(ctx.state(), ContextState::Running);

        // Resuming a running context is a no-op, not a platform call
        ctx.resume().await.unwrap();
        assert_eq!(ctx.resume_call_count(), 1);
    }

    #[tokio::test]
    async fn test_resume_after_close_fails() {
        let ctx = AudioContext::new(activation(true));
        ctx.close().await.unwrap();
        assert!(matches!(ctx.resume().await.unwrap_err(), Error::ContextClosed));
    }

    #[tokio::test]
    async fn test_connect_source_once() {
        let ctx = AudioContext::new(activation(true));
        let el = Arc::new(crate::page::MediaElement::video());

        ctx.connect_source(&el).unwrap();
        assert!(ctx.is_wired(el.id()));

        let err = ctx.connect_source(&el).unwrap_err();
        assert!(matches!(err, Error::AlreadyWired(id) if id == el.id()));
        assert_eq!(ctx.wired_count(), 1);
    }

    #[tokio::test]
    async fn test_connect_tainted_refused() {
        let ctx = AudioContext::new(activation(true));
        let el = Arc::new(crate::page::MediaElement::video().with_cross_origin());

        let err = ctx.connect_source(&el).unwrap_err();
        assert!(matches!(err, Error::MediaTainted(_)));
        assert!(!ctx.is_wired(el.id()));
    }
}
