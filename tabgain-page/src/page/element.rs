//! Media elements
//!
//! A playable node (audio or video) owned by the document. The engine
//! annotates connection status externally; the element itself only
//! carries identity, its local volume, and the cross-origin taint that
//! makes graph wiring fail.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// Kind of playable element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Audio,
    Video,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Audio => "audio",
            ElementKind::Video => "video",
        }
    }

    /// Parse a kind from its tag name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "audio" => Some(ElementKind::Audio),
            "video" => Some(ElementKind::Video),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A playable media element
///
/// Local volume follows platform semantics: clamped to [0.0, 1.0].
/// Amplification beyond that ceiling happens in the graph, never here.
pub struct MediaElement {
    id: Uuid,
    kind: ElementKind,
    cross_origin: bool,
    volume: Mutex<f32>,
    detached: AtomicBool,
}

impl MediaElement {
    /// Create an audio element
    pub fn audio() -> Self {
        Self::new(ElementKind::Audio)
    }

    /// Create a video element
    pub fn video() -> Self {
        Self::new(ElementKind::Video)
    }

    fn new(kind: ElementKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            cross_origin: false,
            volume: Mutex::new(1.0),
            detached: AtomicBool::new(false),
        }
    }

    /// Mark the element as serving cross-origin media without CORS
    ///
    /// Wiring a tainted element into the graph is refused by the
    /// platform.
    pub fn with_cross_origin(mut self) -> Self {
        self.cross_origin = true;
        self
    }

    /// Set the initial local volume (builder form)
    pub fn with_volume(self, volume: f32) -> Self {
        self.set_volume(volume);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn is_cross_origin(&self) -> bool {
        self.cross_origin
    }

    /// Current local volume (0.0-1.0)
    pub fn volume(&self) -> f32 {
        *self.volume.lock().unwrap()
    }

    /// Set the local volume, clamped to the native [0.0, 1.0] ceiling
    pub fn set_volume(&self, volume: f32) {
        *self.volume.lock().unwrap() = volume.clamp(0.0, 1.0);
    }

    /// Whether the element has been removed from its document
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_detached(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }
}

impl fmt::Debug for MediaElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaElement")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("cross_origin", &self.cross_origin)
            .field("volume", &self.volume())
            .field("detached", &self.is_detached())
            .finish()
    }
}
