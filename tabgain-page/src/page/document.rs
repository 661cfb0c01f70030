//! Document model
//!
//! Owns the page's media elements, broadcasts structural mutation
//! records and user gestures, and tracks the user-activation flag the
//! autoplay policy keys on.

use super::element::MediaElement;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use uuid::Uuid;

/// A node inserted into the document
///
/// Mutation records carry whole inserted subtrees; playable elements may
/// be direct insertions or descendants of an inserted container.
#[derive(Debug, Clone)]
pub enum DomNode {
    Media(Arc<MediaElement>),
    Container(Vec<DomNode>),
}

impl DomNode {
    /// Collect every playable element in this subtree
    pub fn media_descendants(&self) -> Vec<Arc<MediaElement>> {
        let mut found = Vec::new();
        self.collect_media(&mut found);
        found
    }

    fn collect_media(&self, found: &mut Vec<Arc<MediaElement>>) {
        match self {
            DomNode::Media(el) => found.push(Arc::clone(el)),
            DomNode::Container(children) => {
                for child in children {
                    child.collect_media(found);
                }
            }
        }
    }
}

/// One batch of structural document changes
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub added: Vec<DomNode>,
}

impl MutationRecord {
    /// Playable elements in this record, direct or nested
    pub fn added_media(&self) -> Vec<Arc<MediaElement>> {
        self.added
            .iter()
            .flat_map(|node| node.media_descendants())
            .collect()
    }
}

/// A qualifying user gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Click,
    KeyDown,
    PointerDown,
    TouchStart,
}

impl Gesture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::Click => "click",
            Gesture::KeyDown => "keydown",
            Gesture::PointerDown => "pointerdown",
            Gesture::TouchStart => "touchstart",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "click" => Some(Gesture::Click),
            "keydown" => Some(Gesture::KeyDown),
            "pointerdown" => Some(Gesture::PointerDown),
            "touchstart" => Some(Gesture::TouchStart),
            _ => None,
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The page document
pub struct Document {
    hostname: String,
    audio_supported: bool,
    elements: RwLock<Vec<Arc<MediaElement>>>,
    mutations: broadcast::Sender<MutationRecord>,
    gestures: broadcast::Sender<Gesture>,
    activated: Arc<AtomicBool>,
}

impl Document {
    /// Create a document for the given hostname
    pub fn new(hostname: &str) -> Self {
        let (mutations, _) = broadcast::channel(64);
        let (gestures, _) = broadcast::channel(16);
        Self {
            hostname: tabgain_common::params::normalize_hostname(hostname),
            audio_supported: true,
            elements: RwLock::new(Vec::new()),
            mutations,
            gestures,
            activated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Override audio-processing capability (builder form)
    ///
    /// Pages without audio support degrade to inert amplification.
    pub fn with_audio_support(mut self, supported: bool) -> Self {
        self.audio_supported = supported;
        self
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn audio_supported(&self) -> bool {
        self.audio_supported
    }

    /// Insert a subtree and broadcast a mutation record for it
    pub fn insert(&self, node: DomNode) {
        let media = node.media_descendants();
        if !media.is_empty() {
            self.elements.write().unwrap().extend(media);
        }
        // No observer yet is fine
        let _ = self.mutations.send(MutationRecord { added: vec![node] });
    }

    /// Insert a single media element and return the owning handle
    pub fn insert_media(&self, element: MediaElement) -> Arc<MediaElement> {
        let el = Arc::new(element);
        self.insert(DomNode::Media(Arc::clone(&el)));
        el
    }

    /// Remove an element from the document
    ///
    /// Removal does not produce a mutation record; the engine notices
    /// detached elements when it reconciles.
    pub fn remove(&self, id: Uuid) -> bool {
        let mut elements = self.elements.write().unwrap();
        if let Some(pos) = elements.iter().position(|el| el.id() == id) {
            let el = elements.remove(pos);
            el.mark_detached();
            true
        } else {
            false
        }
    }

    /// All playable elements currently attached
    pub fn media_elements(&self) -> Vec<Arc<MediaElement>> {
        self.elements.read().unwrap().clone()
    }

    /// Whether an element with this identity is attached
    pub fn contains(&self, id: Uuid) -> bool {
        self.elements.read().unwrap().iter().any(|el| el.id() == id)
    }

    /// Dispatch a user gesture
    ///
    /// The activation flag is set before listeners run so a resume
    /// triggered by this gesture is already allowed.
    pub fn dispatch_gesture(&self, gesture: Gesture) {
        self.activated.store(true, Ordering::SeqCst);
        let _ = self.gestures.send(gesture);
    }

    /// Whether a qualifying gesture has been seen
    pub fn is_activated(&self) -> bool {
        self.activated.load(Ordering::SeqCst)
    }

    /// Shared handle to the activation flag (for the audio context)
    pub fn activation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.activated)
    }

    /// Subscribe to structural mutation records
    pub fn subscribe_mutations(&self) -> broadcast::Receiver<MutationRecord> {
        self.mutations.subscribe()
    }

    /// Subscribe to user gestures
    pub fn subscribe_gestures(&self) -> broadcast::Receiver<Gesture> {
        self.gestures.subscribe()
    }
}
