//! Page model
//!
//! The document side of the engine: externally-owned media elements,
//! structural mutation records, and user gestures. The engine only ever
//! holds weak references to elements; the document is the owner.

pub mod document;
pub mod element;

pub use document::{Document, DomNode, Gesture, MutationRecord};
pub use element::{ElementKind, MediaElement};
