//! Amplification core
//!
//! The four components that keep a page's media routed through the
//! shared gain stage:
//! - **AmpGraph**: owns the audio context + gain node lifecycle
//! - **MediaTracker**: discovery, connect-exactly-once, reconcile
//! - **MutationWatcher**: debounced batching of inserted elements
//! - **ActivationGate**: single-shot first-gesture recovery

pub mod gate;
pub mod graph;
pub mod tracker;
pub mod watcher;

pub use gate::ActivationGate;
pub use graph::AmpGraph;
pub use tracker::MediaTracker;
pub use watcher::MutationWatcher;
