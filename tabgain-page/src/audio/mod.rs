//! Platform audio model
//!
//! The audio-processing side the amplification graph drives: a context
//! with a lifecycle state machine governed by the autoplay policy, one
//! gain node into the destination, and per-element source wiring.

pub mod context;
pub mod gain;

pub use context::{AudioContext, ContextState};
pub use gain::GainNode;
