//! # Tabgain Page Engine (tabgain-page)
//!
//! Per-page volume amplification engine.
//!
//! **Purpose:** Discover the media elements of a page, splice them into a
//! shared amplification graph (one gain stage into the audio destination),
//! keep the graph intact under document mutation and autoplay suspension,
//! and expose an HTTP/SSE control interface for the popup collaborator.
//!
//! **Architecture:** Owned session state (no hidden singletons) shared by
//! handle between the graph manager, connection tracker, mutation watcher,
//! and activation gate.

pub mod amp;
pub mod api;
pub mod audio;
pub mod db;
pub mod error;
pub mod page;
pub mod session;
pub mod state;

pub use error::{Error, Result};
pub use session::PageSession;
pub use state::SessionState;
