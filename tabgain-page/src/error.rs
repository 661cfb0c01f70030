//! Error types for tabgain-page
//!
//! Defines engine-specific error types using thiserror for clear error
//! propagation. All failures are absorbed at component boundaries with
//! diagnostic logging; none escape to crash the hosting process.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for the tabgain-page engine
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// The page reports no audio-processing capability
    #[error("Audio processing unavailable on this page")]
    AudioUnavailable,

    /// Resume attempted before the first qualifying user gesture
    #[error("Autoplay policy blocked context resume")]
    AutoplayBlocked,

    /// Operation attempted on a closed audio context
    #[error("Audio context is closed")]
    ContextClosed,

    /// The element already has a source wired into the graph
    #[error("Element {0} is already wired into the graph")]
    AlreadyWired(Uuid),

    /// The platform refuses to route this element (cross-origin taint)
    #[error("Element {0} is tainted by cross-origin media")]
    MediaTainted(Uuid),

    /// The element is no longer attached to the document
    #[error("Element {0} is detached from the document")]
    ElementDetached(Uuid),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the tabgain-page Error
pub type Result<T> = std::result::Result<T, Error>;
