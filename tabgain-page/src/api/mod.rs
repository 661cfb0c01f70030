//! HTTP command surface
//!
//! REST + SSE interface the popup collaborator drives: volume get/set,
//! session diagnostics, the event stream, and a developer harness for
//! driving the page model.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, AppContext};
