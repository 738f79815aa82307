//! REST API for the juke orchestrator
//!
//! Exposes queue and playback control plus the attachment cache gate
//! over HTTP, and streams orchestration events over SSE.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{router, AppContext};
