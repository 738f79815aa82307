//! # juke
//!
//! Playback queue orchestrator coordinating an external audio engine
//! through a shared persistent store.
//!
//! **Purpose:** Own the pending-track queue, hand tracks to the engine
//! one at a time, detect completion through an identity-token protocol,
//! and auto-advance. The engine process owns the audio device and the
//! two sides share no memory; every agreement between them lives in the
//! coordination store.
//!
//! **Architecture:** axum HTTP/SSE control surface over a
//! [`playback::Orchestrator`] whose state is entirely store-resident,
//! polled by a background advance monitor.

pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod model;
pub mod playback;
pub mod store;

pub use error::{Error, Result};
