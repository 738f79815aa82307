//! Test helper modules for juke integration tests
//!
//! Provides reusable test infrastructure components:
//! - TestRig: orchestrator wired over an in-memory coordination store
//! - FakeEngine: engine double editing the same coordination records the
//!   real engine process would

pub mod fake_engine;
pub mod rig;

// Re-export commonly used types
pub use fake_engine::FakeEngine;
pub use rig::{age_current, test_track, TestRig};
