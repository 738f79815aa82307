//! Queue coordination and playback orchestration

pub mod current;
pub mod monitor;
pub mod orchestrator;
pub mod queue;
pub mod status;

pub use current::CurrentPlayback;
pub use monitor::start_monitor;
pub use orchestrator::{Enqueued, Orchestrator, QueueSummary, TickOutcome};
pub use queue::{PlayHistory, TrackQueue};
pub use status::PlayerStatusMirror;
