//! Background auto-advance monitor
//!
//! The engine never calls back when a stream ends; it only edits the
//! shared records. This task polls the orchestrator on a fixed interval
//! so completions turn into the next handoff without user input.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{info, warn};

use super::orchestrator::{Orchestrator, TickOutcome};

/// Start the advance monitor task
pub fn start_monitor(orchestrator: Arc<Orchestrator>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(advance_task(orchestrator, interval))
}

/// Advance check task - one poll per interval
async fn advance_task(orchestrator: Arc<Orchestrator>, period: Duration) {
    let mut interval = time::interval(period);

    info!("Advance monitor started ({}ms interval)", period.as_millis());

    loop {
        interval.tick().await;

        match orchestrator.poll_advance().await {
            Ok(TickOutcome::Started(current)) => {
                info!(
                    "Advanced to \"{}\" [{}]",
                    current.track.title, current.token
                );
            }
            Ok(TickOutcome::Drained) => {
                info!("Playback finished and queue is empty");
            }
            Ok(TickOutcome::Unavailable) => {
                warn!("No engine status available; holding playback state");
            }
            Ok(TickOutcome::Idle) | Ok(TickOutcome::Playing) => {}
            // Transient store or engine faults heal on a later tick.
            Err(e) => warn!("Advance tick failed: {}", e),
        }
    }
}
