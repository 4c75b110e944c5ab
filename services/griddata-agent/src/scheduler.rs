//! Periodic refresh loop with non-overlapping cycles.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use griddata_core::ObservationCoordinator;

/// Run refresh cycles until shutdown.
///
/// The coordinator is owned here and `refresh` is awaited inside the loop,
/// so cycles are serialized by construction. A tick that lands while a
/// cycle is still in flight is skipped rather than queued
/// (`MissedTickBehavior::Skip`); an in-flight cycle always runs to
/// completion before the shutdown signal is observed.
pub async fn run_forever(
    mut coordinator: ObservationCoordinator,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick fires immediately; the startup refresh already ran.
    ticker.tick().await;

    info!(interval_secs = interval.as_secs(), "Starting refresh loop");

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("Shutting down refresh loop");
                break;
            }
            _ = ticker.tick() => {
                debug!("Running scheduled refresh");
                coordinator.refresh().await;
            }
        }
    }
}
