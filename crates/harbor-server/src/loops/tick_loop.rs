//! Frame-driven simulation loop.
//!
//! Each interval is one display frame. The clock decides whether time
//! advances; when it does, the tick pipeline runs and the snapshot is
//! published.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};

use crate::state::AppState;

/// Start the tick loop.
pub async fn run_tick_loop(
    state: Arc<AppState>,
    frame_interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!("Tick loop started ({:?} per frame)", frame_interval);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Tick loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                if state.advance_frame().is_none() {
                    continue;
                }
                let published = state.refresh();
                tracing::debug!(
                    time_offset = published.snapshot.time_offset,
                    vessels = published.vessel_count,
                    clusters = published.snapshot.clusters.len(),
                    "Tick"
                );
            }
        }
    }
}
