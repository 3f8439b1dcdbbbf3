//! Loop to keep the vessel snapshot in sync with the vessel source.

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::state::AppState;
use harbor_sdk::{subscribe, VesselLoader};

/// Start the vessel sync loop. Runs until shutdown, then unsubscribes.
pub async fn run_vessel_sync_loop(
    state: Arc<AppState>,
    loader: Arc<VesselLoader>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let period = loader.refresh_interval();
    tracing::info!("Vessel sync every {:?}", period);

    let sync_state = state.clone();
    let subscription = subscribe(loader, period, move |vessels| {
        let count = vessels.len();
        sync_state.replace_vessels(vessels);
        sync_state.refresh();
        tracing::debug!("Synced {} vessels", count);
    });

    let _ = shutdown.recv().await;
    tracing::info!("Vessel sync loop shutting down");
    subscription.unsubscribe();
}

/// Load the first vessel list before serving.
pub async fn initial_load(state: &AppState, loader: &VesselLoader) {
    let vessels = loader.load_vessels().await;
    tracing::info!("Loaded {} vessels", vessels.len());
    state.replace_vessels(vessels);
    state.refresh();
}
