//! Harbor Server - Always-on backend for harbor traffic simulation

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use harbor_core::Simulation;
use harbor_sdk::VesselLoader;
use harbor_server::config::Config;
use harbor_server::state::AppState;
use harbor_server::{api, loops};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("harbor_server=debug".parse()?))
        .init();

    tracing::info!("Starting Harbor Server...");

    let config = Config::from_env();
    let simulation = Simulation::new(config.simulation_config())
        .context("Invalid congestion grid configuration")?;
    let planner = config.planning_client();
    if planner.is_some() {
        tracing::info!("Planning service at {}", config.planning_service_url);
    }

    let state = Arc::new(AppState::new(simulation, planner.clone()));
    let loader = Arc::new(VesselLoader::from_path(&config.fixture_path, planner));
    loops::vessel_sync_loop::initial_load(&state, &loader).await;

    // Start background loops
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let tick_handle = tokio::spawn(loops::tick_loop::run_tick_loop(
        state.clone(),
        config.frame_interval(),
        shutdown_tx.subscribe(),
    ));
    let sync_handle = tokio::spawn(loops::vessel_sync_loop::run_vessel_sync_loop(
        state.clone(),
        loader,
        shutdown_tx.subscribe(),
    ));

    // Build the app
    let app = api::routes()
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(());
    let _ = tokio::join!(tick_handle, sync_handle);
    Ok(())
}
