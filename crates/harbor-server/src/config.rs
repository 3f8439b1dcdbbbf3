//! Server configuration from environment.

use std::env;
use std::time::Duration;

use harbor_core::clustering::DEFAULT_MAX_DISTANCE_DEG;
use harbor_core::ports::{resolve_destination, GURYONGPO};
use harbor_core::simulation::{DEFAULT_GRID_CELL_DEG, DEFAULT_GRID_RADIUS_DEG};
use harbor_core::SimulationConfig;
use harbor_sdk::{PlanningClient, DEFAULT_SERVICE_URL};

const DEFAULT_FIXTURE_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/vessels.json");

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub planning_service_url: String,
    /// Merge vessels from the planning service and enable plan/accept
    pub use_planning_service: bool,
    pub fixture_path: String,
    /// Display refresh cadence driving the simulation clock
    pub frame_interval_ms: u64,
    pub cluster_distance_deg: f64,
    pub grid_radius_deg: f64,
    pub grid_cell_deg: f64,
    /// Port the congestion grid is centered on
    pub reference_port: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("HARBOR_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            planning_service_url: env::var("PLANNING_SERVICE_URL")
                .unwrap_or_else(|_| DEFAULT_SERVICE_URL.to_string()),
            use_planning_service: env::var("HARBOR_USE_SERVICE")
                .ok()
                .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            fixture_path: env::var("HARBOR_FIXTURE_PATH")
                .unwrap_or_else(|_| DEFAULT_FIXTURE_PATH.to_string()),
            frame_interval_ms: env::var("HARBOR_FRAME_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(16),
            cluster_distance_deg: env::var("HARBOR_CLUSTER_DISTANCE_DEG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_DISTANCE_DEG),
            grid_radius_deg: env::var("HARBOR_GRID_RADIUS_DEG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_GRID_RADIUS_DEG),
            grid_cell_deg: env::var("HARBOR_GRID_CELL_DEG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_GRID_CELL_DEG),
            reference_port: env::var("HARBOR_REFERENCE_PORT")
                .unwrap_or_else(|_| GURYONGPO.name.to_string()),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Grid and clustering parameters. An unknown reference port falls back to Guryongpo.
    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            center: resolve_destination(&self.reference_port, GURYONGPO.coordinates),
            grid_radius_deg: self.grid_radius_deg,
            grid_cell_deg: self.grid_cell_deg,
            cluster_distance_deg: self.cluster_distance_deg,
        }
    }

    pub fn planning_client(&self) -> Option<PlanningClient> {
        self.use_planning_service
            .then(|| PlanningClient::new(self.planning_service_url.clone()))
    }
}
