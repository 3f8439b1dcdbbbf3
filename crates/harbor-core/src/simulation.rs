//! One tick of the pipeline: projection → congestion → clustering.

use serde::{Deserialize, Serialize};

use crate::clustering::{cluster_positions, Cluster, DEFAULT_MAX_DISTANCE_DEG};
use crate::congestion::{CongestionGrid, GridError};
use crate::geo::Coordinate;
use crate::heatmap::{heatmap_points, HeatmapPoint};
use crate::models::{CongestionCell, Vessel};
use crate::ports::GURYONGPO;
use crate::projection::{project_all, ProjectedVessel};

pub const DEFAULT_GRID_RADIUS_DEG: f64 = 0.09;
pub const DEFAULT_GRID_CELL_DEG: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Reference point the congestion grid is centered on
    pub center: Coordinate,
    pub grid_radius_deg: f64,
    pub grid_cell_deg: f64,
    pub cluster_distance_deg: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            center: GURYONGPO.coordinates,
            grid_radius_deg: DEFAULT_GRID_RADIUS_DEG,
            grid_cell_deg: DEFAULT_GRID_CELL_DEG,
            cluster_distance_deg: DEFAULT_MAX_DISTANCE_DEG,
        }
    }
}

/// Everything the rendering layer needs for one time offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub time_offset: f64,
    pub positions: Vec<ProjectedVessel>,
    pub cells: Vec<CongestionCell>,
    pub clusters: Vec<Cluster>,
    pub heatmap: Vec<HeatmapPoint>,
}

#[derive(Debug, Clone)]
pub struct Simulation {
    grid: CongestionGrid,
    cluster_distance_deg: f64,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self, GridError> {
        let grid = CongestionGrid::initialize(config.center, config.grid_radius_deg, config.grid_cell_deg)?;
        Ok(Self {
            grid,
            cluster_distance_deg: config.cluster_distance_deg,
        })
    }

    pub fn grid(&self) -> &CongestionGrid {
        &self.grid
    }

    pub fn cluster_distance_deg(&self) -> f64 {
        self.cluster_distance_deg
    }

    /// Run one tick. Positions are projected once and shared by every stage.
    pub fn tick(&mut self, vessels: &[Vessel], time_offset: f64) -> TickSnapshot {
        let positions = project_all(vessels, time_offset);
        let cells = self
            .grid
            .update_positions(positions.iter().map(|p| p.position))
            .to_vec();
        let clusters = cluster_positions(&positions, self.cluster_distance_deg);
        let heatmap = heatmap_points(vessels, &positions);

        TickSnapshot {
            time_offset,
            positions,
            cells,
            clusters,
            heatmap,
        }
    }
}
