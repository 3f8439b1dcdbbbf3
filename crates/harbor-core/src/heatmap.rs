//! Weighted heatmap points for the rendering layer.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::models::{Vessel, VesselStatus};
use crate::projection::ProjectedVessel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    pub vessel_id: String,
    pub position: Coordinate,
    pub weight: f64,
}

/// Heat contribution of a vessel by status.
pub fn status_weight(status: VesselStatus) -> f64 {
    match status {
        VesselStatus::Normal => 0.5,
        VesselStatus::Warning => 0.75,
        VesselStatus::Emergency => 1.0,
    }
}

/// Pair vessels with their projected positions. Both slices must share order.
pub fn heatmap_points(vessels: &[Vessel], projected: &[ProjectedVessel]) -> Vec<HeatmapPoint> {
    vessels
        .iter()
        .zip(projected)
        .map(|(vessel, projected)| HeatmapPoint {
            vessel_id: vessel.id.clone(),
            position: projected.position,
            weight: status_weight(vessel.status),
        })
        .collect()
}
