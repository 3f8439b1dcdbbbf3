//! Plain-text summaries printed by the binaries.

use std::fmt;

use harbor_core::{CongestionCell, RoutePlan, TickSnapshot};
use serde::Serialize;

/// Condensed view of one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSummary {
    pub time_offset: f64,
    pub vessels: usize,
    pub occupied_cells: usize,
    pub peak_level: u8,
    pub clusters: usize,
    pub largest_cluster: usize,
}

impl TickSummary {
    pub fn from_snapshot(snapshot: &TickSnapshot) -> Self {
        let occupied: Vec<&CongestionCell> = snapshot
            .cells
            .iter()
            .filter(|cell| cell.ship_count > 0)
            .collect();

        Self {
            time_offset: snapshot.time_offset,
            vessels: snapshot.positions.len(),
            occupied_cells: occupied.len(),
            peak_level: occupied
                .iter()
                .map(|cell| cell.congestion_level)
                .max()
                .unwrap_or(0),
            clusters: snapshot.clusters.len(),
            largest_cluster: snapshot
                .clusters
                .iter()
                .map(|c| c.size())
                .max()
                .unwrap_or(0),
        }
    }
}

impl fmt::Display for TickSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>6.1}m  vessels={:<3} cells={:<3} peak={:>3}  clusters={:<3} largest={}",
            self.time_offset,
            self.vessels,
            self.occupied_cells,
            self.peak_level,
            self.clusters,
            self.largest_cluster
        )
    }
}

/// The `limit` most congested cells, highest first. Ties keep grid order.
pub fn hotspots(cells: &[CongestionCell], limit: usize) -> Vec<&CongestionCell> {
    let mut occupied: Vec<&CongestionCell> = cells.iter().filter(|c| c.ship_count > 0).collect();
    occupied.sort_by(|a, b| b.congestion_level.cmp(&a.congestion_level));
    occupied.truncate(limit);
    occupied
}

pub fn plan_summary(plan: &RoutePlan, requested_departure: f64) -> String {
    let mut summary = format!(
        "{}: depart {:.1}m (requested {:.1}m), arrive {:.1}m, {:.2} nm over {} points",
        plan.ship_id,
        plan.recommended_departure,
        requested_departure,
        plan.arrival_time,
        plan.total_distance_nm,
        plan.path_points.len()
    );
    if let Some(saved) = plan.time_saved_minutes {
        summary.push_str(&format!(", saves {:.1}m", saved));
    }
    if let Some(detour) = plan.detour_distance_nm {
        summary.push_str(&format!(", detour {:.2} nm", detour));
    }
    summary
}
