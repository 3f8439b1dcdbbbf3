//! Greedy proximity clustering of projected vessel positions.
//!
//! Single pass in input order: the first unassigned vessel seeds a cluster and
//! absorbs every remaining unassigned vessel within the threshold of the seed.
//! Distance is measured to the seed only, so two members may be farther apart
//! than the threshold. Results are order dependent. O(n²).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::geo::{euclidean_distance, Coordinate};
use crate::models::Vessel;
use crate::projection::{project_all, ProjectedVessel};

/// Default clustering threshold in degrees.
pub const DEFAULT_MAX_DISTANCE_DEG: f64 = 0.02;
/// Display scale applied to raw density.
pub const DENSITY_SCALE: f64 = 1000.0;

/// A group of nearby vessels for one tick. Has no identity across ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Mean of member positions
    pub center: Coordinate,
    /// Member vessel ids, seed first
    pub members: Vec<String>,
    /// Members per unit area (degrees²), scaled by [`DENSITY_SCALE`]
    pub density: f64,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Project `vessels` at `time_offset` and cluster the result.
pub fn cluster(vessels: &[Vessel], time_offset: f64, max_distance: f64) -> Vec<Cluster> {
    cluster_positions(&project_all(vessels, time_offset), max_distance)
}

/// Cluster already projected vessels.
///
/// A non-positive threshold only groups exactly co-located vessels and
/// reports a density of zero.
pub fn cluster_positions(projected: &[ProjectedVessel], max_distance: f64) -> Vec<Cluster> {
    let mut clusters = Vec::new();
    let mut assigned = vec![false; projected.len()];
    let area = PI * max_distance * max_distance;

    for seed_idx in 0..projected.len() {
        if assigned[seed_idx] {
            continue;
        }
        assigned[seed_idx] = true;
        let seed = &projected[seed_idx];
        let mut member_idx = vec![seed_idx];

        for (other_idx, other) in projected.iter().enumerate().skip(seed_idx + 1) {
            if assigned[other_idx] {
                continue;
            }
            if euclidean_distance(seed.position, other.position) <= max_distance {
                assigned[other_idx] = true;
                member_idx.push(other_idx);
            }
        }

        let count = member_idx.len() as f64;
        let (sum_lon, sum_lat) = member_idx.iter().fold((0.0, 0.0), |acc, &idx| {
            (acc.0 + projected[idx].position[0], acc.1 + projected[idx].position[1])
        });
        let density = if area > 0.0 {
            count / area * DENSITY_SCALE
        } else {
            0.0
        };

        clusters.push(Cluster {
            center: [sum_lon / count, sum_lat / count],
            members: member_idx.iter().map(|&idx| projected[idx].id.clone()).collect(),
            density,
        });
    }

    clusters
}
