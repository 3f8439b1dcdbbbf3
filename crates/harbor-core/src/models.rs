//! Core data models for the harbor traffic engine.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// A ship tracked by the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vessel {
    pub id: String,
    pub name: String,
    /// Base position, authoritative only at time offset 0
    pub position: Coordinate,
    /// Heading in degrees [0, 360)
    pub heading: f64,
    /// Speed in knots
    pub speed: f64,
    pub destination: String,
    pub destination_coords: Coordinate,
    pub status: VesselStatus,
    #[serde(default)]
    pub estimated_arrival: String,
    /// Path the vessel will traverse. Fewer than 2 points means stationary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Vec<Coordinate>>,
    /// Set only once a route negotiation has been committed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization_mode: Option<OptimizationMode>,
}

impl Vessel {
    /// True when the vessel has a route it can move along.
    pub fn is_underway(&self) -> bool {
        self.route.as_ref().is_some_and(|route| route.len() >= 2)
    }

    /// Copy of this vessel with a committed plan installed as its active route.
    pub fn with_committed_plan(&self, plan: &RoutePlan, mode: OptimizationMode) -> Self {
        let mut vessel = self.clone();
        if !plan.path_points.is_empty() {
            vessel.route = Some(plan.path_points.clone());
        }
        vessel.optimization_mode = Some(mode);
        vessel
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VesselStatus {
    #[default]
    Normal,
    Warning,
    Emergency,
}

/// How a committed route treats its departure time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationMode {
    /// Departure moved to the service's recommendation
    Flexible,
    /// Departure kept as originally requested
    Fixed,
}

impl OptimizationMode {
    pub fn from_acceptance(accept: bool) -> Self {
        if accept {
            Self::Flexible
        } else {
            Self::Fixed
        }
    }

    /// Parse the free-text mode reported by the planning service.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "flexible" => Some(Self::Flexible),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }
}

/// Fixed-size grid cell used for congestion aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CongestionCell {
    pub id: String,
    /// South-west and north-east corners
    pub bounds: [Coordinate; 2],
    pub congestion_level: u8,
    pub ship_count: u32,
}

impl CongestionCell {
    /// Inclusive point-in-rectangle test.
    pub fn contains(&self, point: Coordinate) -> bool {
        let [sw, ne] = self.bounds;
        point[0] >= sw[0] && point[0] <= ne[0] && point[1] >= sw[1] && point[1] <= ne[1]
    }

    pub fn center(&self) -> Coordinate {
        crate::geo::midpoint(self.bounds[0], self.bounds[1])
    }
}

/// One leg of a planned route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub start_point: Coordinate,
    pub end_point: Coordinate,
    pub speed_knots: f64,
    pub duration_minutes: f64,
    pub distance_nm: f64,
}

/// Route plan returned by the planning service.
///
/// On the wire `path_points` and segment endpoints are in service units; the
/// planning client converts them to geographic coordinates before handing the
/// plan out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub ship_id: String,
    /// Minutes from now
    pub recommended_departure: f64,
    /// Minutes from now
    pub arrival_time: f64,
    #[serde(default)]
    pub path_points: Vec<Coordinate>,
    #[serde(default)]
    pub segments: Vec<RouteSegment>,
    #[serde(default)]
    pub total_distance_nm: f64,
    #[serde(default)]
    pub total_duration_minutes: f64,
    #[serde(default)]
    pub optimization_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_saved_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detour_distance_nm: Option<f64>,
}

/// Phase 1 request body (`POST /route/plan`), coordinates in service units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlanRequest {
    pub ship_id: String,
    pub start_position: Coordinate,
    pub goal_position: Coordinate,
    pub departure_time: f64,
    pub speed_knots: f64,
}

/// Phase 2 request body (`POST /route/accept`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAcceptance {
    pub ship_id: String,
    pub accept: bool,
}

/// Server-side view of a tracked vessel (`GET /ships`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStatus {
    pub ship_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_position: Option<Coordinate>,
    #[serde(default)]
    pub departure_time: f64,
    #[serde(default)]
    pub arrival_time: f64,
    #[serde(default)]
    pub path_points: Vec<Coordinate>,
    #[serde(default)]
    pub optimization_mode: Option<String>,
}
