pub mod clock;
pub mod clustering;
pub mod congestion;
pub mod geo;
pub mod heatmap;
pub mod models;
pub mod negotiation;
pub mod ports;
pub mod projection;
pub mod simulation;

pub use clock::{ClockState, SimulationClock};
pub use clustering::{cluster, cluster_positions, Cluster};
pub use congestion::{congestion_in_bounds, congestion_level, CellKey, CongestionGrid, GridError};
pub use geo::{euclidean_distance, haversine_distance_km, interpolate, quadratic_bezier, Coordinate};
pub use heatmap::{heatmap_points, HeatmapPoint};
pub use models::{
    CongestionCell, OptimizationMode, RouteAcceptance, RoutePlan, RoutePlanRequest, RouteSegment,
    RouteStatus, Vessel, VesselStatus,
};
pub use negotiation::{NegotiationError, NegotiationState};
pub use ports::{find_port, Port, PORTS};
pub use projection::{
    estimated_arrival_minutes, generate_route, generate_route_with_rng, project_all,
    project_position, ProjectedVessel,
};
pub use simulation::{Simulation, SimulationConfig, TickSnapshot};
