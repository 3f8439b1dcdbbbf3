//! REST API routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::{negotiation, ws};
use crate::state::{AppState, PublishedSnapshot};
use harbor_sdk::PlanningError;
use harbor_core::{
    cluster, congestion_in_bounds, estimated_arrival_minutes, project_position, ClockState,
    Cluster, CongestionCell, Coordinate, HeatmapPoint, Port, Vessel, PORTS,
};

pub(crate) type ApiError = (StatusCode, Json<Value>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v1/ports", get(list_ports))
        .route("/v1/vessels", get(list_vessels))
        .route("/v1/vessels/:id", get(get_vessel).delete(delete_vessel))
        .route("/v1/vessels/:id/position", get(vessel_position))
        .route("/v1/snapshot", get(get_snapshot))
        .route("/v1/congestion", get(list_congestion))
        .route("/v1/congestion/bounds", get(bounds_congestion))
        .route("/v1/clusters", get(list_clusters))
        .route("/v1/heatmap", get(list_heatmap))
        // Clock control
        .route("/v1/clock", get(get_clock))
        .route("/v1/clock/start", post(start_clock))
        .route("/v1/clock/stop", post(stop_clock))
        .route("/v1/clock/reset", post(reset_clock))
        .route("/v1/clock/speed", put(set_clock_speed))
        .route("/v1/clock/seek", put(seek_clock))
        // Route negotiation
        .route("/v1/routes/plan", post(negotiation::plan_route))
        .route("/v1/routes/accept", post(negotiation::accept_route))
        .route("/v1/routes/:ship_id", get(negotiation::get_negotiation))
        // WebSocket streaming
        .route("/v1/stream", get(ws::ws_handler))
}

#[derive(Debug, Deserialize)]
pub struct TimeQuery {
    /// Time offset in minutes; defaults to the clock's offset
    pub t: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CongestionQuery {
    /// Only return cells with at least one vessel
    pub occupied: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct BoundsQuery {
    pub sw_lon: f64,
    pub sw_lat: f64,
    pub ne_lon: f64,
    pub ne_lat: f64,
    pub t: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ClusterQuery {
    pub t: Option<f64>,
    pub max_distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SpeedRequest {
    pub speed: f64,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub time_offset: f64,
}

#[derive(Debug, Serialize)]
pub struct VesselPosition {
    pub id: String,
    pub time_offset: f64,
    pub position: Coordinate,
    /// Minutes to the end of the route, if the vessel is underway
    pub arrival_minutes: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct BoundsCongestion {
    pub time_offset: f64,
    pub congestion_level: u8,
}

fn resolve_time(state: &AppState, t: Option<f64>) -> Result<f64, ApiError> {
    match t {
        Some(t) if !t.is_finite() => Err(api_error(StatusCode::BAD_REQUEST, "t must be finite")),
        Some(t) => Ok(t),
        None => Ok(state.time_offset()),
    }
}

async fn list_ports() -> Json<&'static [Port]> {
    Json(PORTS.as_slice())
}

async fn list_vessels(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Vessel>>, ApiError> {
    if !state.vessels_loaded() {
        return Err(api_error(StatusCode::SERVICE_UNAVAILABLE, "Vessels not loaded yet"));
    }
    Ok(Json(state.vessels().as_ref().clone()))
}

async fn get_vessel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vessel>, StatusCode> {
    state.get_vessel(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn vessel_position(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<TimeQuery>,
) -> Result<Json<VesselPosition>, ApiError> {
    let time_offset = resolve_time(&state, query.t)?;
    let vessel = state
        .get_vessel(&id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Unknown vessel {}", id)))?;

    Ok(Json(VesselPosition {
        position: project_position(&vessel, time_offset),
        arrival_minutes: estimated_arrival_minutes(&vessel),
        time_offset,
        id,
    }))
}

async fn delete_vessel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if let Some(planner) = state.planner() {
        match planner.delete_ship(&id).await {
            Ok(()) => {}
            // Fixture-only vessels are unknown to the service.
            Err(PlanningError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {}
            Err(e) => {
                tracing::warn!("Failed to delete {} on planning service: {}", id, e);
                return Err(api_error(StatusCode::BAD_GATEWAY, e.to_string()));
            }
        }
    }

    if state.remove_vessel(&id) {
        state.refresh();
        tracing::info!("Removed vessel {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(StatusCode::NOT_FOUND, format!("Unknown vessel {}", id)))
    }
}

async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<PublishedSnapshot> {
    Json(state.latest_snapshot().as_ref().clone())
}

async fn list_congestion(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CongestionQuery>,
) -> Json<Vec<CongestionCell>> {
    let snapshot = state.latest_snapshot();
    let cells = snapshot
        .snapshot
        .cells
        .iter()
        .filter(|cell| !query.occupied.unwrap_or(false) || cell.ship_count > 0)
        .cloned()
        .collect();
    Json(cells)
}

async fn bounds_congestion(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BoundsQuery>,
) -> Result<Json<BoundsCongestion>, ApiError> {
    let time_offset = resolve_time(&state, query.t)?;
    let bounds = [[query.sw_lon, query.sw_lat], [query.ne_lon, query.ne_lat]];
    let vessels = state.vessels();

    Ok(Json(BoundsCongestion {
        time_offset,
        congestion_level: congestion_in_bounds(&vessels, bounds, time_offset),
    }))
}

async fn list_clusters(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ClusterQuery>,
) -> Result<Json<Vec<Cluster>>, ApiError> {
    if query.t.is_none() && query.max_distance.is_none() {
        return Ok(Json(state.latest_snapshot().snapshot.clusters.clone()));
    }

    let time_offset = resolve_time(&state, query.t)?;
    let max_distance = query.max_distance.unwrap_or_else(|| state.cluster_distance_deg());
    Ok(Json(cluster(&state.vessels(), time_offset, max_distance)))
}

async fn list_heatmap(State(state): State<Arc<AppState>>) -> Json<Vec<HeatmapPoint>> {
    Json(state.latest_snapshot().snapshot.heatmap.clone())
}

async fn get_clock(State(state): State<Arc<AppState>>) -> Json<ClockState> {
    Json(state.clock_state())
}

async fn start_clock(State(state): State<Arc<AppState>>) -> Json<ClockState> {
    let (_, clock) = state.with_clock(|clock| clock.start());
    Json(clock)
}

async fn stop_clock(State(state): State<Arc<AppState>>) -> Json<ClockState> {
    let (_, clock) = state.with_clock(|clock| clock.stop());
    Json(clock)
}

async fn reset_clock(State(state): State<Arc<AppState>>) -> Json<ClockState> {
    let (_, clock) = state.with_clock(|clock| clock.reset());
    state.refresh();
    Json(clock)
}

async fn set_clock_speed(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SpeedRequest>,
) -> Result<Json<ClockState>, ApiError> {
    let (accepted, clock) = state.with_clock(|clock| clock.set_speed(payload.speed));
    if !accepted {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "speed must be a finite, non-negative number",
        ));
    }
    Ok(Json(clock))
}

async fn seek_clock(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SeekRequest>,
) -> Result<Json<ClockState>, ApiError> {
    if !payload.time_offset.is_finite() {
        return Err(api_error(StatusCode::BAD_REQUEST, "time_offset must be finite"));
    }
    let (_, clock) = state.with_clock(|clock| clock.seek(payload.time_offset));
    state.refresh();
    Ok(Json(clock))
}
