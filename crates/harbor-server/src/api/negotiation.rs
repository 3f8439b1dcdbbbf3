//! Plan/accept proxy endpoints driving per-vessel negotiation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::routes::{api_error, ApiError};
use crate::state::AppState;
use harbor_core::{NegotiationState, RoutePlan, Vessel};
use harbor_sdk::negotiation::{decide, propose};
use harbor_sdk::{PlanningClient, PlanningError};

#[derive(Debug, Deserialize)]
pub struct PlanRouteRequest {
    pub ship_id: String,
    /// Requested departure, minutes from now
    #[serde(default)]
    pub departure_time: f64,
}

#[derive(Debug, Deserialize)]
pub struct AcceptRouteRequest {
    pub ship_id: String,
    pub accept: bool,
}

#[derive(Debug, Serialize)]
pub struct CommittedRoute {
    pub negotiation: NegotiationState,
    /// The vessel with its new route, if it is still tracked locally
    pub vessel: Option<Vessel>,
}

fn planner(state: &AppState) -> Result<&PlanningClient, ApiError> {
    state
        .planner()
        .ok_or_else(|| api_error(StatusCode::SERVICE_UNAVAILABLE, "Planning service disabled"))
}

fn planning_failure(ship_id: &str, err: PlanningError) -> ApiError {
    tracing::warn!("Route negotiation for {} failed: {}", ship_id, err);
    let status = match err {
        PlanningError::Negotiation(_) => StatusCode::CONFLICT,
        _ => StatusCode::BAD_GATEWAY,
    };
    api_error(status, err.to_string())
}

/// Phase 1. Any previous negotiation for the vessel is discarded.
pub async fn plan_route(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PlanRouteRequest>,
) -> Result<Json<RoutePlan>, ApiError> {
    let client = planner(&state)?;
    if !payload.departure_time.is_finite() {
        return Err(api_error(StatusCode::BAD_REQUEST, "departure_time must be finite"));
    }
    let vessel = state.get_vessel(&payload.ship_id).ok_or_else(|| {
        api_error(StatusCode::NOT_FOUND, format!("Unknown vessel {}", payload.ship_id))
    })?;

    state.set_negotiation(&payload.ship_id, NegotiationState::Unplanned);
    let proposed = propose(client, &vessel, payload.departure_time)
        .await
        .map_err(|e| planning_failure(&payload.ship_id, e))?;

    let plan = proposed
        .plan()
        .cloned()
        .ok_or_else(|| api_error(StatusCode::INTERNAL_SERVER_ERROR, "Proposal missing plan"))?;
    state.set_negotiation(&payload.ship_id, proposed);

    tracing::info!(
        "Proposed route for {}: departure {} -> {}",
        payload.ship_id,
        payload.departure_time,
        plan.recommended_departure
    );
    Ok(Json(plan))
}

/// Phase 2. On failure the proposal stays in place and the vessel is untouched.
pub async fn accept_route(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AcceptRouteRequest>,
) -> Result<Json<CommittedRoute>, ApiError> {
    let client = planner(&state)?;
    let current = state.negotiation(&payload.ship_id);

    let committed = decide(client, &current, payload.accept)
        .await
        .map_err(|e| planning_failure(&payload.ship_id, e))?;

    let vessel = state.commit_negotiation(&payload.ship_id, committed.clone());
    state.refresh();

    tracing::info!(
        "Committed route for {} ({:?}, departure {:?})",
        payload.ship_id,
        committed.mode(),
        committed.active_departure()
    );
    Ok(Json(CommittedRoute {
        negotiation: committed,
        vessel,
    }))
}

pub async fn get_negotiation(
    State(state): State<Arc<AppState>>,
    Path(ship_id): Path<String>,
) -> Json<NegotiationState> {
    Json(state.negotiation(&ship_id))
}
