//! HTTP client for the external route planning service.
//!
//! Every payload crossing this boundary uses service units; geographic
//! coordinates never go on the wire. Responses are converted back before
//! they are returned.

use std::time::Duration;

use harbor_core::{
    NegotiationError, RouteAcceptance, RoutePlan, RoutePlanRequest, RouteStatus, Vessel,
};
use reqwest::{Client, Response, StatusCode, Url};
use thiserror::Error;

use crate::units::ServiceFrame;

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000/api";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("planning service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{action}: {status} {body}")]
    Status {
        action: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("invalid planning service URL {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
}

/// Client for the planning service (`/route/plan`, `/route/accept`, `/ships`).
#[derive(Debug, Clone)]
pub struct PlanningClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) frame: ServiceFrame,
}

impl PlanningClient {
    /// Create a client for `base_url` (e.g. "http://localhost:8000/api").
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_frame(base_url, ServiceFrame::default())
    }

    pub fn with_frame(base_url: impl Into<String>, frame: ServiceFrame) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            frame,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn frame(&self) -> &ServiceFrame {
        &self.frame
    }

    /// Phase 1: ask the service for a plan departing at `departure_time` minutes.
    ///
    /// The returned plan may recommend a different departure.
    pub async fn plan_route(&self, vessel: &Vessel, departure_time: f64) -> Result<RoutePlan, PlanningError> {
        let url = format!("{}/route/plan", self.base_url);
        let request = RoutePlanRequest {
            ship_id: vessel.id.clone(),
            start_position: self.frame.to_unit(vessel.position),
            goal_position: self.frame.to_unit(vessel.destination_coords),
            departure_time,
            speed_knots: vessel.speed,
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let plan: RoutePlan = ensure_success(response, "Failed to plan route")
            .await?
            .json()
            .await?;

        tracing::debug!(
            ship_id = %plan.ship_id,
            requested = departure_time,
            recommended = plan.recommended_departure,
            "Route plan received"
        );
        Ok(self.plan_from_units(plan))
    }

    /// Phase 2: accept (flexible departure) or reject (fixed departure) the proposal.
    pub async fn accept_route(&self, ship_id: &str, accept: bool) -> Result<RoutePlan, PlanningError> {
        let url = format!("{}/route/accept", self.base_url);
        let acceptance = RouteAcceptance {
            ship_id: ship_id.to_string(),
            accept,
        };

        let response = self.client.post(&url).json(&acceptance).send().await?;
        let plan: RoutePlan = ensure_success(response, "Failed to accept/reject route")
            .await?
            .json()
            .await?;

        Ok(self.plan_from_units(plan))
    }

    /// All vessels the service currently tracks.
    pub async fn list_ships(&self) -> Result<Vec<RouteStatus>, PlanningError> {
        let url = format!("{}/ships", self.base_url);
        let response = self.client.get(&url).send().await?;
        let ships: Vec<RouteStatus> = ensure_success(response, "Failed to fetch ships")
            .await?
            .json()
            .await?;

        Ok(ships
            .into_iter()
            .map(|status| self.status_from_units(status))
            .collect())
    }

    pub async fn ship_status(&self, ship_id: &str) -> Result<RouteStatus, PlanningError> {
        let response = self.client.get(self.ship_url(ship_id)?).send().await?;
        let status: RouteStatus = ensure_success(response, "Ship not found")
            .await?
            .json()
            .await?;

        Ok(self.status_from_units(status))
    }

    /// Remove a vessel from the service. Local snapshots drop it on next refresh.
    pub async fn delete_ship(&self, ship_id: &str) -> Result<(), PlanningError> {
        let response = self.client.delete(self.ship_url(ship_id)?).send().await?;
        ensure_success(response, "Failed to delete ship").await?;
        Ok(())
    }

    /// `{base}/ship/{id}` with the id escaped as a single path segment.
    fn ship_url(&self, ship_id: &str) -> Result<Url, PlanningError> {
        let invalid = || PlanningError::InvalidUrl(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("ship")
            .push(ship_id);
        Ok(url)
    }

    fn plan_from_units(&self, mut plan: RoutePlan) -> RoutePlan {
        plan.path_points = self.frame.path_from_units(&plan.path_points);
        for segment in &mut plan.segments {
            segment.start_point = self.frame.from_unit(segment.start_point);
            segment.end_point = self.frame.from_unit(segment.end_point);
        }
        plan
    }

    fn status_from_units(&self, mut status: RouteStatus) -> RouteStatus {
        status.current_position = status.current_position.map(|p| self.frame.from_unit(p));
        status.path_points = self.frame.path_from_units(&status.path_points);
        status
    }
}

async fn ensure_success(response: Response, action: &'static str) -> Result<Response, PlanningError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PlanningError::Status { action, status, body })
}
