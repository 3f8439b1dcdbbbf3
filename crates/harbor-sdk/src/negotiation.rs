//! Drives the two-phase plan → accept protocol against the planning service.

use harbor_core::{NegotiationState, RoutePlan, Vessel};

use crate::client::{PlanningClient, PlanningError};

/// Phase 1. On failure nothing is kept: the caller starts over from scratch.
pub async fn propose(
    client: &PlanningClient,
    vessel: &Vessel,
    departure_time: f64,
) -> Result<NegotiationState, PlanningError> {
    let plan = client.plan_route(vessel, departure_time).await?;
    Ok(NegotiationState::propose(departure_time, plan))
}

/// Phase 2. `state` must be `Proposed`; on failure it is left as it was.
pub async fn decide(
    client: &PlanningClient,
    state: &NegotiationState,
    accept: bool,
) -> Result<NegotiationState, PlanningError> {
    let (proposed, _) = state.proposal()?;
    let confirmed = client.accept_route(&proposed.ship_id, accept).await?;
    Ok(state.commit(accept, confirmed)?)
}

/// Apply a committed negotiation to a vessel. Other states leave it unchanged.
pub fn apply(vessel: &Vessel, state: &NegotiationState) -> Vessel {
    match state {
        NegotiationState::Committed { plan, mode, .. } => vessel.with_committed_plan(plan, *mode),
        _ => vessel.clone(),
    }
}

/// One vessel's negotiation, holding the vessel it will update.
#[derive(Debug, Clone)]
pub struct RouteNegotiation {
    vessel: Vessel,
    state: NegotiationState,
}

impl RouteNegotiation {
    pub fn new(vessel: Vessel) -> Self {
        Self {
            vessel,
            state: NegotiationState::Unplanned,
        }
    }

    pub fn vessel(&self) -> &Vessel {
        &self.vessel
    }

    pub fn state(&self) -> &NegotiationState {
        &self.state
    }

    /// Request a plan. A failed request resets to `Unplanned`.
    pub async fn plan(&mut self, client: &PlanningClient, departure_time: f64) -> Result<&RoutePlan, PlanningError> {
        self.state = NegotiationState::Unplanned;
        self.state = propose(client, &self.vessel, departure_time).await?;
        let (plan, _) = self.state.proposal()?;
        Ok(plan)
    }

    /// Accept or reject the proposal and return the updated vessel.
    ///
    /// A failed decision leaves both the proposal and the vessel untouched.
    pub async fn decide(&mut self, client: &PlanningClient, accept: bool) -> Result<&Vessel, PlanningError> {
        let committed = decide(client, &self.state, accept).await?;
        self.vessel = apply(&self.vessel, &committed);
        self.state = committed;
        Ok(&self.vessel)
    }
}
