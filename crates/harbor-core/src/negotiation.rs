//! Per-vessel route negotiation state: `Unplanned → Proposed → Committed`.

use serde::Serialize;
use thiserror::Error;

use crate::models::{OptimizationMode, RoutePlan};

#[derive(Debug, Error, PartialEq)]
pub enum NegotiationError {
    #[error("no proposed plan to accept or reject")]
    NothingProposed,
    #[error("confirmed plan belongs to {actual}, expected {expected}")]
    ShipMismatch { expected: String, actual: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum NegotiationState {
    #[default]
    Unplanned,
    /// The service has answered phase 1; awaiting accept/reject
    Proposed {
        requested_departure: f64,
        plan: RoutePlan,
    },
    /// Final plan confirmed by the service
    Committed {
        departure: f64,
        mode: OptimizationMode,
        plan: RoutePlan,
    },
}

impl NegotiationState {
    /// Record a phase 1 answer. Valid from any state: re-planning starts over.
    pub fn propose(requested_departure: f64, plan: RoutePlan) -> Self {
        Self::Proposed {
            requested_departure,
            plan,
        }
    }

    /// The pending proposal, if any.
    pub fn proposal(&self) -> Result<(&RoutePlan, f64), NegotiationError> {
        match self {
            Self::Proposed {
                requested_departure,
                plan,
            } => Ok((plan, *requested_departure)),
            _ => Err(NegotiationError::NothingProposed),
        }
    }

    /// Record the phase 2 answer.
    ///
    /// Accepting adopts the service's recommended departure; rejecting keeps
    /// the departure originally requested.
    pub fn commit(&self, accept: bool, confirmed: RoutePlan) -> Result<Self, NegotiationError> {
        let (proposed, requested_departure) = self.proposal()?;
        if proposed.ship_id != confirmed.ship_id {
            return Err(NegotiationError::ShipMismatch {
                expected: proposed.ship_id.clone(),
                actual: confirmed.ship_id,
            });
        }

        let departure = if accept {
            confirmed.recommended_departure
        } else {
            requested_departure
        };

        Ok(Self::Committed {
            departure,
            mode: OptimizationMode::from_acceptance(accept),
            plan: confirmed,
        })
    }

    pub fn plan(&self) -> Option<&RoutePlan> {
        match self {
            Self::Unplanned => None,
            Self::Proposed { plan, .. } | Self::Committed { plan, .. } => Some(plan),
        }
    }

    /// Departure in effect once committed.
    pub fn active_departure(&self) -> Option<f64> {
        match self {
            Self::Committed { departure, .. } => Some(*departure),
            _ => None,
        }
    }

    pub fn mode(&self) -> Option<OptimizationMode> {
        match self {
            Self::Committed { mode, .. } => Some(*mode),
            _ => None,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}
