//! Harbor SDK - planning service integration
//!
//! Talks to the external route planning service and turns fixture and
//! service data into the vessel list the simulation runs on.

pub mod client;
pub mod negotiation;
pub mod source;
pub mod units;

pub use client::{PlanningClient, PlanningError, DEFAULT_SERVICE_URL};
pub use negotiation::RouteNegotiation;
pub use source::{subscribe, Subscription, VesselLoader, VesselRecord};
pub use units::ServiceFrame;
