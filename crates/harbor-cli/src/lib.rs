//! Harbor CLI - Command line tools for the harbor traffic engine.
//!
//! This crate provides the CLI binaries:
//! - plan_route: two-phase route negotiation against a planning service
//! - simulate: offline tick run over a vessel fixture

pub mod report;

pub use report::{hotspots, plan_summary, TickSummary};
