//! Two-phase route negotiation against a planning service.
//!
//! Plans a route for one fixture vessel, prints the proposal, then accepts
//! (flexible departure) or rejects (fixed departure) it.
//!
//! Usage:
//!   cargo run -p harbor-cli --bin plan_route -- --fixture crates/harbor-server/data/vessels.json --ship ship-001

use anyhow::{Context, Result};
use clap::Parser;
use harbor_cli::plan_summary;
use harbor_sdk::source::load_fixture;
use harbor_sdk::{PlanningClient, RouteNegotiation, DEFAULT_SERVICE_URL};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Route negotiation client
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Planning service base URL
    #[arg(long, default_value = DEFAULT_SERVICE_URL)]
    url: String,

    /// Vessel fixture (JSON)
    #[arg(long)]
    fixture: String,

    /// Vessel id to plan for
    #[arg(long)]
    ship: String,

    /// Requested departure, minutes from now
    #[arg(long, default_value_t = 0.0)]
    departure: f64,

    /// Keep the requested departure instead of the recommendation
    #[arg(long)]
    reject: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("harbor_sdk=debug".parse()?))
        .init();

    let args = Args::parse();
    let vessel = load_fixture(&args.fixture)?
        .into_iter()
        .find(|record| record.id == args.ship)
        .map(|record| record.to_vessel())
        .with_context(|| format!("Vessel {} not in {}", args.ship, args.fixture))?;

    println!("Planning {} ({}) -> {}", vessel.id, vessel.name, vessel.destination);
    let client = PlanningClient::new(&args.url);
    let mut negotiation = RouteNegotiation::new(vessel);

    let proposal = negotiation
        .plan(&client, args.departure)
        .await
        .context("Route planning failed")?;
    println!("Proposed: {}", plan_summary(proposal, args.departure));

    let accept = !args.reject;
    let vessel = negotiation
        .decide(&client, accept)
        .await
        .with_context(|| format!("Failed to {} route", if accept { "accept" } else { "reject" }))?
        .clone();

    let state = negotiation.state();
    println!(
        "Committed {}: mode={:?} departure={:.1}m route={} points",
        vessel.id,
        state.mode(),
        state.active_departure().unwrap_or(args.departure),
        vessel.route.as_ref().map_or(0, Vec::len)
    );
    Ok(())
}
