//! Offline simulation over a vessel fixture.
//!
//! Drives the frame clock the same way the server does and prints a
//! congestion/cluster summary at a fixed simulated-time interval.
//!
//! Usage:
//!   cargo run -p harbor-cli --bin simulate -- --fixture crates/harbor-server/data/vessels.json

use anyhow::{Context, Result};
use clap::Parser;
use harbor_cli::{hotspots, TickSummary};
use harbor_core::ports::{resolve_destination, GURYONGPO};
use harbor_core::{Simulation, SimulationClock, SimulationConfig};
use harbor_sdk::source::load_fixture;
use harbor_sdk::VesselRecord;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Offline harbor simulation
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Vessel fixture (JSON)
    #[arg(long)]
    fixture: String,

    /// Simulated minutes to run (one wrap of the clock at most)
    #[arg(long, default_value_t = 120.0)]
    minutes: f64,

    /// Clock speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Print a summary every N simulated minutes
    #[arg(long, default_value_t = 10.0)]
    every: f64,

    /// Port the congestion grid is centered on
    #[arg(long, default_value = "Guryongpo")]
    port: String,

    /// Emit JSON lines instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("harbor_cli=info".parse()?))
        .init();

    let args = Args::parse();
    let records = load_fixture(&args.fixture)?;
    let vessels: Vec<_> = records.iter().map(VesselRecord::to_vessel).collect();
    tracing::info!("Loaded {} vessels from {}", vessels.len(), args.fixture);

    let config = SimulationConfig {
        center: resolve_destination(&args.port, GURYONGPO.coordinates),
        ..SimulationConfig::default()
    };
    let mut simulation = Simulation::new(config).context("Invalid grid configuration")?;

    let mut clock = SimulationClock::default();
    if !clock.set_speed(args.speed) {
        anyhow::bail!("speed must be a finite, non-negative number");
    }
    if args.speed == 0.0 {
        anyhow::bail!("speed 0 never advances the clock");
    }
    clock.start();

    let every = args.every.max(f64::EPSILON);
    let mut next_report = 0.0;
    let mut last_offset = 0.0;
    let mut time_offset = 0.0;

    loop {
        if time_offset + 1e-9 >= next_report {
            let snapshot = simulation.tick(&vessels, time_offset);
            let summary = TickSummary::from_snapshot(&snapshot);
            if args.json {
                println!("{}", serde_json::to_string(&summary)?);
            } else {
                println!("{}", summary);
                for cell in hotspots(&snapshot.cells, 3) {
                    println!("    {} level={} ships={}", cell.id, cell.congestion_level, cell.ship_count);
                }
            }
            next_report += every;
        }

        let Some(next) = clock.on_frame() else {
            continue;
        };
        // Wrapped back to zero or ran long enough.
        if next < last_offset || next > args.minutes {
            break;
        }
        last_offset = next;
        time_offset = next;
    }

    Ok(())
}
