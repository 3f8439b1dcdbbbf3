//! Vessel sources: the local fixture, the planning service, and the merge of both.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use harbor_core::ports::{resolve_destination, GURYONGPO};
use harbor_core::{generate_route_with_rng, Coordinate, OptimizationMode, RouteStatus, Vessel, VesselStatus};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::client::PlanningClient;
use crate::units::DEFAULT_ANCHOR;

pub const SERVICE_REFRESH_INTERVAL: Duration = Duration::from_secs(3);
pub const LOCAL_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Speed assumed for vessels only known to the planning service.
const SERVICE_VESSEL_SPEED_KNOTS: f64 = 12.0;

/// One vessel as written in the fixture file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselRecord {
    pub id: String,
    pub name: String,
    pub position: Coordinate,
    #[serde(default)]
    pub heading: f64,
    pub speed: f64,
    pub destination: String,
    #[serde(default)]
    pub status: VesselStatus,
    #[serde(default)]
    pub estimated_arrival: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureFile {
    Wrapped { ships: Vec<VesselRecord> },
    Bare(Vec<VesselRecord>),
}

/// Parse fixture JSON, either `{"ships": [...]}` or a bare array.
pub fn parse_fixture(json: &str) -> Result<Vec<VesselRecord>> {
    let file: FixtureFile = serde_json::from_str(json).context("Failed to parse vessel fixture")?;
    Ok(match file {
        FixtureFile::Wrapped { ships } => ships,
        FixtureFile::Bare(ships) => ships,
    })
}

pub fn load_fixture(path: impl AsRef<Path>) -> Result<Vec<VesselRecord>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read vessel fixture {}", path.display()))?;
    parse_fixture(&json)
}

impl VesselRecord {
    /// Build the runtime vessel, generating a curved route to its destination.
    ///
    /// An unknown destination resolves to the vessel's own position. The route
    /// is seeded from the vessel id so repeated loads agree.
    pub fn to_vessel(&self) -> Vessel {
        let mut rng = StdRng::seed_from_u64(route_seed(&self.id));
        let destination_coords = resolve_destination(&self.destination, self.position);
        let route = generate_route_with_rng(self.position, destination_coords, &mut rng);

        Vessel {
            id: self.id.clone(),
            name: self.name.clone(),
            position: self.position,
            heading: self.heading,
            speed: self.speed,
            destination: self.destination.clone(),
            destination_coords,
            status: self.status,
            estimated_arrival: self.estimated_arrival.clone(),
            route: Some(route),
            optimization_mode: None,
        }
    }
}

// FNV-1a; stable across builds unlike the std hasher.
fn route_seed(id: &str) -> u64 {
    id.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Vessel for a ship known only to the planning service.
pub fn vessel_from_status(status: RouteStatus) -> Vessel {
    let start = status.path_points.first().copied().unwrap_or(DEFAULT_ANCHOR);
    let end = status.path_points.last().copied().unwrap_or(DEFAULT_ANCHOR);
    let vessel_status = match status.status.as_str() {
        "pending" => VesselStatus::Warning,
        _ => VesselStatus::Normal,
    };

    Vessel {
        id: status.ship_id.clone(),
        name: status.ship_id,
        position: status.current_position.unwrap_or(start),
        heading: 0.0,
        speed: SERVICE_VESSEL_SPEED_KNOTS,
        destination: GURYONGPO.name.to_string(),
        destination_coords: end,
        status: vessel_status,
        estimated_arrival: format!("{} min", status.arrival_time.round()),
        route: Some(status.path_points),
        optimization_mode: status.optimization_mode.as_deref().and_then(OptimizationMode::parse),
    }
}

/// Remote vessels first, then local ones whose id the service doesn't know.
pub fn merge_vessels(remote: Vec<Vessel>, local: Vec<Vessel>) -> Vec<Vessel> {
    let mut merged = remote;
    let local: Vec<Vessel> = local
        .into_iter()
        .filter(|vessel| !merged.iter().any(|remote| remote.id == vessel.id))
        .collect();
    merged.extend(local);
    merged
}

/// Produces the current vessel list from the fixture and, optionally, the service.
#[derive(Debug, Clone)]
pub struct VesselLoader {
    fixture: Vec<VesselRecord>,
    service: Option<PlanningClient>,
}

impl VesselLoader {
    pub fn new(fixture: Vec<VesselRecord>, service: Option<PlanningClient>) -> Self {
        Self { fixture, service }
    }

    /// Load the fixture at `path`. An unreadable fixture yields an empty fleet.
    pub fn from_path(path: impl AsRef<Path>, service: Option<PlanningClient>) -> Self {
        let fixture = match load_fixture(path) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Vessel fixture unavailable, starting empty: {:#}", e);
                Vec::new()
            }
        };
        Self::new(fixture, service)
    }

    pub fn service(&self) -> Option<&PlanningClient> {
        self.service.as_ref()
    }

    pub fn fixture(&self) -> &[VesselRecord] {
        &self.fixture
    }

    pub fn refresh_interval(&self) -> Duration {
        if self.service.is_some() {
            SERVICE_REFRESH_INTERVAL
        } else {
            LOCAL_REFRESH_INTERVAL
        }
    }

    pub fn local_vessels(&self) -> Vec<Vessel> {
        self.fixture.iter().map(VesselRecord::to_vessel).collect()
    }

    /// Current fleet. Never fails: a service error falls back to local vessels.
    pub async fn load_vessels(&self) -> Vec<Vessel> {
        let local = self.local_vessels();
        let Some(client) = &self.service else {
            return local;
        };

        match client.list_ships().await {
            Ok(statuses) => {
                let remote = statuses.into_iter().map(vessel_from_status).collect();
                merge_vessels(remote, local)
            }
            Err(e) => {
                tracing::warn!("Planning service unavailable, using local vessels: {}", e);
                local
            }
        }
    }
}

/// Handle for a periodic vessel refresh. Dropping it stops the refresh.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop aborts the task.
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Call `on_update` with a fresh vessel list every `period`, first after one period.
pub fn subscribe<F>(loader: Arc<VesselLoader>, period: Duration, mut on_update: F) -> Subscription
where
    F: FnMut(Vec<Vessel>) + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            on_update(loader.load_vessels().await);
        }
    });
    Subscription { handle }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "ships": [
            {
                "id": "ship-001",
                "name": "Haemaru",
                "position": [129.60, 36.02],
                "heading": 200,
                "speed": 14,
                "destination": "Guryongpo",
                "status": "normal",
                "estimatedArrival": "14:20"
            },
            {
                "id": "ship-002",
                "name": "Dokdo Star",
                "position": [129.52, 35.95],
                "speed": 9,
                "destination": "Atlantis"
            }
        ]
    }"#;

    fn status(id: &str, path: Vec<Coordinate>) -> RouteStatus {
        RouteStatus {
            ship_id: id.to_string(),
            status: "pending".to_string(),
            current_position: None,
            departure_time: 0.0,
            arrival_time: 42.4,
            path_points: path,
            optimization_mode: Some("flexible".to_string()),
        }
    }

    #[test]
    fn fixture_records_become_routed_vessels() {
        let records = parse_fixture(FIXTURE).unwrap();
        assert_eq!(records.len(), 2);

        let vessel = records[0].to_vessel();
        assert_eq!(vessel.destination_coords, GURYONGPO.coordinates);
        let route = vessel.route.as_ref().unwrap();
        assert_eq!(route.first(), Some(&vessel.position));
        assert_eq!(route.last(), Some(&GURYONGPO.coordinates));
        assert_eq!(vessel.status, VesselStatus::Normal);
    }

    #[test]
    fn unknown_destination_keeps_vessel_in_place() {
        let records = parse_fixture(FIXTURE).unwrap();
        let vessel = records[1].to_vessel();
        assert_eq!(vessel.destination_coords, vessel.position);
        assert_eq!(vessel.heading, 0.0);
        let later = harbor_core::project_position(&vessel, 60.0);
        assert!((later[0] - vessel.position[0]).abs() < 1e-12);
    }

    #[test]
    fn bare_array_fixture_is_accepted() {
        let json = r#"[{"id": "a", "name": "A", "position": [129.5, 36.0], "speed": 10, "destination": "Pohang"}]"#;
        let records = parse_fixture(json).unwrap();
        assert_eq!(records[0].to_vessel().destination_coords, [129.3832, 36.0322]);
    }

    #[test]
    fn routes_are_stable_across_loads() {
        let records = parse_fixture(FIXTURE).unwrap();
        assert_eq!(records[0].to_vessel().route, records[0].to_vessel().route);
        assert_ne!(records[0].to_vessel().route, records[1].to_vessel().route);
    }

    #[test]
    fn service_status_maps_to_vessel() {
        let vessel = vessel_from_status(status("svc-1", vec![[129.50, 36.00], [129.55, 35.99]]));
        assert_eq!(vessel.name, "svc-1");
        assert_eq!(vessel.position, [129.50, 36.00]);
        assert_eq!(vessel.destination_coords, [129.55, 35.99]);
        assert_eq!(vessel.speed, 12.0);
        assert_eq!(vessel.status, VesselStatus::Warning);
        assert_eq!(vessel.estimated_arrival, "42 min");
        assert_eq!(vessel.optimization_mode, Some(OptimizationMode::Flexible));
    }

    #[test]
    fn empty_service_path_uses_anchor() {
        let mut entry = status("svc-2", Vec::new());
        entry.status = "active".to_string();
        let vessel = vessel_from_status(entry);
        assert_eq!(vessel.position, DEFAULT_ANCHOR);
        assert_eq!(vessel.status, VesselStatus::Normal);
        assert!(!vessel.is_underway());
    }

    #[test]
    fn remote_entries_win_over_local_duplicates() {
        let records = parse_fixture(FIXTURE).unwrap();
        let local: Vec<Vessel> = records.iter().map(VesselRecord::to_vessel).collect();
        let remote = vec![vessel_from_status(status("ship-001", vec![[129.50, 36.00]]))];

        let merged = merge_vessels(remote, local);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, "ship-001");
        assert_eq!(merged[0].name, "ship-001");
        assert_eq!(merged[1].id, "ship-002");
    }

    #[tokio::test]
    async fn unreachable_service_falls_back_to_local() {
        let records = parse_fixture(FIXTURE).unwrap();
        let loader = VesselLoader::new(records, Some(PlanningClient::new("http://127.0.0.1:9/api")));
        let vessels = loader.load_vessels().await;
        assert_eq!(vessels.len(), 2);
        assert_eq!(loader.refresh_interval(), SERVICE_REFRESH_INTERVAL);
    }

    #[tokio::test]
    async fn missing_fixture_yields_empty_fleet() {
        let loader = VesselLoader::from_path("/nonexistent/vessels.json", None);
        assert!(loader.load_vessels().await.is_empty());
        assert_eq!(loader.refresh_interval(), LOCAL_REFRESH_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn subscription_delivers_until_dropped() {
        let loader = Arc::new(VesselLoader::new(parse_fixture(FIXTURE).unwrap(), None));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let subscription = subscribe(loader, Duration::from_secs(5), move |vessels| {
            let _ = tx.send(vessels.len());
        });

        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, Some(2));
        assert!(subscription.is_active());

        subscription.unsubscribe();
        assert_eq!(rx.recv().await, None);
    }
}
