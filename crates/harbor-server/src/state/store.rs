//! In-memory state store.
//!
//! The vessel list is an immutable snapshot behind an `Arc`; writers replace
//! it wholesale so a tick always reads one consistent list.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use harbor_core::{ClockState, NegotiationState, Simulation, SimulationClock, TickSnapshot, Vessel};
use harbor_sdk::negotiation::apply;
use harbor_sdk::PlanningClient;
use serde::Serialize;
use tokio::sync::broadcast;

const STREAM_CAPACITY: usize = 16;

/// Latest tick result as served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedSnapshot {
    pub computed_at: DateTime<Utc>,
    pub vessel_count: usize,
    #[serde(flatten)]
    pub snapshot: TickSnapshot,
}

/// Application state - vessels, clock, simulation and negotiations.
pub struct AppState {
    /// Writers hold this lock for their whole read-modify-write.
    vessels: RwLock<Arc<Vec<Vessel>>>,
    vessels_loaded: AtomicBool,
    /// Ids deleted through the API; later refreshes leave them out.
    removed: DashSet<String>,
    clock: Mutex<SimulationClock>,
    simulation: Mutex<Simulation>,
    latest: RwLock<Arc<PublishedSnapshot>>,
    negotiations: DashMap<String, NegotiationState>,
    planner: Option<PlanningClient>,
    /// Serialized snapshots for stream subscribers
    pub tx: broadcast::Sender<Arc<str>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AppState {
    pub fn new(mut simulation: Simulation, planner: Option<PlanningClient>) -> Self {
        let initial = PublishedSnapshot {
            computed_at: Utc::now(),
            vessel_count: 0,
            snapshot: simulation.tick(&[], 0.0),
        };
        let (tx, _) = broadcast::channel(STREAM_CAPACITY);

        Self {
            vessels: RwLock::new(Arc::new(Vec::new())),
            vessels_loaded: AtomicBool::new(false),
            removed: DashSet::new(),
            clock: Mutex::new(SimulationClock::default()),
            simulation: Mutex::new(simulation),
            latest: RwLock::new(Arc::new(initial)),
            negotiations: DashMap::new(),
            planner,
            tx,
        }
    }

    pub fn planner(&self) -> Option<&PlanningClient> {
        self.planner.as_ref()
    }

    /// False until the first vessel list arrives, even if that list is empty.
    pub fn vessels_loaded(&self) -> bool {
        self.vessels_loaded.load(Ordering::Acquire)
    }

    pub fn vessels(&self) -> Arc<Vec<Vessel>> {
        self.vessels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write_vessels(&self) -> RwLockWriteGuard<'_, Arc<Vec<Vessel>>> {
        self.vessels.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_vessel(&self, id: &str) -> Option<Vessel> {
        self.vessels().iter().find(|v| v.id == id).cloned()
    }

    /// Install a fresh vessel list. Committed routes survive the refresh and
    /// removed vessels stay removed.
    pub fn replace_vessels(&self, vessels: Vec<Vessel>) {
        let mut guard = self.write_vessels();
        let vessels: Vec<Vessel> = vessels
            .into_iter()
            .filter(|vessel| !self.removed.contains(&vessel.id))
            .map(|vessel| match self.negotiations.get(&vessel.id) {
                Some(state) if state.is_committed() => apply(&vessel, state.value()),
                _ => vessel,
            })
            .collect();
        *guard = Arc::new(vessels);
        self.vessels_loaded.store(true, Ordering::Release);
    }

    /// Drop a vessel and its negotiation. Returns false if it was unknown.
    pub fn remove_vessel(&self, id: &str) -> bool {
        let mut guard = self.write_vessels();
        if !guard.iter().any(|v| v.id == id) {
            return false;
        }
        self.removed.insert(id.to_string());
        self.negotiations.remove(id);
        let remaining = guard.iter().filter(|v| v.id != id).cloned().collect();
        *guard = Arc::new(remaining);
        true
    }

    pub fn negotiation(&self, ship_id: &str) -> NegotiationState {
        self.negotiations
            .get(ship_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn set_negotiation(&self, ship_id: &str, state: NegotiationState) {
        self.negotiations.insert(ship_id.to_string(), state);
    }

    /// Record a committed negotiation and swap in the updated vessel.
    pub fn commit_negotiation(&self, ship_id: &str, state: NegotiationState) -> Option<Vessel> {
        let mut guard = self.write_vessels();
        let updated = guard
            .iter()
            .find(|v| v.id == ship_id)
            .map(|vessel| apply(vessel, &state));
        self.set_negotiation(ship_id, state);

        let updated = updated?;
        let vessels = guard
            .iter()
            .map(|v| if v.id == ship_id { updated.clone() } else { v.clone() })
            .collect();
        *guard = Arc::new(vessels);
        Some(updated)
    }

    pub fn clock_state(&self) -> ClockState {
        lock(&self.clock).state()
    }

    pub fn time_offset(&self) -> f64 {
        lock(&self.clock).time_offset()
    }

    /// Mutate the clock and return its resulting state.
    pub fn with_clock<R>(&self, f: impl FnOnce(&mut SimulationClock) -> R) -> (R, ClockState) {
        let mut clock = lock(&self.clock);
        let result = f(&mut clock);
        (result, clock.state())
    }

    /// One display frame. Returns the new offset when the clock advanced.
    pub fn advance_frame(&self) -> Option<f64> {
        lock(&self.clock).on_frame()
    }

    /// Run a tick at the clock's current offset and publish it.
    ///
    /// Inputs are read and the result published under the simulation lock, so
    /// the last publish always reflects the newest clock and vessel list.
    pub fn refresh(&self) -> Arc<PublishedSnapshot> {
        let mut simulation = lock(&self.simulation);
        let time_offset = self.time_offset();
        let vessels = self.vessels();
        let published = Arc::new(PublishedSnapshot {
            computed_at: Utc::now(),
            vessel_count: vessels.len(),
            snapshot: simulation.tick(&vessels, time_offset),
        });

        {
            let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
            *latest = published.clone();
        }

        if self.tx.receiver_count() > 0 {
            match serde_json::to_string(published.as_ref()) {
                Ok(payload) => {
                    let _ = self.tx.send(Arc::from(payload));
                }
                Err(e) => tracing::error!("Failed to serialize snapshot: {}", e),
            }
        }
        published
    }

    pub fn latest_snapshot(&self) -> Arc<PublishedSnapshot> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn cluster_distance_deg(&self) -> f64 {
        lock(&self.simulation).cluster_distance_deg()
    }
}
