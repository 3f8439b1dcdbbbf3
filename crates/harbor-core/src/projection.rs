//! Route generation and time-based position projection.

use rand::Rng;

use crate::geo::{haversine_distance_km, interpolate, midpoint, quadratic_bezier, Coordinate};
use crate::models::Vessel;

/// Number of segments in a generated route (points = segments + 1).
pub const ROUTE_SEGMENTS: usize = 50;
/// Span of the random control point displacement, in degrees.
pub const CONTROL_OFFSET_SPAN_DEG: f64 = 0.02;
pub const KM_PER_NAUTICAL_MILE: f64 = 1.852;

/// Convert a speed in knots to kilometers per minute.
pub fn knots_to_km_per_min(knots: f64) -> f64 {
    knots * KM_PER_NAUTICAL_MILE / 60.0
}

/// Generate a curved route from `start` to `end` with the thread-local RNG.
///
/// Each call yields a different curve. Use [`generate_route_with_rng`] with a
/// seeded generator when the shape must be reproducible.
pub fn generate_route(start: Coordinate, end: Coordinate) -> Vec<Coordinate> {
    generate_route_with_rng(start, end, &mut rand::rng())
}

/// Generate a curved route from `start` to `end`.
///
/// The path is a quadratic Bézier through a control point at the segment
/// midpoint displaced by the same random offset on both axes. The first point
/// is exactly `start` and the last exactly `end`.
pub fn generate_route_with_rng<R: Rng + ?Sized>(
    start: Coordinate,
    end: Coordinate,
    rng: &mut R,
) -> Vec<Coordinate> {
    let offset = CONTROL_OFFSET_SPAN_DEG * (rng.random::<f64>() - 0.5);
    let mid = midpoint(start, end);
    let control = [mid[0] + offset, mid[1] + offset];

    (0..=ROUTE_SEGMENTS)
        .map(|i| {
            let t = i as f64 / ROUTE_SEGMENTS as f64;
            quadratic_bezier(start, control, end, t)
        })
        .collect()
}

/// Total great-circle length of a route in kilometers.
pub fn route_length_km(route: &[Coordinate]) -> f64 {
    route
        .windows(2)
        .map(|pair| haversine_distance_km(pair[0], pair[1]))
        .sum()
}

/// Where `vessel` is after `time_offset_minutes` of travel along its route.
///
/// Vessels without a usable route stay at their base position. Past the end
/// of the route the vessel sits on the final point. Negative offsets are
/// treated as zero.
pub fn project_position(vessel: &Vessel, time_offset_minutes: f64) -> Coordinate {
    let route = match vessel.route.as_deref() {
        Some(route) if route.len() >= 2 => route,
        _ => return vessel.position,
    };

    let target_km = knots_to_km_per_min(vessel.speed) * time_offset_minutes.max(0.0);
    position_along(route, target_km)
}

/// Point reached after travelling `target_km` from the start of `route`.
///
/// `route` must have at least one point.
fn position_along(route: &[Coordinate], target_km: f64) -> Coordinate {
    let mut accumulated_km = 0.0;
    for pair in route.windows(2) {
        let segment_km = haversine_distance_km(pair[0], pair[1]);
        if accumulated_km + segment_km >= target_km {
            if segment_km <= 0.0 {
                return pair[0];
            }
            let ratio = ((target_km - accumulated_km) / segment_km).clamp(0.0, 1.0);
            return interpolate(pair[0], pair[1], ratio);
        }
        accumulated_km += segment_km;
    }

    route[route.len() - 1]
}

/// Minutes for the vessel to reach the end of its route, if it moves at all.
pub fn estimated_arrival_minutes(vessel: &Vessel) -> Option<f64> {
    let route = vessel.route.as_deref().filter(|route| route.len() >= 2)?;
    let km_per_min = knots_to_km_per_min(vessel.speed);
    if km_per_min <= 0.0 {
        return None;
    }
    Some(route_length_km(route) / km_per_min)
}

/// A vessel id paired with its projected position for one tick.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProjectedVessel {
    pub id: String,
    pub position: Coordinate,
}

/// Project every vessel once, preserving input order.
pub fn project_all(vessels: &[Vessel], time_offset_minutes: f64) -> Vec<ProjectedVessel> {
    vessels
        .iter()
        .map(|vessel| ProjectedVessel {
            id: vessel.id.clone(),
            position: project_position(vessel, time_offset_minutes),
        })
        .collect()
}
