//! Geographic math for projection, gridding and clustering.
//!
//! Coordinates are `[lon, lat]` pairs in decimal degrees, matching the order
//! used by the vessel source and the rendering layer.

/// A `[longitude, latitude]` pair in decimal degrees.
pub type Coordinate = [f64; 2];

pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance between two points in kilometers (Haversine formula).
///
/// Use this for physically meaningful distances such as how far a vessel
/// travels along its route. For degree-space proximity use [`euclidean_distance`].
pub fn haversine_distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a[1].to_radians();
    let phi2 = b[1].to_radians();
    let dphi = (b[1] - a[1]).to_radians();
    let dlambda = (b[0] - a[0]).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Planar distance in coordinate-degree units.
///
/// Only meaningful over a small region where curvature is negligible: grid
/// keying and clustering thresholds. Not a real-world distance.
pub fn euclidean_distance(a: Coordinate, b: Coordinate) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}

/// Linear interpolation per axis, `ratio` in `[0, 1]`.
pub fn interpolate(a: Coordinate, b: Coordinate, ratio: f64) -> Coordinate {
    [a[0] + (b[0] - a[0]) * ratio, a[1] + (b[1] - a[1]) * ratio]
}

/// Point at parameter `t` on the quadratic Bézier curve `p0 → control → p1`.
pub fn quadratic_bezier(p0: Coordinate, control: Coordinate, p1: Coordinate, t: f64) -> Coordinate {
    let u = 1.0 - t;
    let a = u * u;
    let b = 2.0 * u * t;
    let c = t * t;
    [
        a * p0[0] + b * control[0] + c * p1[0],
        a * p0[1] + b * control[1] + c * p1[1],
    ]
}

/// Midpoint of two coordinates in degree space.
pub fn midpoint(a: Coordinate, b: Coordinate) -> Coordinate {
    interpolate(a, b, 0.5)
}
