//! Reference ports used for destinations and grid placement.

use serde::Serialize;

use crate::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Port {
    pub name: &'static str,
    pub coordinates: Coordinate,
}

pub const ULLEUNGDO: Port = Port { name: "Ulleungdo", coordinates: [130.9057, 37.4844] };
pub const BUSAN: Port = Port { name: "Busan", coordinates: [129.0756, 35.1796] };
pub const POHANG: Port = Port { name: "Pohang", coordinates: [129.3832, 36.0322] };
pub const SOKCHO: Port = Port { name: "Sokcho", coordinates: [128.5918, 38.2070] };
pub const GAMPO: Port = Port { name: "Gampo", coordinates: [129.5038, 35.8915] };
pub const GURYONGPO: Port = Port { name: "Guryongpo", coordinates: [129.5554, 35.9896] };

pub static PORTS: [Port; 6] = [ULLEUNGDO, BUSAN, POHANG, SOKCHO, GAMPO, GURYONGPO];

/// Look up a port by name (case-insensitive).
pub fn find_port(name: &str) -> Option<&'static Port> {
    let name = name.trim();
    PORTS.iter().find(|port| port.name.eq_ignore_ascii_case(name))
}

/// Coordinates of the named port, or `fallback` when the name is unknown.
pub fn resolve_destination(name: &str, fallback: Coordinate) -> Coordinate {
    find_port(name)
        .map(|port| port.coordinates)
        .unwrap_or(fallback)
}
