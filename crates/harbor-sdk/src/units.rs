//! Conversion between geographic coordinates and planning-service units.
//!
//! The service works on a planar raster anchored at a reference point. One
//! unit is `degrees_per_unit` degrees on both axes, and unit Y grows
//! southward. Values are kept fractional so the mapping inverts exactly.

use harbor_core::Coordinate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ANCHOR: Coordinate = [129.5560, 35.9940];
pub const DEFAULT_WIDTH_UNITS: f64 = 2000.0;
pub const DEFAULT_HEIGHT_UNITS: f64 = 1400.0;
pub const DEFAULT_DEGREES_PER_UNIT: f64 = 0.00001;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceFrame {
    /// Geographic point at the center of the raster
    pub anchor: Coordinate,
    pub width_units: f64,
    pub height_units: f64,
    pub degrees_per_unit: f64,
}

impl Default for ServiceFrame {
    fn default() -> Self {
        Self {
            anchor: DEFAULT_ANCHOR,
            width_units: DEFAULT_WIDTH_UNITS,
            height_units: DEFAULT_HEIGHT_UNITS,
            degrees_per_unit: DEFAULT_DEGREES_PER_UNIT,
        }
    }
}

impl ServiceFrame {
    /// `[lon, lat]` to service `[x, y]`.
    pub fn to_unit(&self, point: Coordinate) -> Coordinate {
        let delta_lon = point[0] - self.anchor[0];
        let delta_lat = point[1] - self.anchor[1];
        [
            delta_lon / self.degrees_per_unit + self.width_units / 2.0,
            self.height_units / 2.0 - delta_lat / self.degrees_per_unit,
        ]
    }

    /// Service `[x, y]` to `[lon, lat]`.
    pub fn from_unit(&self, unit: Coordinate) -> Coordinate {
        let delta_lon = (unit[0] - self.width_units / 2.0) * self.degrees_per_unit;
        let delta_lat = (self.height_units / 2.0 - unit[1]) * self.degrees_per_unit;
        [self.anchor[0] + delta_lon, self.anchor[1] + delta_lat]
    }

    pub fn path_from_units(&self, path: &[Coordinate]) -> Vec<Coordinate> {
        path.iter().map(|&point| self.from_unit(point)).collect()
    }

    /// Geographic bounds covered by the raster, as `[sw, ne]`.
    pub fn bounds(&self) -> [Coordinate; 2] {
        let sw = self.from_unit([0.0, self.height_units]);
        let ne = self.from_unit([self.width_units, 0.0]);
        [sw, ne]
    }
}
