//! Grid-based congestion aggregation around a reference port.
//!
//! The grid is built once from a square scan clipped to a circle. Each scanned
//! point becomes the *center* of its cell (the cell is shifted back by half a
//! cell on both axes), and [`CongestionGrid::key`] adds the same half cell
//! before flooring so any point inside a cell's bounds maps back to it.

use std::collections::HashMap;

use thiserror::Error;

use crate::geo::{euclidean_distance, Coordinate};
use crate::models::{CongestionCell, Vessel};
use crate::projection::project_position;

/// Saturation count: this many vessels or more is full congestion.
pub const SATURATION_SHIP_COUNT: u32 = 5;
pub const LEVEL_PER_SHIP: u8 = 20;

// Absorbs float error when comparing scanned points against the radius.
const SCAN_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f64),
    #[error("radius must be non-negative and finite, got {0}")]
    InvalidRadius(f64),
}

/// Lattice index of a cell relative to the grid's scan origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub col: i64,
    pub row: i64,
}

/// Discrete congestion score for a cell holding `ship_count` vessels.
///
/// Steps by 20 per vessel and saturates at 100 from five vessels up.
pub fn congestion_level(ship_count: u32) -> u8 {
    ship_count.min(SATURATION_SHIP_COUNT) as u8 * LEVEL_PER_SHIP
}

/// Congestion score for an arbitrary inclusive lon/lat box.
pub fn congestion_in_bounds(vessels: &[Vessel], bounds: [Coordinate; 2], time_offset: f64) -> u8 {
    let [sw, ne] = bounds;
    let count = vessels
        .iter()
        .map(|vessel| project_position(vessel, time_offset))
        .filter(|p| p[0] >= sw[0] && p[0] <= ne[0] && p[1] >= sw[1] && p[1] <= ne[1])
        .count();
    congestion_level(count as u32)
}

/// Congestion cells covering a circular region, owned exclusively by the grid.
#[derive(Debug, Clone)]
pub struct CongestionGrid {
    center: Coordinate,
    radius_deg: f64,
    cell_size_deg: f64,
    /// First scanned point (`center - radius` on both axes)
    origin: Coordinate,
    cells: Vec<CongestionCell>,
    index: HashMap<CellKey, usize>,
}

impl CongestionGrid {
    /// Build the grid for a circular region of `radius_deg` around `center`.
    pub fn initialize(center: Coordinate, radius_deg: f64, cell_size_deg: f64) -> Result<Self, GridError> {
        if !cell_size_deg.is_finite() || cell_size_deg <= 0.0 {
            return Err(GridError::InvalidCellSize(cell_size_deg));
        }
        if !radius_deg.is_finite() || radius_deg < 0.0 {
            return Err(GridError::InvalidRadius(radius_deg));
        }

        let origin = [center[0] - radius_deg, center[1] - radius_deg];
        let steps = ((2.0 * radius_deg) / cell_size_deg + SCAN_EPSILON).floor() as i64;
        let half = cell_size_deg / 2.0;

        let mut cells = Vec::new();
        let mut index = HashMap::new();

        for col in 0..=steps {
            let lon = origin[0] + col as f64 * cell_size_deg;
            for row in 0..=steps {
                let lat = origin[1] + row as f64 * cell_size_deg;
                if euclidean_distance([lon, lat], center) > radius_deg + SCAN_EPSILON {
                    continue;
                }

                let sw = [lon - half, lat - half];
                let ne = [sw[0] + cell_size_deg, sw[1] + cell_size_deg];
                index.insert(CellKey { col, row }, cells.len());
                cells.push(CongestionCell {
                    id: format!("zone-{:.4}-{:.4}", lon, lat),
                    bounds: [sw, ne],
                    congestion_level: 0,
                    ship_count: 0,
                });
            }
        }

        Ok(Self {
            center,
            radius_deg,
            cell_size_deg,
            origin,
            cells,
            index,
        })
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn radius_deg(&self) -> f64 {
        self.radius_deg
    }

    pub fn cell_size_deg(&self) -> f64 {
        self.cell_size_deg
    }

    /// Key of the cell whose bounds contain `point` (half-open on the upper edges).
    pub fn key(&self, point: Coordinate) -> CellKey {
        let offset = |value: f64, origin: f64| {
            ((value - origin + self.cell_size_deg / 2.0) / self.cell_size_deg).floor() as i64
        };
        CellKey {
            col: offset(point[0], self.origin[0]),
            row: offset(point[1], self.origin[1]),
        }
    }

    pub fn cell(&self, key: CellKey) -> Option<&CongestionCell> {
        self.index.get(&key).map(|&idx| &self.cells[idx])
    }

    /// Cell containing `point`, if it lies inside the covered region.
    pub fn cell_at(&self, point: Coordinate) -> Option<&CongestionCell> {
        self.cell(self.key(point))
    }

    /// All cells in construction order.
    pub fn cells(&self) -> &[CongestionCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells currently holding at least one vessel.
    pub fn occupied(&self) -> impl Iterator<Item = &CongestionCell> {
        self.cells.iter().filter(|cell| cell.ship_count > 0)
    }

    /// Project every vessel and recount the grid.
    pub fn update(&mut self, vessels: &[Vessel], time_offset: f64) -> &[CongestionCell] {
        self.update_positions(vessels.iter().map(|vessel| project_position(vessel, time_offset)))
    }

    /// Recount the grid from already projected positions.
    ///
    /// Positions outside the covered region are dropped without error.
    pub fn update_positions<I>(&mut self, positions: I) -> &[CongestionCell]
    where
        I: IntoIterator<Item = Coordinate>,
    {
        for cell in &mut self.cells {
            cell.ship_count = 0;
            cell.congestion_level = 0;
        }

        for position in positions {
            let key = self.key(position);
            if let Some(&idx) = self.index.get(&key) {
                self.cells[idx].ship_count += 1;
            }
        }

        for cell in &mut self.cells {
            cell.congestion_level = congestion_level(cell.ship_count);
        }

        &self.cells
    }
}
