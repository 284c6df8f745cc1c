//! Nagel-Schreckenberg cellular automaton road segment

use std::collections::HashMap;

use rand::Rng;

use super::super::types::VehicleId;
use super::super::vehicle::Vehicle;

/// Occupancy above which the banded cost multiplies by 1.5
const LIGHT_CONGESTION: f64 = 0.5;
/// Occupancy above which the banded cost multiplies by 3
const HEAVY_CONGESTION: f64 = 0.8;

/// A road split into unit cells, each holding at most one vehicle
#[derive(Debug, Clone)]
pub struct CellularEdge {
    vmax: u32,
    prob_slow: f64,
    cells: Vec<Option<VehicleId>>,
}

impl CellularEdge {
    /// A road of `distance` cells (at least one)
    pub fn new(distance: usize, vmax: u32, prob_slow: f64) -> Self {
        Self {
            vmax,
            prob_slow: prob_slow.clamp(0.0, 1.0),
            cells: vec![None; distance.max(1)],
        }
    }

    pub fn distance(&self) -> usize {
        self.cells.len()
    }

    pub fn vmax(&self) -> u32 {
        self.vmax
    }

    pub fn prob_slow(&self) -> f64 {
        self.prob_slow
    }

    pub fn cells(&self) -> &[Option<VehicleId>] {
        &self.cells
    }

    pub fn vehicle_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Place a vehicle on the entrance cell.
    /// Returns false when the entrance is occupied; the caller keeps the vehicle.
    pub fn insert(&mut self, vehicle: &mut Vehicle) -> bool {
        if self.cells[0].is_some() {
            return false;
        }
        vehicle.speed = vehicle.speed.min(self.vmax as f64);
        self.cells[0] = Some(vehicle.id.clone());
        true
    }

    /// Run one automaton update.
    ///
    /// Cells are visited from the exit back to the entrance, so each vehicle
    /// sees the already-updated position of the one ahead. When `exit_open`
    /// is false the road ends one cell early and the head of the queue stops
    /// on the last cell. Vehicles that reach the end are held on the last
    /// cell until the transfer phase pops them.
    pub fn advance<R: Rng>(
        &mut self,
        exit_open: bool,
        vehicles: &mut HashMap<VehicleId, Vehicle>,
        rng: &mut R,
    ) {
        let distance = self.distance();
        let mut obstacle = if exit_open { distance + 1 } else { distance };

        for pos in (0..distance).rev() {
            let Some(id) = self.cells[pos].take() else {
                continue;
            };

            let vehicle = vehicles.get_mut(&id);
            let current = vehicle
                .as_ref()
                .map(|v| v.speed.max(0.0) as usize)
                .unwrap_or(0);

            let gap = obstacle.saturating_sub(pos + 1);
            let mut speed = (current + 1).min(self.vmax as usize).min(gap);

            if speed > 0 && rng.random::<f64>() < self.prob_slow {
                speed -= 1;
            }

            let target = (pos + speed).min(distance - 1);
            self.cells[target] = Some(id);
            obstacle = target;

            // Clamped at the exit, so record the distance actually moved
            if let Some(vehicle) = vehicle {
                vehicle.speed = (target - pos) as f64;
            }
        }
    }

    /// Vehicle on the last cell, if any
    pub fn peek_last_vehicle(&self) -> Option<&VehicleId> {
        self.cells.last().and_then(|cell| cell.as_ref())
    }

    pub fn pop_last_vehicle(&mut self) -> Option<VehicleId> {
        self.cells.last_mut().and_then(|cell| cell.take())
    }

    pub fn occupation_ratio(&self) -> f64 {
        self.vehicle_count() as f64 / self.distance() as f64
    }

    /// Free-flow length, raised by 1.5x above 50% occupancy and 3x above 80%
    pub fn banded_cost(&self) -> f64 {
        let base = self.distance() as f64;
        let occupation = self.occupation_ratio();
        if occupation > HEAVY_CONGESTION {
            base * 3.0
        } else if occupation > LIGHT_CONGESTION {
            base * 1.5
        } else {
            base
        }
    }

    /// Continuous variant: `distance * (1 + occupancy^2 * 10)`
    pub fn smooth_cost(&self) -> f64 {
        let occupation = self.occupation_ratio();
        self.distance() as f64 * (1.0 + occupation * occupation * 10.0)
    }

    /// Vehicles with their position as a fraction of the road (cell centers)
    pub fn vehicle_positions(&self) -> Vec<(VehicleId, f64)> {
        let distance = self.distance() as f64;
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| {
                cell.as_ref()
                    .map(|id| (id.clone(), (i as f64 + 0.5) / distance))
            })
            .collect()
    }

    /// One-line console view, e.g. `|o| | |o|`
    pub fn render_cells(&self) -> String {
        let mut line = String::with_capacity(self.cells.len() * 2 + 1);
        for cell in &self.cells {
            line.push('|');
            line.push(if cell.is_some() { 'o' } else { ' ' });
        }
        line.push('|');
        line
    }
}
