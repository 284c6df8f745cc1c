//! Density-flow (LWR style) road segment
//!
//! All vehicles on the edge share a flow speed derived from the edge density.
//! Each vehicle gets a small random variance on top of it, and is clamped
//! against its leader so the ordering on the road never changes.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::ops::RangeInclusive;

use ordered_float::OrderedFloat;
use rand::Rng;

use super::super::types::{VehicleId, FLUID_SAFETY_GAP};
use super::super::vehicle::Vehicle;

/// Flow factor below which the road is treated as jammed
const CONGESTION_THRESHOLD: f64 = 0.3;
/// Lowest flow factor used for routing, keeps jammed travel time finite
const MIN_ROUTING_FACTOR: f64 = 0.01;
/// Lowest flow factor used for movement, so a jammed road still drains
const CRAWL_FACTOR: f64 = 0.1;

const FREE_VARIANCE: RangeInclusive<f64> = 0.85..=1.15;
const JAM_VARIANCE: RangeInclusive<f64> = 0.9..=1.1;

/// A road whose vehicles hold continuous positions in meters
#[derive(Debug, Clone)]
pub struct FluidEdge {
    distance: f64,
    vmax: f64,
    density_max: f64,
    max_vehicles: usize,
    /// Kept sorted by position, most advanced first
    vehicles: Vec<(VehicleId, OrderedFloat<f64>)>,
}

impl FluidEdge {
    pub fn new(distance: f64, vmax: f64, density_max: f64) -> Self {
        let distance = distance.max(0.0);
        let density_max = density_max.max(0.0);
        Self {
            distance,
            vmax: vmax.max(0.0),
            density_max,
            max_vehicles: (distance * density_max).floor() as usize,
            vehicles: Vec::new(),
        }
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn vmax(&self) -> f64 {
        self.vmax
    }

    pub fn density_max(&self) -> f64 {
        self.density_max
    }

    pub fn max_vehicles(&self) -> usize {
        self.max_vehicles
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Vehicles per meter
    pub fn density(&self) -> f64 {
        if self.distance > 0.0 {
            self.vehicles.len() as f64 / self.distance
        } else {
            0.0
        }
    }

    /// `max(0, 1 - (k / k_max)^2)`; 1 on an empty road
    pub fn flow_factor(&self) -> f64 {
        if self.vehicles.is_empty() {
            return 1.0;
        }
        if self.density_max <= 0.0 {
            return 0.0;
        }
        let ratio = self.density() / self.density_max;
        (1.0 - ratio * ratio).max(0.0)
    }

    /// Current speed of the flow in meters per tick
    pub fn flow_speed(&self) -> f64 {
        self.vmax * self.flow_factor()
    }

    /// Place a vehicle at the start of the road with zero speed.
    ///
    /// Fails once the jam capacity `floor(distance * density_max)` is reached,
    /// or while the rearmost vehicle is still within the safety gap of the
    /// entrance.
    pub fn insert(&mut self, vehicle: &mut Vehicle) -> bool {
        if self.vehicles.len() >= self.max_vehicles || !self.entrance_clear() {
            return false;
        }
        vehicle.speed = 0.0;
        // Position zero is never ahead of anything, so order is preserved
        self.vehicles.push((vehicle.id.clone(), OrderedFloat(0.0)));
        true
    }

    /// Whether a vehicle placed at position 0 would keep the safety gap
    pub fn entrance_clear(&self) -> bool {
        self.vehicles
            .last()
            .map_or(true, |(_, rear)| rear.into_inner() >= FLUID_SAFETY_GAP)
    }

    pub fn advance<R: Rng>(&mut self, vehicles: &mut HashMap<VehicleId, Vehicle>, rng: &mut R) {
        if self.vehicles.is_empty() {
            return;
        }

        let factor = self.flow_factor();
        let target_speed = self.vmax * factor.max(CRAWL_FACTOR);
        let variance = if factor < CONGESTION_THRESHOLD {
            JAM_VARIANCE
        } else {
            FREE_VARIANCE
        };

        self.vehicles.sort_by_key(|(_, position)| Reverse(*position));

        let mut leader: Option<f64> = None;
        for (id, position) in self.vehicles.iter_mut() {
            let current = position.into_inner();
            let tentative = current + target_speed * rng.random_range(variance.clone());

            let mut limit = self.distance;
            if let Some(leader) = leader {
                limit = limit.min(leader - FLUID_SAFETY_GAP);
            }

            let (next, speed) = if tentative > limit {
                (limit.max(current), 0.0)
            } else {
                (tentative, tentative - current)
            };

            *position = OrderedFloat(next);
            leader = Some(next);

            if let Some(vehicle) = vehicles.get_mut(id) {
                vehicle.speed = speed;
            }
        }
    }

    fn at_exit(&self, position: f64) -> bool {
        position >= self.distance - FLUID_SAFETY_GAP
    }

    /// Most advanced vehicle, only once it is within the safety gap of the end
    pub fn peek_last_vehicle(&self) -> Option<&VehicleId> {
        self.vehicles
            .first()
            .filter(|(_, position)| self.at_exit(position.into_inner()))
            .map(|(id, _)| id)
    }

    pub fn pop_last_vehicle(&mut self) -> Option<VehicleId> {
        self.peek_last_vehicle()?;
        Some(self.vehicles.remove(0).0)
    }

    pub fn occupation_ratio(&self) -> f64 {
        if self.max_vehicles == 0 {
            return 0.0;
        }
        self.vehicles.len() as f64 / self.max_vehicles as f64
    }

    /// Travel time at the current flow speed, free-flow time on an empty road
    pub fn travel_time_cost(&self) -> f64 {
        if self.vehicles.is_empty() {
            return self.distance / self.vmax;
        }
        let factor = self.flow_factor().max(MIN_ROUTING_FACTOR);
        self.distance / (self.vmax * factor)
    }

    /// Position of a vehicle in meters from the start of the road
    pub fn position_of(&self, id: &VehicleId) -> Option<f64> {
        self.vehicles
            .iter()
            .find(|(vehicle, _)| vehicle == id)
            .map(|(_, position)| position.into_inner())
    }

    /// Vehicles with their position as a fraction of the road, leader first
    pub fn vehicle_positions(&self) -> Vec<(VehicleId, f64)> {
        self.vehicles
            .iter()
            .map(|(id, position)| {
                let ratio = if self.distance > 0.0 {
                    position.into_inner() / self.distance
                } else {
                    1.0
                };
                (id.clone(), ratio)
            })
            .collect()
    }
}
