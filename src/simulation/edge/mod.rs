//! Edge models: the traffic propagation rules of one directed road
//!
//! Two models are available behind the closed [`EdgeModel`] enum:
//! a discrete cellular automaton ([`CellularEdge`]) and a continuous
//! density-flow model ([`FluidEdge`]).

mod cellular;
mod fluid;

pub use cellular::CellularEdge;
pub use fluid::FluidEdge;

use std::collections::HashMap;
use std::fmt;

use rand::Rng;

use super::config::CostModel;
use super::types::{NodeId, VehicleId};
use super::vehicle::Vehicle;

/// A directed road segment under one of the traffic models
#[derive(Debug, Clone)]
pub enum EdgeModel {
    Cellular(CellularEdge),
    Fluid(FluidEdge),
}

impl From<CellularEdge> for EdgeModel {
    fn from(edge: CellularEdge) -> Self {
        EdgeModel::Cellular(edge)
    }
}

impl From<FluidEdge> for EdgeModel {
    fn from(edge: FluidEdge) -> Self {
        EdgeModel::Fluid(edge)
    }
}

impl EdgeModel {
    /// Try to put a vehicle on the entrance of the road
    pub fn insert(&mut self, vehicle: &mut Vehicle) -> bool {
        match self {
            EdgeModel::Cellular(edge) => edge.insert(vehicle),
            EdgeModel::Fluid(edge) => edge.insert(vehicle),
        }
    }

    /// Advance the vehicles on this road by one tick.
    /// `exit_open` tells whether the downstream intersection lets traffic through.
    pub fn advance<R: Rng>(
        &mut self,
        exit_open: bool,
        vehicles: &mut HashMap<VehicleId, Vehicle>,
        rng: &mut R,
    ) {
        match self {
            EdgeModel::Cellular(edge) => edge.advance(exit_open, vehicles, rng),
            // Blocked fluid vehicles simply wait at the exit until popped
            EdgeModel::Fluid(edge) => edge.advance(vehicles, rng),
        }
    }

    pub fn peek_last_vehicle(&self) -> Option<&VehicleId> {
        match self {
            EdgeModel::Cellular(edge) => edge.peek_last_vehicle(),
            EdgeModel::Fluid(edge) => edge.peek_last_vehicle(),
        }
    }

    pub fn pop_last_vehicle(&mut self) -> Option<VehicleId> {
        match self {
            EdgeModel::Cellular(edge) => edge.pop_last_vehicle(),
            EdgeModel::Fluid(edge) => edge.pop_last_vehicle(),
        }
    }

    pub fn occupation_ratio(&self) -> f64 {
        match self {
            EdgeModel::Cellular(edge) => edge.occupation_ratio(),
            EdgeModel::Fluid(edge) => edge.occupation_ratio(),
        }
    }

    /// Congestion-aware traversal cost used by the default router
    pub fn routing_cost(&self, cost_model: CostModel) -> f64 {
        match (self, cost_model) {
            (EdgeModel::Cellular(edge), CostModel::Banded) => edge.banded_cost(),
            (EdgeModel::Cellular(edge), CostModel::Smooth) => edge.smooth_cost(),
            (EdgeModel::Fluid(edge), _) => edge.travel_time_cost(),
        }
    }

    pub fn vehicle_count(&self) -> usize {
        match self {
            EdgeModel::Cellular(edge) => edge.vehicle_count(),
            EdgeModel::Fluid(edge) => edge.vehicle_count(),
        }
    }

    pub fn vehicle_positions(&self) -> Vec<(VehicleId, f64)> {
        match self {
            EdgeModel::Cellular(edge) => edge.vehicle_positions(),
            EdgeModel::Fluid(edge) => edge.vehicle_positions(),
        }
    }

    pub fn info(&self) -> EdgeInfo {
        match self {
            EdgeModel::Cellular(edge) => EdgeInfo {
                vmax: edge.vmax() as f64,
                vehicles: edge.vehicle_count(),
                capacity: edge.distance(),
                occupation: edge.occupation_ratio(),
                detail: EdgeDetail::Cellular {
                    prob_slow: edge.prob_slow(),
                },
            },
            EdgeModel::Fluid(edge) => EdgeInfo {
                vmax: edge.vmax(),
                vehicles: edge.vehicle_count(),
                capacity: edge.max_vehicles(),
                occupation: edge.occupation_ratio(),
                detail: EdgeDetail::Fluid {
                    density: edge.density(),
                    flow_speed: edge.flow_speed(),
                },
            },
        }
    }
}

/// Snapshot of an edge's state for inspectors
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeInfo {
    pub vmax: f64,
    pub vehicles: usize,
    pub capacity: usize,
    pub occupation: f64,
    pub detail: EdgeDetail,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EdgeDetail {
    Cellular { prob_slow: f64 },
    Fluid { density: f64, flow_speed: f64 },
}

impl fmt::Display for EdgeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail {
            EdgeDetail::Cellular { prob_slow } => {
                writeln!(f, "Type:       Cellular")?;
                writeln!(f, "Vmax:       {} cells/tick", self.vmax)?;
                writeln!(f, "Prob slow:  {:.0}%", prob_slow * 100.0)?;
            }
            EdgeDetail::Fluid {
                density,
                flow_speed,
            } => {
                writeln!(f, "Type:       Fluid (LWR)")?;
                writeln!(f, "Vmax:       {:.1} m/tick", self.vmax)?;
                writeln!(f, "Density:    {:.3} veh/m", density)?;
                writeln!(f, "Flow speed: {:.1} m/tick", flow_speed)?;
            }
        }
        writeln!(f, "Vehicles:   {}/{}", self.vehicles, self.capacity)?;
        write!(f, "Occupation: {:.1}%", self.occupation * 100.0)
    }
}

/// Default routing cost: each edge's own congestion-aware cost
pub fn congestion_cost(cost_model: CostModel) -> impl Fn(&NodeId, &NodeId, &EdgeModel) -> f64 {
    move |_src, _dst, edge| edge.routing_cost(cost_model)
}

/// Static cost ignoring occupancy, the lower bound of every congestion cost
pub fn free_flow_cost(_src: &NodeId, _dst: &NodeId, edge: &EdgeModel) -> f64 {
    match edge {
        EdgeModel::Cellular(edge) => edge.distance() as f64,
        EdgeModel::Fluid(edge) => edge.distance() / edge.vmax(),
    }
}
