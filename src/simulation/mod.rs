//! Traffic simulation core
//!
//! Road graph with congestion-aware routing, the cellular and fluid edge
//! models, intersection controllers, spawners and the fixed-step engine.

mod config;
mod demo;
mod edge;
mod error;
mod intersection;
mod road_network;
mod spawner;
mod types;
mod vehicle;
mod world;

pub use config::{CostModel, SimulationConfig};
pub use demo::{build_demo_simulation, DemoModel};
pub use edge::{
    congestion_cost, free_flow_cost, CellularEdge, EdgeDetail, EdgeInfo, EdgeModel, FluidEdge,
};
pub use error::{NetworkError, NetworkResult};
pub use intersection::{Intersection, RoundRobinLight};
pub use road_network::RoadGraph;
pub use spawner::VehicleSpawner;
pub use types::{
    Node, NodeId, Position, SignalState, VehicleId, DEFAULT_CELLULAR_VMAX, DEFAULT_DENSITY_MAX,
    DEFAULT_LIGHT_DURATION, DEFAULT_PROB_SLOW, DEFAULT_SPAWN_RATIO, FLUID_SAFETY_GAP,
};
pub use vehicle::Vehicle;
pub use world::{Simulation, SimulationStats};

// Edge handles stored on vehicles
pub use petgraph::graph::EdgeIndex;
