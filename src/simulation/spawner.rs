//! Probabilistic vehicle source attached to a node

use log::{debug, warn};
use rand::seq::IndexedRandom;
use rand::Rng;

use super::config::CostModel;
use super::edge::congestion_cost;
use super::road_network::RoadGraph;
use super::types::{NodeId, VehicleId};
use super::vehicle::Vehicle;

/// Spawns vehicles at `node` with probability `spawn_ratio` per tick
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSpawner {
    pub node: NodeId,
    pub spawn_ratio: f64,
    cost_model: CostModel,
    debug: bool,
}

impl VehicleSpawner {
    pub fn new(node: impl Into<NodeId>, spawn_ratio: f64) -> Self {
        Self {
            node: node.into(),
            spawn_ratio: spawn_ratio.clamp(0.0, 1.0),
            cost_model: CostModel::default(),
            debug: false,
        }
    }

    /// Use the simulation's routing cost and diagnostics settings
    pub fn configure(&mut self, cost_model: CostModel, debug: bool) {
        self.cost_model = cost_model;
        self.debug = debug;
    }

    /// Roll for a spawn this tick.
    ///
    /// On success a vehicle bound for a random other node is routed with the
    /// congestion-aware cost and placed on its first edge. A spawn that finds
    /// no route or a full first edge is dropped for this tick.
    ///
    /// `serial` makes the vehicle id unique; the caller bumps it on success.
    pub fn update<R: Rng>(
        &self,
        graph: &mut RoadGraph,
        serial: u64,
        rng: &mut R,
    ) -> Option<Vehicle> {
        if rng.random::<f64>() > self.spawn_ratio {
            return None;
        }

        let destinations: Vec<NodeId> = graph
            .node_ids()
            .into_iter()
            .filter(|node| *node != self.node)
            .collect();
        let destination = destinations.choose(rng)?.clone();

        let route = match graph.find_path(&self.node, &destination, congestion_cost(self.cost_model)) {
            Ok(route) => route,
            Err(e) => {
                warn!("Spawner at {}: {}", self.node, e);
                return None;
            }
        };
        if route.len() < 2 {
            return None;
        }

        let id = VehicleId(format!("auto_{}_{}", self.node, serial));
        let mut vehicle = Vehicle::new(id, route[1..].iter().cloned());

        let edge_index = match graph.edge_index(&route[0], &route[1]) {
            Ok(index) => index,
            Err(e) => {
                warn!("Spawner at {} got an unusable route: {}", self.node, e);
                return None;
            }
        };
        let edge = graph.edge_mut(edge_index)?;
        if !edge.insert(&mut vehicle) {
            debug!("Spawner at {}: first edge to {} is full", self.node, route[1]);
            return None;
        }
        vehicle.edge = Some(edge_index);

        if self.debug {
            debug!("Spawned {} at {} bound for {}", vehicle.id, self.node, destination);
        }
        Some(vehicle)
    }
}
