//! Main simulation that ties everything together
//!
//! The simulation owns the road graph, every live vehicle and the spawners,
//! and advances them in fixed steps. Each step runs, in order: intersection
//! timers, spawners, per-edge physics, then the transfer phase that moves
//! vehicles waiting at an edge exit onto their next edge.

use log::{debug, info, warn};
use petgraph::graph::EdgeIndex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use super::config::SimulationConfig;
use super::edge::EdgeModel;
use super::error::{NetworkError, NetworkResult};
use super::road_network::RoadGraph;
use super::spawner::VehicleSpawner;
use super::types::{NodeId, SignalState, VehicleId};
use super::vehicle::Vehicle;

/// Counters accumulated over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationStats {
    /// Steps executed so far
    pub ticks: u64,
    pub spawned: u64,
    /// Vehicles that reached their final destination
    pub arrived: u64,
    /// Vehicles discarded because their route used a missing edge
    pub invalid_routes: u64,
    /// Vehicles currently on the network
    pub active: usize,
}

/// The main simulation
pub struct Simulation {
    /// Road network, controllers and edge models
    pub graph: RoadGraph,

    /// All live vehicles
    vehicles: HashMap<VehicleId, Vehicle>,

    spawners: Vec<VehicleSpawner>,

    config: SimulationConfig,

    rng: StdRng,

    /// Wall-clock seconds not yet consumed by steps
    accumulator: f64,

    last_poll: Option<Instant>,

    /// Serial for the next spawned vehicle id
    next_serial: u64,

    stats: SimulationStats,
}

impl Simulation {
    pub fn new(graph: RoadGraph, config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            graph,
            vehicles: HashMap::new(),
            spawners: Vec::new(),
            config,
            rng,
            accumulator: 0.0,
            last_poll: None,
            next_serial: 0,
            stats: SimulationStats::default(),
        }
    }

    /// Places an initial vehicle on the edge `src -> dst`.
    ///
    /// Meant for map loading: a missing edge or a full entrance is reported
    /// as an error so the caller can abort startup.
    pub fn add_vehicle(&mut self, mut vehicle: Vehicle, src: &NodeId, dst: &NodeId) -> NetworkResult<()> {
        let index = self.graph.edge_index(src, dst)?;
        let edge = self
            .graph
            .edge_mut(index)
            .ok_or_else(|| NetworkError::NoSuchEdge {
                src: src.clone(),
                dst: dst.clone(),
            })?;

        if !edge.insert(&mut vehicle) {
            return Err(NetworkError::EdgeFull {
                src: src.clone(),
                dst: dst.clone(),
            });
        }

        vehicle.edge = Some(index);
        if self.config.debug {
            debug!("Vehicle {} added on {} -> {} with path {:?}", vehicle.id, src, dst, vehicle.path);
        }
        self.vehicles.insert(vehicle.id.clone(), vehicle);
        Ok(())
    }

    /// Registers a spawner; it inherits the simulation's cost model and debug flag
    pub fn add_spawner(&mut self, mut spawner: VehicleSpawner) {
        spawner.configure(self.config.cost_model, self.config.debug);
        self.spawners.push(spawner);
    }

    pub fn vehicles(&self) -> &HashMap<VehicleId, Vehicle> {
        &self.vehicles
    }

    pub fn vehicle(&self, id: &VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn spawners(&self) -> &[VehicleSpawner] {
        &self.spawners
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            active: self.vehicles.len(),
            ..self.stats
        }
    }

    /// The edge a vehicle currently drives on, as (src, dst)
    pub fn vehicle_location(&self, id: &VehicleId) -> Option<(&NodeId, &NodeId)> {
        let index = self.vehicles.get(id)?.edge?;
        self.graph.edge_endpoints(index)
    }

    /// Signal shown to traffic on `src -> dst` at `dst`
    pub fn signal_state(&self, src: &NodeId, dst: &NodeId) -> SignalState {
        match self.graph.get_intersection(dst) {
            Some(intersection) => intersection.get_state(src),
            None => SignalState::Green,
        }
    }

    /// Polls the wall clock and runs the steps that fit in the elapsed time.
    /// Returns how many steps ran.
    pub fn tick(&mut self) -> u32 {
        let now = Instant::now();
        let elapsed = self
            .last_poll
            .map(|last| now.duration_since(last))
            .unwrap_or_default();
        self.last_poll = Some(now);
        self.advance(elapsed)
    }

    /// Adds `elapsed` to the accumulator and drains it in fixed steps.
    ///
    /// At most `max_steps_per_tick` steps run per call; any backlog beyond
    /// that is dropped so a stalled host does not snowball.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        let step_duration = self.config.tick_duration();
        self.accumulator += elapsed.as_secs_f64();

        let mut steps = 0;
        while self.accumulator >= step_duration && steps < self.config.max_steps_per_tick {
            self.step();
            self.accumulator -= step_duration;
            steps += 1;
        }

        if self.accumulator >= step_duration {
            debug!(
                "Dropping {:.3}s of simulation backlog after {} steps",
                self.accumulator, steps
            );
            self.accumulator %= step_duration;
        }

        steps
    }

    /// Runs `ticks` steps back to back
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Steps until no vehicle is left or `max_ticks` is reached.
    /// Returns the number of steps run.
    pub fn run_until_empty(&mut self, max_ticks: u64) -> u64 {
        let mut ran = 0;
        while !self.vehicles.is_empty() && ran < max_ticks {
            self.step();
            ran += 1;
        }
        ran
    }

    /// One fixed simulation step
    pub fn step(&mut self) {
        self.stats.ticks += 1;

        self.graph.update_intersections();

        self.update_spawners();

        let edges: Vec<EdgeIndex> = self.graph.edge_indices().collect();
        for &index in &edges {
            self.advance_edge(index);
        }

        let mut moved = HashSet::new();
        for &index in &edges {
            self.transfer_from(index, &mut moved);
        }
    }

    fn update_spawners(&mut self) {
        for spawner in &self.spawners {
            if let Some(vehicle) = spawner.update(&mut self.graph, self.next_serial, &mut self.rng) {
                self.next_serial += 1;
                self.stats.spawned += 1;
                self.vehicles.insert(vehicle.id.clone(), vehicle);
            }
        }
    }

    fn advance_edge(&mut self, index: EdgeIndex) {
        let exit_open = match self.graph.edge_endpoints(index) {
            Some((src, dst)) => self.graph.can_pass(src, dst),
            None => return,
        };

        let Some(edge) = self.graph.edge_mut(index) else {
            return;
        };
        edge.advance(exit_open, &mut self.vehicles, &mut self.rng);

        if self.config.debug {
            if let EdgeModel::Cellular(cells) = &*edge {
                if cells.vehicle_count() > 0 {
                    debug!("{:?}: {}", index, cells.render_cells());
                }
            }
        }
    }

    /// Moves the vehicle waiting at the exit of `index` onto its next edge.
    ///
    /// A full next edge leaves the vehicle queued with its path intact; it
    /// is retried on the next step. A route over a missing edge discards
    /// the vehicle. `moved` holds vehicles that already changed edge this
    /// step, so nobody crosses two intersections at once.
    fn transfer_from(&mut self, index: EdgeIndex, moved: &mut HashSet<VehicleId>) {
        let Some((src, dst)) = self
            .graph
            .edge_endpoints(index)
            .map(|(src, dst)| (src.clone(), dst.clone()))
        else {
            return;
        };

        let Some(id) = self
            .graph
            .edge(index)
            .and_then(|edge| edge.peek_last_vehicle())
            .cloned()
        else {
            return;
        };

        if moved.contains(&id) || !self.graph.can_pass(&src, &dst) {
            return;
        }

        let Some(vehicle) = self.vehicles.get_mut(&id) else {
            warn!("Edge {} -> {} held unknown vehicle {}, dropping it", src, dst, id);
            self.pop_from(index);
            return;
        };

        let Some(next) = vehicle.advance_past(&dst) else {
            self.pop_from(index);
            self.vehicles.remove(&id);
            self.stats.arrived += 1;
            if self.config.debug {
                debug!("Vehicle {} arrived at {}", id, dst);
            }
            return;
        };

        let next_index = match self.graph.edge_index(&dst, &next) {
            Ok(next_index) => next_index,
            Err(_) => {
                let error = NetworkError::InvalidRoute {
                    vehicle: id.clone(),
                    from: dst,
                    to: next,
                };
                warn!("{}", error);
                self.pop_from(index);
                self.vehicles.remove(&id);
                self.stats.invalid_routes += 1;
                return;
            }
        };

        let inserted = self
            .graph
            .edge_mut(next_index)
            .is_some_and(|edge| edge.insert(vehicle));

        if inserted {
            vehicle.edge = Some(next_index);
            self.pop_from(index);
            moved.insert(id);
        } else {
            // Spillback: stay queued and retry next step
            vehicle.restore_target(next);
        }
    }

    fn pop_from(&mut self, index: EdgeIndex) -> Option<VehicleId> {
        self.graph.edge_mut(index)?.pop_last_vehicle()
    }

    /// Print a summary of the simulation state
    pub fn print_summary(&self) {
        info!("=== Traffic Simulation Summary ===");
        info!("Ticks: {}", self.stats.ticks);
        info!(
            "Nodes: {}, Edges: {}",
            self.graph.node_count(),
            self.graph.edge_count()
        );
        info!("Total vehicles spawned: {}", self.stats.spawned);
        info!("Total vehicles arrived: {}", self.stats.arrived);
        info!("Invalid routes: {}", self.stats.invalid_routes);
        info!("Active vehicles: {}", self.vehicles.len());

        for (src, dst, edge) in self.graph.edges() {
            let occupation = edge.occupation_ratio();
            if occupation > 0.0 {
                info!("  {} -> {}: {:.1}% occupied", src, dst, occupation * 100.0);
            }
        }
    }
}
