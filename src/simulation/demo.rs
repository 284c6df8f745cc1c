//! Built-in demo networks used by the headless binary

use anyhow::{Context, Result};

use super::config::SimulationConfig;
use super::edge::{CellularEdge, EdgeModel, FluidEdge};
use super::road_network::RoadGraph;
use super::spawner::VehicleSpawner;
use super::types::{
    NodeId, DEFAULT_CELLULAR_VMAX, DEFAULT_DENSITY_MAX, DEFAULT_LIGHT_DURATION, DEFAULT_PROB_SLOW,
};
use super::vehicle::Vehicle;
use super::world::Simulation;

/// Traffic model used for every road of a demo network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoModel {
    Cellular,
    Fluid,
}

impl DemoModel {
    fn make_edge(self, length: f64) -> EdgeModel {
        match self {
            DemoModel::Cellular => {
                CellularEdge::new(length as usize, DEFAULT_CELLULAR_VMAX, DEFAULT_PROB_SLOW).into()
            }
            DemoModel::Fluid => {
                FluidEdge::new(length, DEFAULT_CELLULAR_VMAX as f64, DEFAULT_DENSITY_MAX).into()
            }
        }
    }
}

fn grid_id(row: usize, col: usize) -> NodeId {
    NodeId(format!("n{}{}", row, col))
}

/// A 3x3 grid of two-way roads with a traffic light in the middle,
/// spawners on the corners and one initial vehicle crossing the grid.
pub fn build_demo_simulation(
    model: DemoModel,
    spawn_ratio: f64,
    config: SimulationConfig,
) -> Result<Simulation> {
    let spacing = 40.0;
    let mut graph = RoadGraph::new();

    for row in 0..3 {
        for col in 0..3 {
            graph.add_node(grid_id(row, col), col as f64 * spacing, row as f64 * spacing);
        }
    }

    // Connect grid horizontally
    for row in 0..3 {
        for col in 0..2 {
            graph
                .add_two_way_edge(grid_id(row, col), grid_id(row, col + 1), || {
                    model.make_edge(spacing)
                })
                .context("Failed to connect grid row")?;
        }
    }

    // Connect grid vertically
    for row in 0..2 {
        for col in 0..3 {
            graph
                .add_two_way_edge(grid_id(row, col), grid_id(row + 1, col), || {
                    model.make_edge(spacing)
                })
                .context("Failed to connect grid column")?;
        }
    }

    graph
        .add_traffic_light(&grid_id(1, 1), DEFAULT_LIGHT_DURATION / 5)
        .context("Failed to install center traffic light")?;

    let mut simulation = Simulation::new(graph, config);

    for (row, col) in [(0, 0), (0, 2), (2, 0), (2, 2)] {
        simulation.add_spawner(VehicleSpawner::new(grid_id(row, col), spawn_ratio));
    }

    let vehicle = Vehicle::new("v0".into(), [grid_id(1, 1), grid_id(2, 1), grid_id(2, 2)]);
    simulation
        .add_vehicle(vehicle, &grid_id(0, 1), &grid_id(1, 1))
        .context("Failed to place initial vehicle")?;

    Ok(simulation)
}
