//! Simulation configuration

/// Which congestion penalty the default routing cost applies to cellular edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostModel {
    /// Step penalties: x1.5 above 50% occupancy, x3 above 80%
    #[default]
    Banded,
    /// `distance * (1 + occupancy^2 * 10)`
    Smooth,
}

/// Runtime settings threaded into the simulation and its spawners
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Simulation steps per second of wall-clock time
    pub tps: f64,
    /// Upper bound on steps run by a single accumulator poll
    pub max_steps_per_tick: u32,
    /// Seed for the simulation RNG; entropy-seeded when absent
    pub seed: Option<u64>,
    /// Emit per-edge console renderings and per-vehicle traces
    pub debug: bool,
    pub cost_model: CostModel,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tps: 1.0,
            max_steps_per_tick: 5,
            seed: None,
            debug: false,
            cost_model: CostModel::default(),
        }
    }
}

impl SimulationConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Duration of one step in seconds
    pub fn tick_duration(&self) -> f64 {
        1.0 / self.tps
    }
}
