use clap::{Parser, ValueEnum};
use log::info;
use traffic_flow::simulation::{
    build_demo_simulation, CostModel, DemoModel, SimulationConfig, DEFAULT_SPAWN_RATIO,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Model {
    Cellular,
    Fluid,
}

#[derive(Parser)]
#[command(name = "traffic_flow")]
#[command(about = "Headless road network traffic simulation")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "2000")]
    ticks: u64,

    /// Ticks per second when running against the wall clock
    #[arg(long, default_value = "1.0")]
    tps: f64,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Traffic model used for every road
    #[arg(long, value_enum, default_value = "cellular")]
    model: Model,

    /// Per-tick spawn probability of each spawner
    #[arg(long, default_value_t = DEFAULT_SPAWN_RATIO)]
    spawn_ratio: f64,

    /// Use the smooth congestion cost instead of the banded one
    #[arg(long)]
    smooth_cost: bool,

    /// Pace steps with the wall clock instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if cli.tps <= 0.0 {
        anyhow::bail!("--tps must be greater than 0");
    }

    let config = SimulationConfig {
        tps: cli.tps,
        seed: cli.seed,
        debug: cli.debug,
        cost_model: if cli.smooth_cost {
            CostModel::Smooth
        } else {
            CostModel::Banded
        },
        ..SimulationConfig::default()
    };

    let model = match cli.model {
        Model::Cellular => DemoModel::Cellular,
        Model::Fluid => DemoModel::Fluid,
    };

    let mut simulation = build_demo_simulation(model, cli.spawn_ratio, config)?;
    info!(
        "Graph loaded: {} nodes, {} edges, {} initial vehicles, {} spawners",
        simulation.graph.node_count(),
        simulation.graph.edge_count(),
        simulation.vehicle_count(),
        simulation.spawners().len()
    );

    info!("Launching simulation for {} ticks...", cli.ticks);
    if cli.realtime {
        // Poll the accumulator; a renderer would draw between polls
        while simulation.stats().ticks < cli.ticks {
            simulation.tick();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    } else {
        simulation.run(cli.ticks);
    }

    info!("=== SIMULATION COMPLETE ===");
    simulation.print_summary();
    Ok(())
}
