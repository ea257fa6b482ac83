//! mesh4d Simulator CLI
//!
//! Run seeded mesh connectivity simulations and optionally export frames.

use clap::Parser;
use mesh4d_env::EntropySource;
use mesh4d_sim::{RunSummary, ScenarioId, SimConfig, SimError, SimExport, SimFrame, Simulation};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// mesh4d mobile ad-hoc mesh simulator
#[derive(Parser, Debug)]
#[command(name = "mesh4d-sim")]
#[command(about = "Simulate mobility, battery drain and connectivity of a wireless mesh", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = OS entropy, not replayable)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Scenario preset (baseline, open_field, dense_swarm, ble_only, brownout)
    #[arg(short = 'S', long, default_value = "baseline")]
    scenario: String,

    /// JSON config file; replaces the scenario preset
    #[arg(short, long)]
    config: Option<String>,

    /// Override number of nodes
    #[arg(short, long)]
    nodes: Option<usize>,

    /// Override number of ticks
    #[arg(long)]
    steps: Option<u64>,

    /// Override tick duration
    #[arg(long)]
    dt: Option<f64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON summary on stdout
    #[arg(long)]
    json: bool,

    /// Export frames to a JSON file for rendering
    #[arg(long)]
    export: Option<String>,

    /// Export every N ticks
    #[arg(long, default_value = "1")]
    export_every: u64,
}

fn build_config(args: &Args) -> Result<SimConfig, SimError> {
    let seed = args.seed;
    let mut config = match &args.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => args
            .scenario
            .parse::<ScenarioId>()?
            .config(seed.unwrap_or(SimConfig::default().seed)),
    };

    if let Some(seed) = seed {
        config.seed = seed;
    }
    if let Some(nodes) = args.nodes {
        config.num_nodes = nodes;
    }
    if let Some(steps) = args.steps {
        config.steps = steps;
    }
    if let Some(dt) = args.dt {
        config.dt = dt;
    }

    config.validate()?;
    Ok(config)
}

fn run(args: &Args, config: SimConfig) -> Result<(), SimError> {
    let label = match &args.config {
        Some(path) => path.clone(),
        None => args.scenario.clone(),
    };

    let summary = if args.seed == Some(0) {
        drive(args, &label, Simulation::unseeded(config)?.populate()?)?
    } else {
        drive(args, &label, Simulation::populated(config)?)?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!(
            "{} (seed={}): {} ticks, {} connections total, peak {}, {} of {} nodes offline",
            label,
            summary.seed,
            summary.total_ticks,
            summary.total_connections,
            summary.peak_connections,
            summary.final_offline,
            summary.node_count
        );
    }
    Ok(())
}

/// Runs the simulation, exporting frames when requested.
fn drive<E: EntropySource>(
    args: &Args,
    label: &str,
    mut sim: Simulation<E>,
) -> Result<RunSummary, SimError> {
    let Some(path) = &args.export else {
        return sim.run();
    };

    let every = args.export_every.max(1);
    let config = sim.config().clone();
    let mut export = SimExport::new(label, config.seed, config.bounds);
    let summary = sim.run_with(|report, mesh| {
        if report.tick % every == 0 {
            export.add_frame(SimFrame::capture(report, mesh));
        }
    })?;
    export.finalize(summary.clone());
    export
        .write_to_file(path)
        .map_err(|e| SimError::io(path.as_str(), e))?;
    info!("Exported {} frames to {}", export.frames.len(), path);
    Ok(summary)
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging (RUST_LOG overrides the level)
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitCode::FAILURE;
    }

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !args.json {
        info!("mesh4d simulator v{}", env!("CARGO_PKG_VERSION"));
    }

    match run(&args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
