//! Command-line front end for the M/M/c queue simulator.
//!
//! ```text
//! mmc_sim run --servers 3 --seed 42
//! mmc_sim run --config clinic.json --json
//! mmc_sim sweep --servers 2,3,4 --replications 20 --output results.csv --format csv
//! ```

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{Args, Parser, Subcommand, ValueEnum};
use mmc_core::logging::init_logging;
use mmc_core::theory::MmcModel;
use mmc_core::{SimulationConfig, SimulationEngine};
use mmc_experiments::runner::run_parallel_experiments_with_progress;
use mmc_experiments::{
    export_summaries_to_json, export_to_csv, export_to_json, summarize_replications,
    ParameterSpace,
};
use tracing::info;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "mmc_sim",
    about = "Discrete-event simulator for multi-server (M/M/c) queues",
    long_about = "Simulates a queue with Poisson arrivals, exponential service times\n\
                  and identical servers over a fixed horizon, and runs replicated\n\
                  parameter sweeps."
)]
struct Cli {
    /// Log level for the simulator crates (RUST_LOG overrides)
    #[arg(long, global = true, default_value = "warn", env = "MMC_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation and print its report
    Run(RunArgs),
    /// Run a replicated parameter sweep in parallel
    Sweep(SweepArgs),
}

#[derive(Args)]
struct RunArgs {
    /// JSON file with a simulation config; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Length of the observation window
    #[arg(long)]
    horizon: Option<f64>,
    /// Arrivals per time unit
    #[arg(long)]
    arrival_rate: Option<f64>,
    /// Services per time unit per server
    #[arg(long)]
    service_rate: Option<f64>,
    /// Number of servers
    #[arg(long)]
    servers: Option<usize>,
    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    /// Stop after this many events
    #[arg(long)]
    max_events: Option<u64>,
    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SweepArgs {
    /// JSON file with the base config for unspecified parameters
    #[arg(long)]
    config: Option<PathBuf>,
    /// Arrival rates to explore
    #[arg(long, value_delimiter = ',')]
    arrival_rates: Vec<f64>,
    /// Service rates to explore
    #[arg(long, value_delimiter = ',')]
    service_rates: Vec<f64>,
    /// Server counts to explore
    #[arg(long, value_delimiter = ',')]
    servers: Vec<usize>,
    /// Horizons to explore
    #[arg(long, value_delimiter = ',')]
    horizons: Vec<f64>,
    /// Independent runs per parameter combination
    #[arg(long, default_value_t = 10)]
    replications: usize,
    /// Seed of the first run; run i uses base_seed + i
    #[arg(long, default_value_t = 42)]
    base_seed: u64,
    /// Worker threads (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,
    /// Output file for per-run results
    #[arg(long, default_value = "mmc_results.json")]
    output: PathBuf,
    /// Output format
    #[arg(value_enum, long, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// Also write replication summaries to this JSON file
    #[arg(long)]
    summary_output: Option<PathBuf>,
    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

// ── helpers ────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> Result<SimulationConfig, Box<dyn Error>> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|error| format!("cannot read {}: {error}", path.display()))?;
            Ok(serde_json::from_str(&text)
                .map_err(|error| format!("invalid config {}: {error}", path.display()))?)
        }
        None => Ok(SimulationConfig::default()),
    }
}

fn run_config(args: &RunArgs) -> Result<SimulationConfig, Box<dyn Error>> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(horizon) = args.horizon {
        config = config.with_horizon(horizon);
    }
    if let Some(rate) = args.arrival_rate {
        config = config.with_arrival_rate(rate);
    }
    if let Some(rate) = args.service_rate {
        config = config.with_service_rate(rate);
    }
    if let Some(servers) = args.servers {
        config = config.with_servers(servers);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(max_events) = args.max_events {
        config = config.with_max_events(max_events);
    }
    Ok(config)
}

// ── commands ───────────────────────────────────────────────────────

fn run(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let config = run_config(&args)?;
    let variates = config.variates();
    let mut engine = SimulationEngine::new(config.clone(), variates)?;
    let report = engine.run();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{report}");
    let model = MmcModel::from_config(&config)?;
    match model.steady_state() {
        Some(theory) => {
            println!("Theoretical (steady state):");
            println!("  Utilization:          {:.2}%", theory.utilization * 100.0);
            println!("  Average Waiting Time: {:.2}", theory.expected_wait);
            println!("  Average Queue Length: {:.2}", theory.expected_queue_length);
        }
        None => println!(
            "Offered load {:.2} on {} servers: no steady state (utilization >= 100%).",
            model.offered_load(),
            config.servers
        ),
    }
    Ok(())
}

fn sweep(args: SweepArgs) -> Result<(), Box<dyn Error>> {
    let base = load_config(args.config.as_deref())?;
    let space = ParameterSpace::grid()
        .with_base(base)
        .arrival_rate(args.arrival_rates)
        .service_rate(args.service_rates)
        .servers(args.servers)
        .horizon(args.horizons)
        .replications(args.replications)
        .base_seed(args.base_seed);

    let parameter_sets = space.generate();
    info!(runs = parameter_sets.len(), "generated parameter sets");
    let results =
        run_parallel_experiments_with_progress(parameter_sets, args.threads, !args.quiet)?;

    match args.format {
        OutputFormat::Json => export_to_json(&results, &args.output)?,
        OutputFormat::Csv => export_to_csv(&results, &args.output)?,
    }
    eprintln!("Wrote {} results to {}", results.len(), args.output.display());

    let summaries = summarize_replications(&results);
    if let Some(path) = &args.summary_output {
        export_summaries_to_json(&summaries, path)?;
        eprintln!("Wrote {} summaries to {}", summaries.len(), path.display());
    }

    println!(
        "{:<8} {:>8} {:>8} {:>7} {:>8} {:>18} {:>18} {:>10}",
        "exp", "lambda", "mu", "servers", "horizon", "avg wait", "avg queue", "theory Wq"
    );
    for summary in &summaries {
        println!(
            "{:<8} {:>8.3} {:>8.3} {:>7} {:>8.1} {:>9.2} ± {:<6.2} {:>9.2} ± {:<6.2} {:>10}",
            summary.experiment_id,
            summary.arrival_rate,
            summary.service_rate,
            summary.servers,
            summary.horizon,
            summary.average_wait.mean,
            summary.average_wait.half_width_95(summary.replications),
            summary.average_queue_length.mean,
            summary.average_queue_length.half_width_95(summary.replications),
            summary
                .theoretical_wait
                .map(|wq| format!("{wq:.2}"))
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let outcome = match cli.command {
        Commands::Run(args) => run(args),
        Commands::Sweep(args) => sweep(args),
    };

    if let Err(error) = outcome {
        eprintln!("error: {error}");
        exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"simulationTime": 600, "arrivalRate": 0.3, "numberOfDoctors": 3}}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let cli = Cli::parse_from(["mmc_sim", "run", "--config", path, "--servers", "4"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        let config = run_config(&args).unwrap();
        assert_eq!(config.horizon, 600.0);
        assert_eq!(config.arrival_rate, 0.3);
        assert_eq!(config.service_rate, 0.1);
        assert_eq!(config.servers, 4);
    }

    #[test]
    fn sweep_lists_are_comma_separated() {
        let cli = Cli::parse_from([
            "mmc_sim",
            "sweep",
            "--servers",
            "2,3,4",
            "--arrival-rates",
            "0.1,0.2",
            "--format",
            "csv",
        ]);
        let Commands::Sweep(args) = cli.command else {
            panic!("expected sweep command");
        };
        assert_eq!(args.servers, vec![2, 3, 4]);
        assert_eq!(args.arrival_rates, vec![0.1, 0.2]);
        assert!(matches!(args.format, OutputFormat::Csv));
        assert_eq!(args.replications, 10);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/mmc.json"))).is_err());
    }
}
