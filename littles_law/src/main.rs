use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use littles_law::logging::init_logging;
use littles_law::{
    ModelConfig, ReplicationSummary, SeededUniform, Simulation, SimulationError, replicate,
};
use tracing::{error, info};

/// Simulate a multi-server queue and compare L with λ·W
#[derive(Debug, Parser)]
#[command(name = "littles_law", version)]
struct Args {
    /// TOML file with model parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mean time between arrivals
    #[arg(long)]
    interarrival: Option<f64>,

    /// Mean service time
    #[arg(long)]
    service: Option<f64>,

    /// Number of servers
    #[arg(short = 'k', long)]
    servers: Option<usize>,

    /// Simulated time to run for
    #[arg(long)]
    horizon: Option<f64>,

    /// Time between statistics samples
    #[arg(long)]
    sampling_interval: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Independent replications to run in parallel
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    replications: u64,

    /// Worker threads for replications (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn model_config(&self) -> Result<ModelConfig, SimulationError> {
        let mut config = match &self.config {
            Some(path) => ModelConfig::from_file(path)?,
            None => ModelConfig::default(),
        };
        if let Some(v) = self.interarrival {
            config.mean_interarrival_time = v;
        }
        if let Some(v) = self.service {
            config.mean_service_time = v;
        }
        if let Some(v) = self.servers {
            config.server_capacity = v;
        }
        if let Some(v) = self.horizon {
            config.run_horizon = v;
        }
        if let Some(v) = self.sampling_interval {
            config.sampling_interval = v;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), SimulationError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(args: &Args) -> Result<(), SimulationError> {
    let config = args.model_config()?;
    info!(
        servers = config.server_capacity,
        utilization = config.utilization(),
        horizon = config.run_horizon,
        "configuration loaded"
    );

    if args.replications > 1 {
        let base_seed = config.seed.unwrap_or(0);
        let count = usize::try_from(args.replications).unwrap_or(usize::MAX);
        let reports = replicate(&config, base_seed, count, args.threads)?;
        let summary = ReplicationSummary::from_reports(&reports);
        if args.json {
            print_json(&summary)?;
        } else {
            println!("{}", summary);
        }
        return Ok(());
    }

    let source = match config.seed {
        Some(seed) => SeededUniform::new(seed),
        None => SeededUniform::from_os_rng(),
    };
    let model = Simulation::new(config, source)?.run()?;
    let report = model.report();
    if args.json {
        print_json(&report)?;
    } else {
        println!("{}", report);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "simulation failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_replications_is_refused() {
        assert!(Args::try_parse_from(["littles_law", "--replications", "0"]).is_err());
    }

    #[test]
    fn replications_default_to_one() {
        let args = Args::try_parse_from(["littles_law", "-k", "3"]).unwrap();
        assert_eq!(args.replications, 1);
        assert_eq!(args.servers, Some(3));
    }
}
