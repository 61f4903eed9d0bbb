//! Independent replications of the default queue model on all cores
//!
//! Each replication gets its own seed, event loop and statistics, so the
//! spread across them shows how far a single run of length `horizon` can be
//! trusted.
//!
//! Run with:
//!   cargo run --release --example parallel_demo -p littles_law

use std::time::Instant;

use littles_law::logging::init_logging;
use littles_law::{ModelConfig, ReplicationSummary, SimulationError, replicate};

fn main() -> Result<(), SimulationError> {
    init_logging("info");

    let config = ModelConfig {
        run_horizon: 50_000.0,
        ..ModelConfig::default()
    };
    let replications = 16;

    println!(
        "Running {} replications of k={} ρ={:.2} to t={}",
        replications,
        config.server_capacity,
        config.utilization(),
        config.run_horizon
    );

    let start = Instant::now();
    let reports = replicate(&config, 1, replications, None)?;
    let elapsed = start.elapsed();

    for (i, report) in reports.iter().enumerate() {
        let error = report.system.relative_error().unwrap_or(f64::NAN);
        println!(
            "  replication {:>2}: {} completed, L={:.4}, |L-λW|/L={:.5}",
            i,
            report.completed_requests,
            report.system.mean_population.unwrap_or(f64::NAN),
            error
        );
    }

    println!();
    print!("{}", ReplicationSummary::from_reports(&reports));
    println!("Finished in {:.2?}", elapsed);
    Ok(())
}
