//! Example: staffing sweep for an outpatient clinic.
//!
//! This example demonstrates how to:
//! 1. Define a grid over server counts and arrival rates
//! 2. Run replicated simulations in parallel
//! 3. Aggregate replications and compare with Erlang-C
//! 4. Find the smallest staffing level meeting a wait target
//! 5. Export results to CSV
//!
//! Run with: cargo run -p mmc_experiments --example parameter_sweep

use mmc_experiments::{
    export_to_csv, run_parallel_experiments, summarize_replications, ParameterSpace,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    const TARGET_WAIT_MINUTES: f64 = 15.0;

    println!("Starting staffing sweep...");
    let space = ParameterSpace::grid()
        .arrival_rate(vec![0.15, 0.2, 0.25])
        .service_rate(vec![0.1])
        .servers(vec![2, 3, 4, 5])
        .horizon(vec![480.0])
        .replications(30)
        .base_seed(2024);

    let parameter_sets = space.generate();
    println!("Generated {} runs", parameter_sets.len());

    let results = run_parallel_experiments(parameter_sets, None)?;
    println!("Completed {} simulations", results.len());

    let summaries = summarize_replications(&results);
    println!("\n=== Average wait by staffing level ===");
    for summary in &summaries {
        let theory = summary
            .theoretical_wait
            .map(|wq| format!("{wq:.1}"))
            .unwrap_or_else(|| "unstable".to_string());
        println!(
            "lambda={:.2} servers={}  wait={:.1} ± {:.1} min  (Erlang-C: {})",
            summary.arrival_rate,
            summary.servers,
            summary.average_wait.mean,
            summary.average_wait.half_width_95(summary.replications),
            theory
        );
    }

    println!("\n=== Smallest staffing meeting {TARGET_WAIT_MINUTES} min ===");
    for arrival_rate in [0.15, 0.2, 0.25] {
        let best = summaries
            .iter()
            .filter(|s| s.arrival_rate == arrival_rate)
            .filter(|s| s.average_wait.mean <= TARGET_WAIT_MINUTES)
            .min_by_key(|s| s.servers);
        match best {
            Some(s) => println!("lambda={arrival_rate:.2}: {} servers", s.servers),
            None => println!("lambda={arrival_rate:.2}: more than 5 servers needed"),
        }
    }

    export_to_csv(&results, "staffing_sweep.csv")?;
    println!("\nResults exported to staffing_sweep.csv");

    Ok(())
}
