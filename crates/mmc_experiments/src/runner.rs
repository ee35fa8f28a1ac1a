//! Parallel simulation execution using rayon.
//!
//! This module provides functions to run single simulations and execute
//! multiple simulations in parallel for parameter sweeps.

use indicatif::{ProgressBar, ProgressStyle};
use mmc_core::{RandomVariates, SimulationEngine};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::metrics::{extract_metrics, SimulationResult};
use crate::parameters::ParameterSet;

/// Run a single simulation with the given parameter set.
///
/// Builds an engine seeded with the set's seed, runs it to completion and
/// extracts metrics.
///
/// # Errors
///
/// Returns a message naming the experiment when the parameters are invalid.
pub fn run_single_simulation(param_set: &ParameterSet) -> Result<SimulationResult, String> {
    let config = param_set.simulation_config();
    let mut engine = SimulationEngine::new(config, RandomVariates::seeded(param_set.seed))
        .map_err(|error| {
            format!(
                "{} (run {}): {error}",
                param_set.experiment_id, param_set.run_id
            )
        })?;

    let report = engine.run();
    debug!(
        experiment = %param_set.experiment_id,
        run = param_set.run_id,
        events = report.events_processed,
        "run complete"
    );
    Ok(extract_metrics(param_set, &engine, &report))
}

/// Run multiple simulations in parallel.
///
/// Uses rayon to execute simulations concurrently across available CPU cores.
/// Each simulation runs independently with no shared state.
///
/// # Arguments
///
/// * `parameter_sets` - Vector of parameter sets to run
/// * `num_threads` - Optional number of threads to use. If None, uses rayon's default.
///
/// # Returns
///
/// Results in the same order as the input parameter sets, or the first error.
pub fn run_parallel_experiments(
    parameter_sets: Vec<ParameterSet>,
    num_threads: Option<usize>,
) -> Result<Vec<SimulationResult>, String> {
    run_parallel_experiments_with_progress(parameter_sets, num_threads, true)
}

/// Run multiple simulations in parallel with optional progress bar.
///
/// # Arguments
///
/// * `parameter_sets` - Vector of parameter sets to run
/// * `num_threads` - Optional number of threads to use. If None, uses rayon's default.
/// * `show_progress` - Whether to display a progress bar
pub fn run_parallel_experiments_with_progress(
    parameter_sets: Vec<ParameterSet>,
    num_threads: Option<usize>,
    show_progress: bool,
) -> Result<Vec<SimulationResult>, String> {
    let total = parameter_sets.len();
    let pb = if show_progress && total > 0 {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .map_err(|error| format!("Invalid progress template: {error}"))?
                .progress_chars("#>-"),
        );
        Some(bar)
    } else {
        None
    };

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = num_threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder
        .build()
        .map_err(|error| format!("Failed to create thread pool: {error}"))?;

    info!(runs = total, threads = pool.current_num_threads(), "starting parameter sweep");

    let pb_clone = pb.clone();
    let results = pool.install(|| {
        parameter_sets
            .par_iter()
            .map(|param_set| {
                let result = run_single_simulation(param_set);
                if let Some(ref progress_bar) = pb_clone {
                    progress_bar.inc(1);
                }
                result
            })
            .collect::<Result<Vec<_>, String>>()
    });

    if let Some(ref progress_bar) = pb {
        progress_bar.finish_with_message("Completed");
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::ParameterSpace;

    #[test]
    fn test_single_simulation() {
        let sets = ParameterSpace::grid()
            .horizon(vec![120.0])
            .base_seed(3)
            .generate();
        let result = run_single_simulation(&sets[0]).unwrap();

        assert!(result.total_arrived > 0);
        assert_eq!(result.seed, 3);
        assert_eq!(result.servers, 2);
        assert_eq!(result, run_single_simulation(&sets[0]).unwrap());
    }

    #[test]
    fn test_invalid_parameters_are_reported() {
        let sets = ParameterSpace::grid().servers(vec![0]).generate();
        let error = run_single_simulation(&sets[0]).unwrap_err();
        assert!(error.contains("exp_0"));
        assert!(error.contains("servers"));
    }

    #[test]
    fn test_parallel_experiments() {
        let sets = ParameterSpace::grid()
            .arrival_rate(vec![0.1, 0.2])
            .servers(vec![2, 3])
            .horizon(vec![60.0])
            .generate();
        let results = run_parallel_experiments_with_progress(sets.clone(), Some(2), false).unwrap();

        assert_eq!(results.len(), 4);
        for (result, set) in results.iter().zip(&sets) {
            assert_eq!(result.run_id, set.run_id);
            assert_eq!(result.servers, set.config.servers);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sets = ParameterSpace::grid()
            .servers(vec![1, 2])
            .horizon(vec![100.0])
            .replications(3)
            .generate();
        let sequential: Vec<SimulationResult> = sets
            .iter()
            .map(|set| run_single_simulation(set).unwrap())
            .collect();
        let parallel = run_parallel_experiments_with_progress(sets, Some(3), false).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_parallel_propagates_errors() {
        let sets = ParameterSpace::grid().servers(vec![1, 0]).generate();
        assert!(run_parallel_experiments_with_progress(sets, Some(1), false).is_err());
    }
}
