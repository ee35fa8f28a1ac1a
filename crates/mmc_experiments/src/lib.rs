//! Replicated and parallel parameter sweeps for the M/M/c queue simulator.
//!
//! Runs many independent simulations across a grid of arrival rates, service
//! rates, server counts and horizons, extracts per-run metrics, aggregates
//! replications and exports the results.
//!
//! # Quick Start
//!
//! ```no_run
//! use mmc_experiments::{ParameterSpace, run_parallel_experiments, summarize_replications};
//!
//! // How many doctors keep the average wait under 15 minutes?
//! let space = ParameterSpace::grid()
//!     .arrival_rate(vec![0.2])
//!     .service_rate(vec![0.1])
//!     .servers(vec![2, 3, 4])
//!     .replications(20)
//!     .base_seed(42);
//!
//! let results = run_parallel_experiments(space.generate(), None).unwrap();
//! for summary in summarize_replications(&results) {
//!     println!("{} servers: {:.1} min", summary.servers, summary.average_wait.mean);
//! }
//! ```
//!
//! # Architecture
//!
//! - [`parameters`]: grid definition and seeded parameter sets
//! - [`runner`]: single and parallel execution using rayon
//! - [`metrics`]: per-run metrics extraction
//! - [`summary`]: aggregation over replications
//! - [`export`]: JSON and CSV export

pub mod export;
pub mod metrics;
pub mod parameters;
pub mod runner;
pub mod summary;

pub use export::{export_summaries_to_json, export_to_csv, export_to_json};
pub use metrics::SimulationResult;
pub use parameters::{ParameterSet, ParameterSpace};
pub use runner::{run_parallel_experiments, run_single_simulation};
pub use summary::{summarize_replications, Estimate, ReplicationSummary};
