//! Result export.
//!
//! Writes per-run results to JSON or CSV, and replication summaries to JSON.

use std::path::Path;

use crate::metrics::SimulationResult;
use crate::summary::ReplicationSummary;

#[path = "export/csv.rs"]
mod csv;
#[path = "export/json.rs"]
mod json;
#[path = "export/writer_utils.rs"]
mod writer_utils;

/// Export simulation results to JSON format.
///
/// Creates a JSON file with an array of all results (serialized as JSON objects).
///
/// # Errors
///
/// Returns an error if `results` is empty, or if file creation or JSON
/// serialization fails.
pub fn export_to_json(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    json::export_to_json_impl(results, file)
}

/// Export replication summaries to JSON format.
///
/// # Errors
///
/// Returns an error if `summaries` is empty, or if file creation or JSON
/// serialization fails.
pub fn export_summaries_to_json(
    summaries: &[ReplicationSummary],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(summaries)?;
    let file = writer_utils::create_output_file(path)?;
    json::export_to_json_impl(summaries, file)
}

/// Export simulation results to CSV format.
///
/// One row per run with the run's parameters followed by its metrics.
/// Analytic figures are left empty for unstable parameter points.
///
/// # Errors
///
/// Returns an error if `results` is empty, or if file creation or CSV
/// writing fails.
pub fn export_to_csv(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    csv::export_to_csv_impl(results, file)
}
