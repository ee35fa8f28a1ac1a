//! Metrics extraction from completed simulation runs.
//!
//! Flattens a run's report together with its parameters, wait-time
//! percentiles over served units and the analytic M/M/c figures for the same
//! parameters, so results can be compared and exported row by row.

use mmc_core::entities::ArrivalUnit;
use mmc_core::theory::MmcModel;
use mmc_core::{SimulationEngine, SimulationReport, VariateSource};

use crate::parameters::ParameterSet;

/// Aggregated metrics from a single simulation run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SimulationResult {
    pub experiment_id: String,
    pub run_id: usize,
    pub replication: usize,
    pub seed: u64,

    pub horizon: f64,
    pub arrival_rate: f64,
    pub service_rate: f64,
    pub servers: usize,

    pub total_arrived: u64,
    pub total_served: usize,
    /// Units still waiting or in service at the end of the run.
    pub unserved: usize,
    /// Average wait before service over served units.
    pub avg_wait: f64,
    pub median_wait: f64,
    /// P90 wait over served units.
    pub p90_wait: f64,
    pub max_wait: f64,
    pub avg_service_time: f64,
    pub avg_queue_length: f64,
    pub max_queue_length: usize,
    pub utilization: f64,
    pub events_processed: u64,
    pub truncated: bool,

    /// Analytic utilization λ / (c μ); may exceed 1.
    pub theoretical_utilization: f64,
    /// Analytic Lq, only for a stable system.
    pub theoretical_queue_length: Option<f64>,
    /// Analytic Wq, only for a stable system.
    pub theoretical_wait: Option<f64>,
}

impl SimulationResult {
    /// Calculate (average, median, p90) of a sample.
    pub(crate) fn calculate_stats(values: &[f64]) -> (f64, f64, f64) {
        if values.is_empty() {
            return (0.0, 0.0, 0.0);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let avg = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        // P90: floor(0.9 * (n-1))
        let p90_idx = ((n - 1) as f64 * 0.9) as usize;
        let p90 = sorted[p90_idx.min(n - 1)];

        (avg, median, p90)
    }

    /// Difference between the simulated and analytic average wait, if the
    /// system is stable.
    pub fn wait_error(&self) -> Option<f64> {
        self.theoretical_wait.map(|wq| self.avg_wait - wq)
    }
}

/// Extract metrics from a finished engine and its report.
pub fn extract_metrics<V: VariateSource>(
    param_set: &ParameterSet,
    engine: &SimulationEngine<V>,
    report: &SimulationReport,
) -> SimulationResult {
    let waits: Vec<f64> = engine
        .served_units()
        .iter()
        .map(ArrivalUnit::waiting_time)
        .collect();
    let (avg_wait, median_wait, p90_wait) = SimulationResult::calculate_stats(&waits);

    let model = MmcModel::new(report.arrival_rate, report.service_rate, report.servers).ok();
    let steady_state = model.as_ref().and_then(MmcModel::steady_state);

    SimulationResult {
        experiment_id: param_set.experiment_id.clone(),
        run_id: param_set.run_id,
        replication: param_set.replication,
        seed: param_set.seed,
        horizon: report.horizon,
        arrival_rate: report.arrival_rate,
        service_rate: report.service_rate,
        servers: report.servers,
        total_arrived: report.total_arrived,
        total_served: report.total_served,
        unserved: report.unserved(),
        avg_wait,
        median_wait,
        p90_wait,
        max_wait: report.max_wait,
        avg_service_time: report.average_service_time,
        avg_queue_length: report.average_queue_length,
        max_queue_length: report.max_queue_length,
        utilization: report.utilization,
        events_processed: report.events_processed,
        truncated: report.truncated,
        theoretical_utilization: model.map_or(0.0, |m| m.utilization()),
        theoretical_queue_length: steady_state.map(|s| s.expected_queue_length),
        theoretical_wait: steady_state.map(|s| s.expected_wait),
    }
}
