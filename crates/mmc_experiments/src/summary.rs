//! Aggregation of replicated runs.
//!
//! Results sharing an `experiment_id` are replications of the same parameter
//! point; each summary reports the mean and sample standard deviation of the
//! headline metrics across them.

use serde::Serialize;

use crate::metrics::SimulationResult;

/// Mean and sample standard deviation of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub mean: f64,
    /// Sample standard deviation (n - 1); 0 for a single observation.
    pub std_dev: f64,
}

impl Estimate {
    pub fn from_samples(values: &[f64]) -> Self {
        let n = values.len();
        if n == 0 {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
            };
        }
        let mean = values.iter().sum::<f64>() / n as f64;
        let std_dev = if n > 1 {
            let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (sum_sq / (n - 1) as f64).sqrt()
        } else {
            0.0
        };
        Self { mean, std_dev }
    }

    /// Half-width of a normal-approximation 95% confidence interval.
    pub fn half_width_95(&self, samples: usize) -> f64 {
        if samples < 2 {
            return 0.0;
        }
        1.96 * self.std_dev / (samples as f64).sqrt()
    }
}

/// One parameter point aggregated over its replications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicationSummary {
    pub experiment_id: String,
    pub horizon: f64,
    pub arrival_rate: f64,
    pub service_rate: f64,
    pub servers: usize,
    pub replications: usize,
    pub average_wait: Estimate,
    pub average_queue_length: Estimate,
    pub utilization: Estimate,
    pub theoretical_wait: Option<f64>,
}

/// Group results by experiment in first-appearance order and aggregate each group.
pub fn summarize_replications(results: &[SimulationResult]) -> Vec<ReplicationSummary> {
    let mut groups: Vec<(&str, Vec<&SimulationResult>)> = Vec::new();
    for result in results {
        match groups
            .iter_mut()
            .find(|(id, _)| *id == result.experiment_id)
        {
            Some((_, members)) => members.push(result),
            None => groups.push((result.experiment_id.as_str(), vec![result])),
        }
    }

    groups
        .into_iter()
        .map(|(experiment_id, members)| {
            let first = members[0];
            let metric = |f: fn(&SimulationResult) -> f64| {
                Estimate::from_samples(&members.iter().map(|r| f(r)).collect::<Vec<_>>())
            };
            ReplicationSummary {
                experiment_id: experiment_id.to_string(),
                horizon: first.horizon,
                arrival_rate: first.arrival_rate,
                service_rate: first.service_rate,
                servers: first.servers,
                replications: members.len(),
                average_wait: metric(|r| r.avg_wait),
                average_queue_length: metric(|r| r.avg_queue_length),
                utilization: metric(|r| r.utilization),
                theoretical_wait: first.theoretical_wait,
            }
        })
        .collect()
}
