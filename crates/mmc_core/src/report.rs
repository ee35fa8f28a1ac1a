//! Statistics produced at the end of a run.

use std::fmt;

use serde::Serialize;

use crate::entities::ServerId;

/// Per-server slice of a [SimulationReport].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerReport {
    pub id: ServerId,
    /// Busy time credited inside the observed window.
    pub busy_time: f64,
    /// `busy_time / observed_time`.
    pub utilization: f64,
    pub units_served: u64,
}

/// Outcome of one simulation run.
///
/// Utilizations are fractions in `[0, 1]`; small overshoot from floating-point
/// accumulation is possible and callers should clamp for display if needed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub horizon: f64,
    /// Length of the window the time averages cover. Equals `horizon` unless
    /// the run was finished before reaching it.
    pub observed_time: f64,
    pub arrival_rate: f64,
    pub service_rate: f64,
    pub servers: usize,

    pub total_arrived: u64,
    pub total_served: usize,
    /// Units still held by a server when the run ended.
    pub in_service_at_end: usize,
    /// Units still in the wait-line when the run ended.
    pub waiting_at_end: usize,

    /// Mean of `service_start - arrival` over served units.
    pub average_wait: f64,
    pub max_wait: f64,
    /// Mean of `departure - service_start` over served units.
    pub average_service_time: f64,
    /// Time-integral of the wait-line length divided by `observed_time`.
    pub average_queue_length: f64,
    pub max_queue_length: usize,

    /// Total busy time over `observed_time * servers`.
    pub utilization: f64,
    pub per_server: Vec<ServerReport>,

    pub events_processed: u64,
    /// Simulated time of the last processed event.
    pub end_time: f64,
    /// True when the run stopped at its event cap instead of draining.
    pub truncated: bool,
}

impl SimulationReport {
    pub fn per_server_utilization(&self) -> Vec<f64> {
        self.per_server.iter().map(|s| s.utilization).collect()
    }

    pub fn total_busy_time(&self) -> f64 {
        self.per_server.iter().map(|s| s.busy_time).sum()
    }

    /// Units that arrived but did not finish service.
    pub fn unserved(&self) -> usize {
        self.in_service_at_end + self.waiting_at_end
    }
}

/// Arithmetic mean, 0 for an empty sequence.
pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

const RULE: &str = "=====================================";

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "SIMULATION RESULTS")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Simulation Time:        {:.2}", self.horizon)?;
        writeln!(f, "Arrival Rate:           {:.4}", self.arrival_rate)?;
        writeln!(f, "Service Rate:           {:.4}", self.service_rate)?;
        writeln!(f, "Servers:                {}", self.servers)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Total Arrived:          {}", self.total_arrived)?;
        writeln!(f, "Total Served:           {}", self.total_served)?;
        if self.unserved() > 0 {
            writeln!(
                f,
                "Unserved at End:        {} ({} in service, {} waiting)",
                self.unserved(),
                self.in_service_at_end,
                self.waiting_at_end
            )?;
        }
        writeln!(f, "Average Waiting Time:   {:.2}", self.average_wait)?;
        writeln!(f, "Maximum Waiting Time:   {:.2}", self.max_wait)?;
        writeln!(f, "Average Service Time:   {:.2}", self.average_service_time)?;
        writeln!(f, "Average Queue Length:   {:.2}", self.average_queue_length)?;
        writeln!(f, "Maximum Queue Length:   {}", self.max_queue_length)?;
        writeln!(f, "Service Utilization:    {:.2}%", self.utilization * 100.0)?;
        writeln!(f)?;
        writeln!(f, "Per-Server Statistics:")?;
        writeln!(f, "----------------------")?;
        for server in &self.per_server {
            writeln!(
                f,
                "Server {} Utilization: {:.2}% ({} served)",
                server.id,
                server.utilization * 100.0,
                server.units_served
            )?;
        }
        if self.truncated {
            writeln!(
                f,
                "\nRun stopped at its event cap after {} events (observed up to {:.2}).",
                self.events_processed,
                self.observed_time
            )?;
        }
        write!(f, "{RULE}")
    }
}
