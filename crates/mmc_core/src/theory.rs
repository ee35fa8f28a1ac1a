//! Closed-form M/M/c results for comparing simulated runs with theory.
//!
//! All expectations are steady-state values and only exist for a stable
//! system (utilization below 1); they return `None` otherwise.

use serde::Serialize;

use crate::config::SimulationConfig;
use crate::error::{SimError, SimResult};
use crate::variates::Rate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmcModel {
    arrival_rate: Rate,
    service_rate: Rate,
    servers: usize,
}

/// Steady-state figures of a stable M/M/c queue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SteadyState {
    pub utilization: f64,
    /// Erlang-C probability that an arrival has to wait.
    pub probability_of_waiting: f64,
    /// Expected number waiting (Lq).
    pub expected_queue_length: f64,
    /// Expected wait before service (Wq).
    pub expected_wait: f64,
    /// Expected time in system (W).
    pub expected_time_in_system: f64,
    /// Expected number in system (L).
    pub expected_in_system: f64,
}

impl MmcModel {
    pub fn new(arrival_rate: f64, service_rate: f64, servers: usize) -> SimResult<Self> {
        if servers == 0 {
            return Err(SimError::InvalidParameter {
                name: "servers",
                value: 0.0,
                reason: "at least one server is required",
            });
        }
        Ok(Self {
            arrival_rate: Rate::named("arrival_rate", arrival_rate)?,
            service_rate: Rate::named("service_rate", service_rate)?,
            servers,
        })
    }

    pub fn from_config(config: &SimulationConfig) -> SimResult<Self> {
        Self::new(config.arrival_rate, config.service_rate, config.servers)
    }

    /// Offered load in Erlangs (λ / μ).
    pub fn offered_load(&self) -> f64 {
        self.arrival_rate.get() / self.service_rate.get()
    }

    /// ρ = λ / (c μ)
    pub fn utilization(&self) -> f64 {
        self.offered_load() / self.servers as f64
    }

    pub fn is_stable(&self) -> bool {
        self.utilization() < 1.0
    }

    /// Erlang-C probability of waiting.
    pub fn probability_of_waiting(&self) -> Option<f64> {
        if !self.is_stable() {
            return None;
        }
        let load = self.offered_load();
        // Erlang B by recurrence, then converted to Erlang C.
        let erlang_b = (1..=self.servers).fold(1.0, |b, k| load * b / (k as f64 + load * b));
        let rho = self.utilization();
        Some(erlang_b / (1.0 - rho * (1.0 - erlang_b)))
    }

    pub fn steady_state(&self) -> Option<SteadyState> {
        let probability_of_waiting = self.probability_of_waiting()?;
        let rho = self.utilization();
        let lambda = self.arrival_rate.get();
        let expected_queue_length = probability_of_waiting * rho / (1.0 - rho);
        let expected_wait = expected_queue_length / lambda;
        let expected_time_in_system = expected_wait + self.service_rate.mean();
        Some(SteadyState {
            utilization: rho,
            probability_of_waiting,
            expected_queue_length,
            expected_wait,
            expected_time_in_system,
            expected_in_system: lambda * expected_time_in_system,
        })
    }
}
