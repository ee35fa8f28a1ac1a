//! Simulation parameters.
//!
//! Field aliases accept the camelCase names used by request payloads
//! (`simulationTime`, `arrivalRate`, `serviceRate`, `numberOfDoctors`), so a
//! request body deserializes straight into a [SimulationConfig].

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::variates::{RandomVariates, Rate};

/// Default observation window: one 8-hour clinic day in minutes.
pub const DEFAULT_HORIZON: f64 = 480.0;
pub const DEFAULT_ARRIVAL_RATE: f64 = 0.2;
pub const DEFAULT_SERVICE_RATE: f64 = 0.1;
pub const DEFAULT_SERVERS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Length of the observation window in simulated time units.
    #[serde(alias = "simulationTime")]
    pub horizon: f64,
    /// Arrivals per time unit (lambda).
    #[serde(alias = "arrivalRate")]
    pub arrival_rate: f64,
    /// Services per time unit per server (mu).
    #[serde(alias = "serviceRate")]
    pub service_rate: f64,
    /// Number of identical servers (c).
    #[serde(alias = "numberOfDoctors")]
    pub servers: usize,
    /// Seed for [SimulationConfig::variates]; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Stop after this many processed events. `None` runs until drained.
    #[serde(alias = "maxEvents")]
    pub max_events: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            arrival_rate: DEFAULT_ARRIVAL_RATE,
            service_rate: DEFAULT_SERVICE_RATE,
            servers: DEFAULT_SERVERS,
            seed: None,
            max_events: None,
        }
    }
}

/// Parameters that passed validation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Validated {
    pub horizon: f64,
    pub arrival_rate: Rate,
    pub service_rate: Rate,
    pub servers: usize,
}

impl SimulationConfig {
    pub fn new(horizon: f64, arrival_rate: f64, service_rate: f64, servers: usize) -> Self {
        Self {
            horizon,
            arrival_rate,
            service_rate,
            servers,
            ..Default::default()
        }
    }

    pub fn with_horizon(mut self, horizon: f64) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_arrival_rate(mut self, rate: f64) -> Self {
        self.arrival_rate = rate;
        self
    }

    pub fn with_service_rate(mut self, rate: f64) -> Self {
        self.service_rate = rate;
        self
    }

    pub fn with_servers(mut self, servers: usize) -> Self {
        self.servers = servers;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_events(mut self, max_events: u64) -> Self {
        self.max_events = Some(max_events);
        self
    }

    /// Checks every parameter the engine depends on.
    pub fn validate(&self) -> SimResult<()> {
        self.validated().map(|_| ())
    }

    pub(crate) fn validated(&self) -> SimResult<Validated> {
        if !(self.horizon > 0.0 && self.horizon.is_finite()) {
            return Err(SimError::not_positive("horizon", self.horizon));
        }
        let arrival_rate = Rate::named("arrival_rate", self.arrival_rate)?;
        let service_rate = Rate::named("service_rate", self.service_rate)?;
        if self.servers == 0 {
            return Err(SimError::InvalidParameter {
                name: "servers",
                value: 0.0,
                reason: "at least one server is required",
            });
        }
        Ok(Validated {
            horizon: self.horizon,
            arrival_rate,
            service_rate,
            servers: self.servers,
        })
    }

    /// Random source for this config: seeded when `seed` is set.
    pub fn variates(&self) -> RandomVariates {
        match self.seed {
            Some(seed) => RandomVariates::seeded(seed),
            None => RandomVariates::from_entropy(),
        }
    }
}
