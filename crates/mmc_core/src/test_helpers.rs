//! Test helpers for common test setup and utilities.
//!
//! Deterministic engines where every inter-arrival gap and every service time
//! is a fixed constant, so timelines can be checked by hand.

use crate::config::SimulationConfig;
use crate::engine::SimulationEngine;
use crate::entities::ArrivalUnit;
use crate::report::SimulationReport;
use crate::variates::{RandomVariates, ScriptedVariates, VariateSource};

/// Tolerance for floating-point accumulations in assertions.
pub const EPSILON: f64 = 1e-9;

/// Config whose rates are the reciprocals of `gap` and `service`.
pub fn constant_config(servers: usize, gap: f64, service: f64, horizon: f64) -> SimulationConfig {
    SimulationConfig::new(horizon, 1.0 / gap, 1.0 / service, servers)
}

/// Scripted source returning exactly `gap` for arrivals and `service` for
/// service times under [constant_config]. Equal values share one rate, which
/// is still exact.
///
/// # Panics
///
/// Panics if `gap` or `service` is not positive and finite.
pub fn constant_variates(gap: f64, service: f64) -> ScriptedVariates {
    ScriptedVariates::new()
        .with_constant(1.0 / gap, gap)
        .and_then(|variates| variates.with_constant(1.0 / service, service))
        .expect("constant durations should be positive and finite")
}

/// Engine with a constant inter-arrival `gap` and constant `service` time.
///
/// # Panics
///
/// Panics if the derived parameters are invalid.
pub fn constant_engine(
    servers: usize,
    gap: f64,
    service: f64,
    horizon: f64,
) -> SimulationEngine<ScriptedVariates> {
    SimulationEngine::new(
        constant_config(servers, gap, service, horizon),
        constant_variates(gap, service),
    )
    .expect("constant engine parameters should be valid")
}

/// Seeded stochastic engine.
///
/// # Panics
///
/// Panics if `config` is invalid.
pub fn seeded_engine(config: SimulationConfig, seed: u64) -> SimulationEngine<RandomVariates> {
    SimulationEngine::new(config, RandomVariates::seeded(seed))
        .expect("seeded engine parameters should be valid")
}

/// Asserts the invariants every finished run must satisfy.
///
/// # Panics
///
/// Panics with a description of the first violated invariant.
pub fn assert_run_invariants<V: VariateSource>(
    engine: &SimulationEngine<V>,
    report: &SimulationReport,
) {
    let waiting = engine.waiting_units().count();
    let in_service = engine.in_service_units().count();
    assert_eq!(
        report.total_arrived as usize,
        report.total_served + waiting + in_service,
        "every arrived unit is served, waiting, or in service"
    );

    for unit in engine.served_units() {
        assert!(unit.waiting_time() >= 0.0, "negative wait for unit {}", unit.id());
        assert!(unit.service_time() >= 0.0, "negative service for unit {}", unit.id());
    }

    assert!(report.average_queue_length >= 0.0);
    assert!(report.max_queue_length as f64 + EPSILON >= report.average_queue_length);

    assert!(report.utilization >= 0.0 && report.utilization <= 1.0 + EPSILON);
    for server in &report.per_server {
        assert!(
            server.utilization >= 0.0 && server.utilization <= 1.0 + EPSILON,
            "server {} utilization {}",
            server.id,
            server.utilization
        );
    }

    assert_fifo(engine);
}

/// Asserts that service starts follow arrival order across all started units.
///
/// # Panics
///
/// Panics if a later arrival started service before an earlier one.
pub fn assert_fifo<V: VariateSource>(engine: &SimulationEngine<V>) {
    let mut started: Vec<ArrivalUnit> = engine
        .served_units()
        .iter()
        .chain(engine.in_service_units())
        .copied()
        .collect();
    started.sort_by_key(ArrivalUnit::id);

    for pair in started.windows(2) {
        let (earlier, later) = (&pair[0], &pair[1]);
        assert!(
            earlier.service_start() <= later.service_start(),
            "unit {} started after unit {}",
            earlier.id(),
            later.id()
        );
    }

    if let (Some(last_started), Some(first_waiting)) =
        (started.last(), engine.waiting_units().next())
    {
        assert!(last_started.id() < first_waiting.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_variates_match_config_rates() {
        let config = constant_config(1, 2.0, 0.5, 20.0);
        let mut variates = constant_variates(2.0, 0.5);
        assert_eq!(variates.exponential(config.arrival_rate).unwrap(), 2.0);
        assert_eq!(variates.exponential(config.service_rate).unwrap(), 0.5);
    }

    #[test]
    fn constant_engine_runs() {
        let mut engine = constant_engine(1, 1.0, 0.5, 5.0);
        let report = engine.run();
        assert_run_invariants(&engine, &report);
    }
}
