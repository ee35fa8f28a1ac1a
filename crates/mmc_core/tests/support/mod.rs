#![allow(dead_code)]

use mmc_core::entities::ArrivalUnit;
use mmc_core::{SimulationConfig, SimulationEngine, VariateSource};

/// `(id, arrival, service start, departure)` for one unit.
pub type TimelineRow = (u64, f64, Option<f64>, Option<f64>);

/// Every unit the engine knows about, ordered by id.
pub fn timeline<V: VariateSource>(engine: &SimulationEngine<V>) -> Vec<TimelineRow> {
    let mut units: Vec<ArrivalUnit> = engine
        .served_units()
        .iter()
        .chain(engine.in_service_units())
        .chain(engine.waiting_units())
        .copied()
        .collect();
    units.sort_by_key(ArrivalUnit::id);
    units
        .into_iter()
        .map(|u| (u.id(), u.arrival_time(), u.service_start(), u.departure_time()))
        .collect()
}

/// Configurations spanning light, heavy and overloaded traffic.
pub fn load_profiles() -> Vec<SimulationConfig> {
    vec![
        SimulationConfig::new(100.0, 0.5, 1.0, 1),
        SimulationConfig::new(200.0, 0.9, 0.5, 2),
        SimulationConfig::new(120.0, 2.0, 0.3, 3),
        SimulationConfig::default(),
    ]
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
