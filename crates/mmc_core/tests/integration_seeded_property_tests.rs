mod support;

use mmc_core::test_helpers::{assert_run_invariants, seeded_engine};
use mmc_core::{simulate, RandomVariates, SimulationEngine};
use support::load_profiles;

#[test]
fn invariants_hold_across_seeds_and_loads() {
    for config in load_profiles() {
        for seed in 0..25 {
            let mut engine = seeded_engine(config.clone(), seed);
            let report = engine.run();
            assert_run_invariants(&engine, &report);
            assert!(!report.truncated);
            assert_eq!(engine.pending_departures(), 0);
        }
    }
}

#[test]
fn service_never_starts_after_the_horizon() {
    for config in load_profiles() {
        let mut engine = seeded_engine(config, 7);
        engine.run();
        let horizon = engine.horizon();
        for unit in engine.served_units() {
            assert!(unit.arrival_time() <= horizon);
            assert!(unit.service_start().is_some_and(|start| start <= horizon));
        }
        for unit in engine.waiting_units() {
            assert!(unit.arrival_time() <= horizon);
        }
    }
}

#[test]
fn same_seed_same_report() {
    for config in load_profiles() {
        let seeded = config.with_seed(99);
        assert_eq!(simulate(&seeded).unwrap(), simulate(&seeded).unwrap());
    }
}

#[test]
fn different_seeds_diverge() {
    let config = load_profiles().remove(1);
    let a = SimulationEngine::new(config.clone(), RandomVariates::seeded(1))
        .unwrap()
        .run();
    let b = SimulationEngine::new(config, RandomVariates::seeded(2))
        .unwrap()
        .run();
    assert_ne!(a, b);
}

#[test]
fn default_clinic_day_is_busy() {
    let report = simulate(&mmc_core::SimulationConfig::default().with_seed(42)).unwrap();
    assert!(report.total_arrived > 0);
    assert_eq!(report.servers, 2);
    assert_eq!(report.per_server.len(), 2);
    assert!(report.utilization > 0.5);
}
