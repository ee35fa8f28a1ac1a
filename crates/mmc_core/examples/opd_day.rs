//! Simulate one outpatient clinic day and print the summary table.
//!
//! Run with: cargo run -p mmc_core --example opd_day

use mmc_core::logging::init_logging;
use mmc_core::theory::MmcModel;
use mmc_core::{SimulationConfig, SimulationEngine};

fn main() {
    init_logging("info");

    // 8-hour day in minutes, one patient every 5 min, 10 min consultations.
    let config = SimulationConfig::default().with_seed(123);

    let mut engine = match SimulationEngine::new(config.clone(), config.variates()) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(1);
        }
    };
    let report = engine.run();

    println!("{report}");
    engine.metrics().print_summary();

    if let Ok(model) = MmcModel::from_config(&config) {
        println!("\nOffered load: {:.2} Erlangs", model.offered_load());
        match model.steady_state() {
            Some(theory) => println!(
                "Theoretical wait (Wq): {:.2}, queue length (Lq): {:.2}",
                theory.expected_wait, theory.expected_queue_length
            ),
            None => println!(
                "Utilization {:.2} >= 1: no steady state, the queue grows over the day.",
                model.utilization()
            ),
        }
    }

    let mut served = engine.served_units().to_vec();
    served.sort_by(|a, b| b.waiting_time().total_cmp(&a.waiting_time()));
    println!("\nLongest waits:");
    for unit in served.iter().take(5) {
        println!(
            "  patient {:>3}  arrived {:>6.1}  waited {:>5.1} min",
            unit.id(),
            unit.arrival_time(),
            unit.waiting_time()
        );
    }
}
