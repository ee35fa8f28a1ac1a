use crate::metrics::SimulationResult;

const HEADERS: [&str; 26] = [
    "experiment_id",
    "run_id",
    "replication",
    "seed",
    "horizon",
    "arrival_rate",
    "service_rate",
    "servers",
    "total_arrived",
    "total_served",
    "unserved",
    "avg_wait",
    "median_wait",
    "p90_wait",
    "max_wait",
    "avg_service_time",
    "avg_queue_length",
    "max_queue_length",
    "utilization",
    "events_processed",
    "truncated",
    "theoretical_utilization",
    "theoretical_queue_length",
    "theoretical_wait",
    "wait_error",
    "stable",
];

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub(crate) fn export_to_csv_impl(
    results: &[SimulationResult],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record(HEADERS)?;

    for result in results {
        wtr.write_record([
            result.experiment_id.clone(),
            result.run_id.to_string(),
            result.replication.to_string(),
            result.seed.to_string(),
            result.horizon.to_string(),
            result.arrival_rate.to_string(),
            result.service_rate.to_string(),
            result.servers.to_string(),
            result.total_arrived.to_string(),
            result.total_served.to_string(),
            result.unserved.to_string(),
            result.avg_wait.to_string(),
            result.median_wait.to_string(),
            result.p90_wait.to_string(),
            result.max_wait.to_string(),
            result.avg_service_time.to_string(),
            result.avg_queue_length.to_string(),
            result.max_queue_length.to_string(),
            result.utilization.to_string(),
            result.events_processed.to_string(),
            result.truncated.to_string(),
            result.theoretical_utilization.to_string(),
            optional(result.theoretical_queue_length),
            optional(result.theoretical_wait),
            optional(result.wait_error()),
            result.theoretical_wait.is_some().to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
