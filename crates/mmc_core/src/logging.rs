//! Structured logging setup.
//!
//! The engine logs through `tracing`: run start/finish at INFO, finalization at
//! DEBUG, one TRACE record per processed event, and a WARN when a run hits its
//! event cap. Install a subscriber once per process:
//!
//! ```rust
//! mmc_core::logging::init_logging("info");
//! ```
//!
//! `RUST_LOG` takes precedence over the level passed in, e.g.
//! `RUST_LOG=mmc_core::engine=trace`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a fmt subscriber at `level` for the simulator crates.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,mmc_core={level},mmc_experiments={level},mmc_sim={level}"
        ))
    });

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init();
}

/// Installs a subscriber at INFO unless `RUST_LOG` says otherwise.
pub fn init_logging_from_env() {
    init_logging("info");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_is_harmless() {
        init_logging("debug");
        init_logging("trace");
        tracing::info!("logging initialized twice");
    }
}
