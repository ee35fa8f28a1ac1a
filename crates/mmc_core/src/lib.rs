pub mod clock;
pub mod config;
pub mod engine;
pub mod entities;
pub mod error;
pub mod logging;
pub mod profiling;
pub mod report;
pub mod theory;
pub mod variates;
pub mod wait_line;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use config::SimulationConfig;
pub use engine::{simulate, SimulationEngine};
pub use error::{SimError, SimResult};
pub use report::{ServerReport, SimulationReport};
pub use variates::{RandomVariates, Rate, ScriptedVariates, VariateSource};
