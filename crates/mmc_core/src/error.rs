//! Error types for the queue simulator.

use thiserror::Error;

/// Errors raised while validating simulation parameters or variate requests.
///
/// Nothing in a run can fail once the engine has been constructed, so every
/// variant here describes a bad input the caller has to reject up front.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("invalid uniform bounds: min ({min}) must be less than max ({max})")]
    InvalidBounds { min: f64, max: f64 },
}

impl SimError {
    pub(crate) fn not_positive(name: &'static str, value: f64) -> Self {
        SimError::InvalidParameter {
            name,
            value,
            reason: "must be a positive, finite number",
        }
    }

    /// Both variants are parameter errors from the caller's point of view.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(
            self,
            SimError::InvalidParameter { .. } | SimError::InvalidBounds { .. }
        )
    }

    /// Name of the offending parameter, when there is a single one.
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            SimError::InvalidParameter { name, .. } => Some(*name),
            SimError::InvalidBounds { .. } => None,
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
