//! Core error type shared by the grid, erosion models and integrator.

use thiserror::Error;

/// Errors raised by the erosion core.
///
/// Both variants are fatal: configuration problems are reported before any
/// step runs, invariant violations halt the run at the step that caused them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },
    #[error("Runtime invariant violated: {0}")]
    InvariantViolation(String),
}

impl SimulationError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }
}
