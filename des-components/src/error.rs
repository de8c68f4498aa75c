//! Error types for simulation components

use des_core::SimError;
use thiserror::Error;

/// Errors raised while validating or loading a run configuration.
///
/// All of them are reported before any simulated time advances.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Field '{field}' must be {constraint}")]
    ConstraintViolation { field: String, constraint: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Name of the offending field, for validation errors.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::InvalidValue { field, .. }
            | ConfigError::ConstraintViolation { field, .. } => Some(field),
            ConfigError::Io(_) | ConfigError::Json(_) => None,
        }
    }
}

/// Errors related to component construction and runs
#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),
}

impl ComponentError {
    /// Whether this error was caused by invalid input rather than an
    /// engine failure.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ComponentError::Config(_) | ComponentError::Simulation(SimError::Configuration(_))
        )
    }
}
