//! Error types for the simulation framework

use thiserror::Error;

/// Top-level error type for simulation operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Time validation error: {0}")]
    InvalidTime(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
