//! Validation helpers shared by component builders and configurations.
//!
//! Builders call [`Validate::validate`] from their `build()` method so that
//! a bad value is reported with the name of the field that carried it.

use crate::error::ConfigError;
use des_core::SimTime;

/// Result of a validation step
pub type ValidationResult<T> = Result<T, ConfigError>;

/// Trait for validating builder configurations
pub trait Validate {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first invalid field.
    fn validate(&self) -> ValidationResult<()>;
}

/// Helper for validating that a value is positive
pub fn validate_positive<T: PartialOrd + Default + std::fmt::Display>(
    field: &str,
    value: T,
) -> ValidationResult<()> {
    if value <= T::default() {
        Err(ConfigError::ConstraintViolation {
            field: field.to_string(),
            constraint: format!("positive (got {value})"),
        })
    } else {
        Ok(())
    }
}

/// Helper for validating that a float is finite and strictly positive
pub fn validate_finite_positive(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("must be a finite number (got {value})"),
        });
    }
    validate_positive(field, value)
}

/// Helper for validating a span of simulated seconds.
///
/// The value must be finite and positive, fit in [`SimTime`], and not round
/// down to zero nanoseconds.
pub fn validate_sim_seconds(field: &str, secs: f64) -> ValidationResult<SimTime> {
    validate_finite_positive(field, secs)?;
    match SimTime::try_from_secs_f64(secs) {
        Ok(time) if time > SimTime::zero() => Ok(time),
        Ok(_) => Err(ConfigError::ConstraintViolation {
            field: field.to_string(),
            constraint: format!("at least one nanosecond (got {secs}s)"),
        }),
        Err(err) => Err(ConfigError::ConstraintViolation {
            field: field.to_string(),
            constraint: format!("representable as simulation time ({err})"),
        }),
    }
}

/// Helper for validating that a sequence is not empty
pub fn validate_non_empty<T>(field: &str, values: &[T]) -> ValidationResult<()> {
    if values.is_empty() {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "cannot be empty".to_string(),
        })
    } else {
        Ok(())
    }
}
