//! Run configuration for the multi-station service simulation.
//!
//! A [`ServiceConfig`] can be built in code through [`ServiceConfigBuilder`]
//! or loaded from JSON. Fields missing from a JSON document take their
//! default values. Validation runs before any simulated time advances.

use crate::builder::{
    validate_non_empty, validate_positive, validate_sim_seconds, Validate, ValidationResult,
};
use crate::error::ConfigError;
use crate::flow::CountingMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Average service times, in seconds, of the thirteen reference stations.
pub const DEFAULT_DURATIONS: [f64; 13] = [
    25.0, 15.0, 34.0, 37.0, 38.0, 56.0, 25.0, 15.0, 19.0, 25.0, 17.0, 17.0, 7.0,
];

/// Server budget split across the stations
pub const DEFAULT_TOTAL_SERVERS: u32 = 22;

/// Number of served customers that ends the run
pub const DEFAULT_TARGET_COUNT: u64 = 1000;

/// Seven simulated hours
pub const DEFAULT_HORIZON_SECS: f64 = 25_200.0;

/// Parameters of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Average service time of each station, in seconds, in visiting order
    pub durations: Vec<f64>,
    /// Server budget used by the proportional allocation
    pub total_servers: u32,
    /// Served-customer count at which the run stops
    pub target_count: u64,
    /// Latest simulated instant, in seconds, at which events are delivered
    pub horizon_secs: f64,
    /// Number of concurrent customer flows walking the stations
    pub customer_processes: usize,
    /// What counts as one served customer
    pub counting: CountingMode,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            durations: DEFAULT_DURATIONS.to_vec(),
            total_servers: DEFAULT_TOTAL_SERVERS,
            target_count: DEFAULT_TARGET_COUNT,
            horizon_secs: DEFAULT_HORIZON_SECS,
            customer_processes: 1,
            counting: CountingMode::default(),
        }
    }
}

impl ServiceConfig {
    /// Start a builder seeded with the default configuration
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    /// Parse and validate a configuration from a JSON document
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on malformed input or unknown fields,
    /// and a validation error for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`ServiceConfig::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Sum of all station durations, in seconds
    #[must_use]
    pub fn total_service_secs(&self) -> f64 {
        self.durations.iter().sum()
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> ValidationResult<()> {
        validate_non_empty("durations", &self.durations)?;
        for (i, &duration) in self.durations.iter().enumerate() {
            validate_sim_seconds(&format!("durations[{i}]"), duration)?;
        }
        validate_positive("total_servers", self.total_servers)?;
        validate_positive("target_count", self.target_count)?;
        validate_sim_seconds("horizon_secs", self.horizon_secs)?;
        validate_positive("customer_processes", self.customer_processes)?;
        Ok(())
    }
}

/// Builder for [`ServiceConfig`]
#[derive(Debug, Clone, Default)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    /// Create a builder seeded with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-station service durations, in seconds
    pub fn durations(mut self, durations: impl Into<Vec<f64>>) -> Self {
        self.config.durations = durations.into();
        self
    }

    /// Set the server budget
    pub fn total_servers(mut self, total_servers: u32) -> Self {
        self.config.total_servers = total_servers;
        self
    }

    /// Set the served-customer target
    pub fn target_count(mut self, target_count: u64) -> Self {
        self.config.target_count = target_count;
        self
    }

    /// Set the time horizon, in seconds
    pub fn horizon_secs(mut self, horizon_secs: f64) -> Self {
        self.config.horizon_secs = horizon_secs;
        self
    }

    /// Set the number of concurrent customer flows
    pub fn customer_processes(mut self, customer_processes: usize) -> Self {
        self.config.customer_processes = customer_processes;
        self
    }

    /// Set the counting mode
    pub fn counting(mut self, counting: CountingMode) -> Self {
        self.config.counting = counting;
        self
    }

    /// Validate and build the configuration
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first invalid field.
    pub fn build(self) -> Result<ServiceConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.durations.len(), 13);
        assert_eq!(config.total_service_secs(), 330.0);
        assert_eq!(config.counting, CountingMode::PerStationVisit);
    }

    #[test]
    fn test_builder_rejects_invalid_fields() {
        let cases = [
            (ServiceConfig::builder().durations(Vec::<f64>::new()), "durations"),
            (ServiceConfig::builder().durations(vec![10.0, 0.0]), "durations[1]"),
            (ServiceConfig::builder().durations(vec![-5.0]), "durations[0]"),
            (ServiceConfig::builder().durations(vec![f64::NAN]), "durations[0]"),
            (ServiceConfig::builder().total_servers(0), "total_servers"),
            (ServiceConfig::builder().target_count(0), "target_count"),
            (ServiceConfig::builder().horizon_secs(0.0), "horizon_secs"),
            (ServiceConfig::builder().horizon_secs(f64::INFINITY), "horizon_secs"),
            (ServiceConfig::builder().customer_processes(0), "customer_processes"),
        ];

        for (builder, field) in cases {
            let err = builder.build().unwrap_err();
            assert_eq!(err.field(), Some(field), "unexpected error: {err}");
        }
    }

    #[test]
    fn test_times_beyond_clock_range_are_rejected() {
        let cases = [
            (ServiceConfig::builder().durations(vec![30.0, 1e11]), "durations[1]"),
            (ServiceConfig::builder().durations(vec![2e10]), "durations[0]"),
            (ServiceConfig::builder().horizon_secs(1e30), "horizon_secs"),
        ];

        for (builder, field) in cases {
            match builder.build() {
                Err(ConfigError::ConstraintViolation { field: got, .. }) => assert_eq!(got, field),
                other => panic!("expected constraint violation on {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_builder_sets_fields() {
        let config = ServiceConfig::builder()
            .durations([10.0, 20.0])
            .total_servers(4)
            .target_count(3)
            .horizon_secs(100.0)
            .customer_processes(2)
            .counting(CountingMode::PerTraversal)
            .build()
            .unwrap();

        assert_eq!(config.durations, vec![10.0, 20.0]);
        assert_eq!(config.total_servers, 4);
        assert_eq!(config.target_count, 3);
        assert_eq!(config.horizon_secs, 100.0);
        assert_eq!(config.customer_processes, 2);
        assert_eq!(config.counting, CountingMode::PerTraversal);
    }

    #[test]
    fn test_json_missing_fields_take_defaults() {
        let json = r#"{"durations": [10.0], "target_count": 3}"#;
        let config = ServiceConfig::from_json_str(json).unwrap();
        assert_eq!(config.durations, vec![10.0]);
        assert_eq!(config.target_count, 3);
        assert_eq!(config.total_servers, DEFAULT_TOTAL_SERVERS);
        assert_eq!(config.horizon_secs, DEFAULT_HORIZON_SECS);
    }

    #[test]
    fn test_json_counting_mode() {
        let config = ServiceConfig::from_json_str(r#"{"counting": "per_traversal"}"#).unwrap();
        assert_eq!(config.counting, CountingMode::PerTraversal);
    }

    #[test]
    fn test_json_errors() {
        assert!(matches!(
            ServiceConfig::from_json_str(r#"{"durations": [10.0],"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            ServiceConfig::from_json_str(r#"{"servers": 3}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            ServiceConfig::from_json_str(r#"{"total_servers": 0}"#),
            Err(ConfigError::ConstraintViolation { .. })
        ));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"durations": [5.0, 5.0], "total_servers": 9}}"#).unwrap();

        let config = ServiceConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.durations, vec![5.0, 5.0]);
        assert_eq!(config.total_servers, 9);

        let missing = ServiceConfig::from_json_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_config_serializes_round_trip() {
        let config = ServiceConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ServiceConfig::from_json_str(&json).unwrap(), config);
    }
}
