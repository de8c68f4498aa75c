//! `station-sim`: run the multi-station service simulation and print the
//! server allocation.

use clap::Parser;
use des_components::{run_service_simulation, ConfigError, CountingMode, ServiceConfig, Validate};
use des_core::init_simulation_logging_with_level;
use descartes::table;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "station-sim",
    version,
    about = "Simulate customers flowing through service stations"
)]
struct Cli {
    /// JSON configuration file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated average service times in seconds, in visiting order
    #[arg(long, value_delimiter = ',')]
    durations: Option<Vec<f64>>,

    /// Server budget split across the stations
    #[arg(long)]
    total_servers: Option<u32>,

    /// Number of served customers that ends the run
    #[arg(long)]
    customers: Option<u64>,

    /// Time horizon in simulated seconds
    #[arg(long)]
    horizon: Option<f64>,

    /// Number of concurrent customer flows
    #[arg(long)]
    processes: Option<usize>,

    /// Count a customer only after a full pass through all stations
    #[arg(long)]
    per_traversal: bool,

    /// Print the full run report as JSON instead of the table
    #[arg(long)]
    json: bool,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Cli {
    /// Load the base configuration and apply flag overrides.
    fn resolve_config(&self) -> Result<ServiceConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::from_json_file(path)?,
            None => ServiceConfig::default(),
        };

        if let Some(durations) = &self.durations {
            config.durations = durations.clone();
        }
        if let Some(total_servers) = self.total_servers {
            config.total_servers = total_servers;
        }
        if let Some(customers) = self.customers {
            config.target_count = customers;
        }
        if let Some(horizon) = self.horizon {
            config.horizon_secs = horizon;
        }
        if let Some(processes) = self.processes {
            config.customer_processes = processes;
        }
        if self.per_traversal {
            config.counting = CountingMode::PerTraversal;
        }

        config.validate()?;
        Ok(config)
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.resolve_config()?;
    info!(?config, "Configuration resolved");

    let report = run_service_simulation(&config)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", table::render(report.rows()));
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_simulation_logging_with_level(&cli.log_level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "station-sim failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_without_flags() {
        let cli = Cli::parse_from(["station-sim"]);
        assert_eq!(cli.resolve_config().unwrap(), ServiceConfig::default());
        assert!(!cli.json);
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "station-sim",
            "--durations",
            "10,20.5,30",
            "--total-servers",
            "6",
            "--customers",
            "50",
            "--horizon",
            "3600",
            "--processes",
            "3",
            "--per-traversal",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.durations, vec![10.0, 20.5, 30.0]);
        assert_eq!(config.total_servers, 6);
        assert_eq!(config.target_count, 50);
        assert_eq!(config.horizon_secs, 3600.0);
        assert_eq!(config.customer_processes, 3);
        assert_eq!(config.counting, CountingMode::PerTraversal);
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = r#"{"durations": [5.0, 5.0], "total_servers": 9, "target_count": 7}"#;
        file.write_all(json.as_bytes()).unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let cli = Cli::parse_from(["station-sim", "--config", &path, "--customers", "11"]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.durations, vec![5.0, 5.0]);
        assert_eq!(config.total_servers, 9);
        assert_eq!(config.target_count, 11);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let cli = Cli::parse_from(["station-sim", "--total-servers", "0"]);
        let err = cli.resolve_config().unwrap_err();
        assert_eq!(err.field(), Some("total_servers"));
    }
}
