//! Command-line arguments.

use crate::formatter::OutputFormat;
use clap::{Parser, Subcommand};
use cqlmigrate_core::config::{DEFAULT_BASELINE_DESCRIPTION, DEFAULT_TABLE};
use cqlmigrate_core::{MigrationConfig, MigrationError, MigrationVersion};
use std::path::PathBuf;

/// Default script location.
pub const DEFAULT_LOCATION: &str = "./migrations";

/// Default path of the local history database.
pub const DEFAULT_DATA_PATH: &str = "./data";

/// Cassandra schema migration tool.
#[derive(Parser, Debug)]
#[command(name = "cqlmigrate")]
#[command(version, about = "Cassandra schema migration status and validation", long_about = None)]
pub struct Args {
    /// Directory scanned for migration scripts.
    #[arg(short, long, global = true, default_value = DEFAULT_LOCATION)]
    pub location: PathBuf,

    /// Path of the history database.
    #[arg(short, long, global = true, default_value = DEFAULT_DATA_PATH)]
    pub data_path: PathBuf,

    /// Keyspace whose history is tracked.
    #[arg(short, long, global = true, default_value = "cassandra_migration")]
    pub keyspace: String,

    /// History table name.
    #[arg(long, global = true, default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Migration target (a version or "latest").
    #[arg(long, global = true, default_value = "latest")]
    pub target: String,

    /// Allow migrations older than the latest applied one to run.
    #[arg(long, global = true)]
    pub out_of_order: bool,

    /// Treat pending, ignored, missing and future migrations as validation errors.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Output format.
    #[arg(long, global = true, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Version recorded by the baseline command.
    #[arg(long, global = true, default_value = "1")]
    pub baseline_version: String,

    /// Description recorded by the baseline command.
    #[arg(long, global = true, default_value = DEFAULT_BASELINE_DESCRIPTION)]
    pub baseline_description: String,

    /// Principal recorded in the history table.
    #[arg(short, long, global = true, default_value = "cqlmigrate")]
    pub user: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Show every migration and its state.
    Info,
    /// Check the history against the available scripts.
    Validate,
    /// Record a baseline marker in an unmigrated keyspace.
    Baseline,
}

impl Args {
    /// Convert command-line arguments to a migration configuration.
    pub fn to_config(&self) -> Result<MigrationConfig, MigrationError> {
        Ok(MigrationConfig::new(&self.keyspace)
            .with_table(&self.table)
            .with_target(MigrationVersion::parse_target(&self.target)?)
            .with_out_of_order(self.out_of_order)
            .with_strict(self.strict)
            .with_baseline_version(MigrationVersion::parse(&self.baseline_version)?)
            .with_baseline_description(&self.baseline_description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["cqlmigrate", "info"]);
        assert_eq!(args.command, Command::Info);

        let config = args.to_config().unwrap();
        assert_eq!(config.keyspace, "cassandra_migration");
        assert_eq!(config.target, MigrationVersion::Latest);
        assert!(!config.strict);
    }

    #[test]
    fn test_flags_after_subcommand() {
        let args = Args::parse_from([
            "cqlmigrate",
            "validate",
            "--keyspace",
            "shop",
            "--target",
            "2.1",
            "--strict",
            "--out-of-order",
        ]);
        let config = args.to_config().unwrap();
        assert_eq!(config.keyspace, "shop");
        assert_eq!(config.target.to_string(), "2.1");
        assert!(config.strict);
        assert!(config.out_of_order);
    }

    #[test]
    fn test_invalid_target() {
        let args = Args::parse_from(["cqlmigrate", "info", "--target", "next"]);
        assert!(matches!(
            args.to_config(),
            Err(MigrationError::InvalidVersion { .. })
        ));
    }
}
