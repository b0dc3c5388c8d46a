//! Resolved and applied migration records.

use crate::error::MigrationError;
use crate::version::MigrationVersion;
use serde::Serialize;
use std::str::FromStr;

/// Kind of a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationType {
    /// Marker recording that the keyspace was created by the tool.
    Schema,
    /// Marker recording a baseline.
    Baseline,
    /// An ordinary CQL script.
    Cql,
}

impl MigrationType {
    /// Stable name used in the history table.
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationType::Schema => "SCHEMA",
            MigrationType::Baseline => "BASELINE",
            MigrationType::Cql => "CQL",
        }
    }

    /// Check whether this is an anchor marker rather than a real script.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, MigrationType::Schema | MigrationType::Baseline)
    }
}

impl std::fmt::Display for MigrationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationType {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEMA" => Ok(MigrationType::Schema),
            "BASELINE" => Ok(MigrationType::Baseline),
            "CQL" => Ok(MigrationType::Cql),
            other => Err(MigrationError::Deserialization(format!(
                "unknown migration type '{}'",
                other
            ))),
        }
    }
}

/// A migration discovered by a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMigration {
    /// Version declared by the script.
    pub version: MigrationVersion,
    /// Human-readable description.
    pub description: String,
    /// Migration kind.
    pub migration_type: MigrationType,
    /// Script name, relative to its location.
    pub script: String,
    /// Content checksum, if the resolver computes one.
    pub checksum: Option<String>,
}

impl ResolvedMigration {
    /// Create a resolved CQL migration.
    pub fn new(
        version: MigrationVersion,
        description: impl Into<String>,
        script: impl Into<String>,
    ) -> Self {
        Self {
            version,
            description: description.into(),
            migration_type: MigrationType::Cql,
            script: script.into(),
            checksum: None,
        }
    }

    /// Set the checksum.
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }
}

/// One row of persisted migration history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    /// Sequence number assigned when the migration ran.
    pub installed_rank: i32,
    /// Version of the migration.
    pub version: MigrationVersion,
    /// Description recorded at apply time.
    pub description: String,
    /// Migration kind.
    pub migration_type: MigrationType,
    /// Script name recorded at apply time.
    pub script: String,
    /// Checksum recorded at apply time.
    pub checksum: Option<String>,
    /// When the migration ran (microseconds since epoch).
    pub installed_on: u64,
    /// Principal that ran the migration.
    pub installed_by: String,
    /// Execution time in milliseconds.
    pub execution_time: u64,
    /// Whether the migration succeeded.
    pub success: bool,
}

impl AppliedMigration {
    /// Create an applied migration record.
    pub fn new(
        installed_rank: i32,
        version: MigrationVersion,
        description: impl Into<String>,
        migration_type: MigrationType,
        script: impl Into<String>,
        success: bool,
    ) -> Self {
        Self {
            installed_rank,
            version,
            description: description.into(),
            migration_type,
            script: script.into(),
            checksum: None,
            installed_on: 0,
            installed_by: String::new(),
            execution_time: 0,
            success,
        }
    }

    /// Set the checksum.
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    /// Set the installation timestamp (microseconds since epoch).
    pub fn with_installed_on(mut self, installed_on: u64) -> Self {
        self.installed_on = installed_on;
        self
    }

    /// Set the installing principal.
    pub fn with_installed_by(mut self, installed_by: impl Into<String>) -> Self {
        self.installed_by = installed_by.into();
        self
    }

    /// Set the execution time in milliseconds.
    pub fn with_execution_time(mut self, execution_time: u64) -> Self {
        self.execution_time = execution_time;
        self
    }
}
