//! Migration configuration.

use crate::version::MigrationVersion;

/// Default name of the history table.
pub const DEFAULT_TABLE: &str = "cassandra_migration_version";

/// Default baseline version.
pub const DEFAULT_BASELINE_VERSION: u64 = 1;

/// Default description of the baseline marker.
pub const DEFAULT_BASELINE_DESCRIPTION: &str = "<< Cassandra Baseline >>";

/// Configuration shared by the reconciliation engine and the commands built on it.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Keyspace whose history is tracked.
    pub keyspace: String,

    /// Name of the history table.
    pub table: String,

    /// Migration target. `Latest` resolves to the newest available script.
    pub target: MigrationVersion,

    /// Whether migrations older than the latest applied one may still run.
    pub out_of_order: bool,

    /// Whether pending, ignored, missing and future migrations fail validation.
    pub strict: bool,

    /// Version recorded by the baseline command.
    pub baseline_version: MigrationVersion,

    /// Description recorded by the baseline command.
    pub baseline_description: String,
}

impl MigrationConfig {
    /// Create a configuration for the given keyspace.
    pub fn new(keyspace: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            table: DEFAULT_TABLE.to_string(),
            target: MigrationVersion::Latest,
            out_of_order: false,
            strict: false,
            baseline_version: MigrationVersion::from_components(vec![DEFAULT_BASELINE_VERSION]),
            baseline_description: DEFAULT_BASELINE_DESCRIPTION.to_string(),
        }
    }

    /// Set the history table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set the migration target.
    pub fn with_target(mut self, target: MigrationVersion) -> Self {
        self.target = target;
        self
    }

    /// Permit or forbid out-of-order migrations.
    pub fn with_out_of_order(mut self, out_of_order: bool) -> Self {
        self.out_of_order = out_of_order;
        self
    }

    /// Enable or disable strict validation.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the baseline version.
    pub fn with_baseline_version(mut self, version: MigrationVersion) -> Self {
        self.baseline_version = version;
        self
    }

    /// Set the baseline description.
    pub fn with_baseline_description(mut self, description: impl Into<String>) -> Self {
        self.baseline_description = description.into();
        self
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self::new("cassandra_migration")
    }
}
