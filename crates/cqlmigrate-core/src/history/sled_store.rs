//! Sled-backed migration history table.
//!
//! Rows live in a tree named `<keyspace>:<table>`, keyed by installed rank
//! (big-endian) so iteration follows execution order. Versions are stored as
//! text and parsed on read.

use super::{current_timestamp, AppliedMigrationSource};
use crate::config::MigrationConfig;
use crate::error::MigrationError;
use crate::migration::{AppliedMigration, MigrationType, ResolvedMigration};
use crate::version::MigrationVersion;
use rkyv::{Archive, Deserialize, Serialize};
use tracing::{info, warn};

/// Description of the schema-creation marker.
pub const SCHEMA_MARKER_DESCRIPTION: &str = "<< Keyspace Creation >>";

/// One persisted history row.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct HistoryRow {
    /// Sequence number assigned at apply time.
    pub installed_rank: i32,
    /// Version text.
    pub version: String,
    /// Description.
    pub description: String,
    /// Migration type name.
    pub migration_type: String,
    /// Script name.
    pub script: String,
    /// Checksum, if known.
    pub checksum: Option<String>,
    /// Installing principal.
    pub installed_by: String,
    /// When the migration ran (microseconds since epoch).
    pub installed_on: u64,
    /// Execution time in milliseconds.
    pub execution_time: u64,
    /// Whether the migration succeeded.
    pub success: bool,
}

impl HistoryRow {
    /// Build a row from an applied migration.
    pub fn from_applied(applied: &AppliedMigration) -> Self {
        Self {
            installed_rank: applied.installed_rank,
            version: applied.version.to_string(),
            description: applied.description.clone(),
            migration_type: applied.migration_type.as_str().to_string(),
            script: applied.script.clone(),
            checksum: applied.checksum.clone(),
            installed_by: applied.installed_by.clone(),
            installed_on: applied.installed_on,
            execution_time: applied.execution_time,
            success: applied.success,
        }
    }

    /// Parse the row into an applied migration.
    pub fn into_applied(self) -> Result<AppliedMigration, MigrationError> {
        let version = MigrationVersion::parse(&self.version)?;
        let migration_type = self.migration_type.parse::<MigrationType>()?;

        Ok(AppliedMigration {
            installed_rank: self.installed_rank,
            version,
            description: self.description,
            migration_type,
            script: self.script,
            checksum: self.checksum,
            installed_on: self.installed_on,
            installed_by: self.installed_by,
            execution_time: self.execution_time,
            success: self.success,
        })
    }

    /// Serialize the row to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MigrationError> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| MigrationError::Serialization(e.to_string()))
    }

    /// Deserialize a row from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MigrationError> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| MigrationError::Deserialization(e.to_string()))
    }
}

/// Migration history persisted in a sled tree.
pub struct SledHistoryStore {
    tree: sled::Tree,
    keyspace: String,
}

impl SledHistoryStore {
    /// Name of the tree holding a keyspace's history table.
    pub fn tree_name(keyspace: &str, table: &str) -> String {
        format!("{}:{}", keyspace, table)
    }

    /// Open or create the history table of a keyspace.
    pub fn open(db: &sled::Db, keyspace: &str, table: &str) -> Result<Self, MigrationError> {
        let tree = db.open_tree(Self::tree_name(keyspace, table))?;
        Ok(Self {
            tree,
            keyspace: keyspace.to_string(),
        })
    }

    /// Record the outcome of running a resolved migration.
    pub fn record_migration(
        &self,
        resolved: &ResolvedMigration,
        installed_by: &str,
        execution_time: u64,
        success: bool,
    ) -> Result<AppliedMigration, MigrationError> {
        let mut applied = AppliedMigration::new(
            self.next_rank()?,
            resolved.version.clone(),
            resolved.description.clone(),
            resolved.migration_type,
            resolved.script.clone(),
            success,
        )
        .with_installed_by(installed_by)
        .with_installed_on(current_timestamp())
        .with_execution_time(execution_time);
        applied.checksum = resolved.checksum.clone();

        self.insert(&applied)?;
        info!(
            version = %applied.version,
            rank = applied.installed_rank,
            success,
            "Recorded migration"
        );
        Ok(applied)
    }

    /// Write a baseline marker. Only concrete versions can be recorded.
    pub fn add_baseline_marker(
        &self,
        version: &MigrationVersion,
        description: &str,
        installed_by: &str,
    ) -> Result<AppliedMigration, MigrationError> {
        if !version.is_concrete() {
            return Err(MigrationError::BaselineRejected {
                reason: format!("'{}' is not a concrete version", version),
            });
        }

        let applied = AppliedMigration::new(
            self.next_rank()?,
            version.clone(),
            description,
            MigrationType::Baseline,
            description,
            true,
        )
        .with_installed_by(installed_by)
        .with_installed_on(current_timestamp());

        self.insert(&applied)?;
        info!(version = %applied.version, "Added baseline marker");
        Ok(applied)
    }

    /// Write the marker recording that the keyspace was created by this tool.
    pub fn add_schema_marker(&self, installed_by: &str) -> Result<AppliedMigration, MigrationError> {
        let applied = AppliedMigration::new(
            self.next_rank()?,
            MigrationVersion::from_components(vec![0]),
            SCHEMA_MARKER_DESCRIPTION,
            MigrationType::Schema,
            self.keyspace.clone(),
            true,
        )
        .with_installed_by(installed_by)
        .with_installed_on(current_timestamp());

        self.insert(&applied)?;
        info!(keyspace = %self.keyspace, "Added schema marker");
        Ok(applied)
    }

    /// Baseline the history at the configured version.
    ///
    /// Refused when a baseline marker or any ordinary migration is already recorded.
    pub fn baseline(
        &self,
        config: &MigrationConfig,
        installed_by: &str,
    ) -> Result<AppliedMigration, MigrationError> {
        if self.has_baseline_marker()? {
            warn!(table = %self.tree_name_str(), "History already baselined");
            return Err(MigrationError::BaselineRejected {
                reason: format!("history table {} is already baselined", self.tree_name_str()),
            });
        }

        if self.has_applied_migrations()? {
            return Err(MigrationError::BaselineRejected {
                reason: format!(
                    "history table {} already contains applied migrations",
                    self.tree_name_str()
                ),
            });
        }

        self.add_baseline_marker(
            &config.baseline_version,
            &config.baseline_description,
            installed_by,
        )
    }

    /// Check whether a baseline marker is recorded.
    pub fn has_baseline_marker(&self) -> Result<bool, MigrationError> {
        Ok(self
            .find_applied_migrations()?
            .iter()
            .any(|a| a.migration_type == MigrationType::Baseline))
    }

    /// Check whether any row other than the schema marker is recorded.
    pub fn has_applied_migrations(&self) -> Result<bool, MigrationError> {
        Ok(self
            .find_applied_migrations()?
            .iter()
            .any(|a| a.migration_type != MigrationType::Schema))
    }

    /// Flush changes to disk.
    pub fn flush(&self) -> Result<(), MigrationError> {
        self.tree.flush()?;
        Ok(())
    }

    fn tree_name_str(&self) -> String {
        String::from_utf8_lossy(&self.tree.name()).into_owned()
    }

    fn next_rank(&self) -> Result<i32, MigrationError> {
        match self.tree.last()? {
            Some((key, _)) => Ok(decode_rank(&key)? + 1),
            None => Ok(1),
        }
    }

    fn insert(&self, applied: &AppliedMigration) -> Result<(), MigrationError> {
        let value = HistoryRow::from_applied(applied).to_bytes()?;
        self.tree
            .insert(applied.installed_rank.to_be_bytes(), value)?;
        Ok(())
    }
}

impl AppliedMigrationSource for SledHistoryStore {
    fn find_applied_migrations(&self) -> Result<Vec<AppliedMigration>, MigrationError> {
        let mut applied = Vec::new();
        for result in self.tree.iter() {
            let (_, value) = result?;
            applied.push(HistoryRow::from_bytes(&value)?.into_applied()?);
        }
        Ok(applied)
    }
}

fn decode_rank(key: &[u8]) -> Result<i32, MigrationError> {
    let bytes: [u8; 4] = key.try_into().map_err(|_| {
        MigrationError::Deserialization(format!("invalid history key of {} bytes", key.len()))
    })?;
    Ok(i32::from_be_bytes(bytes))
}
