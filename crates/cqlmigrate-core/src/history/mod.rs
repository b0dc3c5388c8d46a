//! Migration history access.

pub mod sled_store;

pub use sled_store::{HistoryRow, SledHistoryStore};

use crate::error::MigrationError;
use crate::migration::AppliedMigration;

/// Source of persisted migration history.
///
/// Implementations return every history row, in any order.
pub trait AppliedMigrationSource {
    /// Read all applied migrations.
    fn find_applied_migrations(&self) -> Result<Vec<AppliedMigration>, MigrationError>;
}

impl AppliedMigrationSource for Vec<AppliedMigration> {
    fn find_applied_migrations(&self) -> Result<Vec<AppliedMigration>, MigrationError> {
        Ok(self.clone())
    }
}

/// Current time in microseconds since the Unix epoch.
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
