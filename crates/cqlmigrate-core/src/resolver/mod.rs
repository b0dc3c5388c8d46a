//! Migration discovery.

pub mod filesystem;

pub use filesystem::{compute_checksum, parse_script_name, FileSystemResolver};

use crate::error::MigrationError;
use crate::migration::ResolvedMigration;

/// Source of locally available migrations.
///
/// Implementations return every migration they can see, in any order.
pub trait MigrationResolver {
    /// Resolve all available migrations.
    fn resolve_migrations(&self) -> Result<Vec<ResolvedMigration>, MigrationError>;
}

impl MigrationResolver for Vec<ResolvedMigration> {
    fn resolve_migrations(&self) -> Result<Vec<ResolvedMigration>, MigrationError> {
        Ok(self.clone())
    }
}
