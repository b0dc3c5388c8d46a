//! cqlmigrate core - migration discovery, history and reconciliation.
//!
//! This crate resolves CQL migration scripts, reads the migration history of
//! a keyspace, and reconciles the two into a classified, queryable view.

pub mod config;
pub mod error;
pub mod history;
pub mod migration;
pub mod resolver;
pub mod version;

pub use config::MigrationConfig;
pub use error::MigrationError;
pub use history::{AppliedMigrationSource, SledHistoryStore};
pub use migration::{
    ensure_valid, AppliedMigration, MigrationInfo, MigrationInfoService, MigrationState, MigrationType,
    ResolvedMigration, ValidationIssue,
};
pub use resolver::{FileSystemResolver, MigrationResolver};
pub use version::MigrationVersion;
