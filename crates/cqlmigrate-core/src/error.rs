//! Core error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving, reading, or reconciling migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A version string could not be parsed.
    #[error("invalid version '{version}': {reason}")]
    InvalidVersion {
        /// The offending text.
        version: String,
        /// Why it was rejected.
        reason: String,
    },

    /// More than one successful history row exists for the same version.
    #[error("history holds {} successful rows for version {version} (installed ranks {ranks:?})", .ranks.len())]
    DuplicateAppliedVersion {
        /// The version with duplicate rows.
        version: String,
        /// Installed ranks of the successful rows.
        ranks: Vec<i32>,
    },

    /// Two scripts resolve to the same version.
    #[error("found more than one migration with version {version}: {first} and {second}")]
    DuplicateResolvedVersion {
        /// The shared version.
        version: String,
        /// Script of the first migration.
        first: String,
        /// Script of the second migration.
        second: String,
    },

    /// A script name carries the migration prefix and suffix but is otherwise malformed.
    #[error("invalid migration script name '{name}': {reason}")]
    InvalidScriptName {
        /// The file name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Reading a migration location failed.
    #[error("failed to read migrations from {}: {source}", .location.display())]
    Resolve {
        /// The path being read.
        location: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Validation of the reconciled migrations failed.
    #[error("validation failed: {message}")]
    ValidationFailed {
        /// Description of every failing entry.
        message: String,
    },

    /// The history cannot be baselined in its current state.
    #[error("unable to baseline: {reason}")]
    BaselineRejected {
        /// Why the baseline was refused.
        reason: String,
    },
}
