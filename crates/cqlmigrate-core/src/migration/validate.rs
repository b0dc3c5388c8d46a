//! Validation of a reconciled snapshot.
//!
//! Failed runs are always reported. Strict validation also reports every
//! entry that leaves the history and the local scripts out of step.

use super::info::MigrationInfo;
use super::state::MigrationState;
use crate::error::MigrationError;
use crate::version::MigrationVersion;
use serde::Serialize;

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Version of the offending entry.
    pub version: MigrationVersion,
    /// State of the offending entry.
    pub state: MigrationState,
    /// Script of the offending entry.
    pub script: String,
    /// What is wrong.
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "migration {} ({}): {}",
            self.version, self.script, self.message
        )
    }
}

/// Turn a non-empty issue list into [`MigrationError::ValidationFailed`].
pub fn ensure_valid(issues: &[ValidationIssue]) -> Result<(), MigrationError> {
    if issues.is_empty() {
        return Ok(());
    }

    let message = issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(MigrationError::ValidationFailed { message })
}

/// Report the problems of every entry, in snapshot order.
pub fn validate_infos(infos: &[MigrationInfo], strict: bool) -> Vec<ValidationIssue> {
    infos
        .iter()
        .filter_map(|info| {
            problem(info.state(), strict).map(|message| ValidationIssue {
                version: info.version().clone(),
                state: info.state(),
                script: info.script().to_string(),
                message: message.to_string(),
            })
        })
        .collect()
}

fn problem(state: MigrationState, strict: bool) -> Option<&'static str> {
    match state {
        MigrationState::Failed => Some("failed to apply"),
        MigrationState::MissingFailed => Some("failed to apply and is no longer available locally"),
        MigrationState::FutureFailed => Some("failed to apply in a newer release"),
        MigrationState::Pending | MigrationState::OutOfOrder if strict => {
            Some("resolved locally but not applied")
        }
        MigrationState::Ignored if strict => {
            Some("ignored because a later migration is already applied")
        }
        MigrationState::MissingSuccess if strict => Some("applied but not resolved locally"),
        MigrationState::FutureSuccess if strict => Some("applied by a newer release"),
        _ => None,
    }
}
