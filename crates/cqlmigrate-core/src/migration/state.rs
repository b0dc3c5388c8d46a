//! Classification states of reconciled migrations.

use serde::Serialize;

/// How a reconciled migration relates to the expected happy path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationState {
    /// Resolved, not applied, and eligible to run.
    Pending,
    /// Resolved but newer than the migration target.
    AboveTarget,
    /// Older than the baseline and superseded by it.
    BelowBaseline,
    /// The baseline marker itself.
    Baseline,
    /// Resolved, not applied, and older than something already applied.
    Ignored,
    /// Like `Ignored`, but out-of-order execution is permitted.
    OutOfOrder,
    /// Applied successfully; the script is no longer available.
    MissingSuccess,
    /// Applied and failed; the script is no longer available.
    MissingFailed,
    /// Applied successfully.
    Success,
    /// Applied and failed.
    Failed,
    /// Applied successfully by a newer release than is visible locally.
    FutureSuccess,
    /// Applied and failed by a newer release than is visible locally.
    FutureFailed,
}

impl MigrationState {
    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            MigrationState::Pending => "Pending",
            MigrationState::AboveTarget => "Above Target",
            MigrationState::BelowBaseline => "Below Baseline",
            MigrationState::Baseline => "Baseline",
            MigrationState::Ignored => "Ignored",
            MigrationState::OutOfOrder => "Out of Order",
            MigrationState::MissingSuccess => "Missing",
            MigrationState::MissingFailed => "Failed (Missing)",
            MigrationState::Success => "Success",
            MigrationState::Failed => "Failed",
            MigrationState::FutureSuccess => "Future",
            MigrationState::FutureFailed => "Failed (Future)",
        }
    }

    /// Check whether this state records a failed run.
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            MigrationState::Failed | MigrationState::MissingFailed | MigrationState::FutureFailed
        )
    }

    /// Check whether the migration is waiting to run.
    pub fn is_pending(&self) -> bool {
        matches!(self, MigrationState::Pending | MigrationState::OutOfOrder)
    }

    /// Check whether the history records a newer release than is visible.
    pub fn is_future(&self) -> bool {
        matches!(
            self,
            MigrationState::FutureSuccess | MigrationState::FutureFailed
        )
    }
}

impl std::fmt::Display for MigrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(MigrationState::Pending.is_pending());
        assert!(MigrationState::OutOfOrder.is_pending());
        assert!(!MigrationState::Ignored.is_pending());
        assert!(!MigrationState::AboveTarget.is_pending());

        assert!(MigrationState::FutureFailed.is_failed());
        assert!(MigrationState::FutureFailed.is_future());
        assert!(!MigrationState::MissingSuccess.is_failed());
        assert!(!MigrationState::MissingSuccess.is_future());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(MigrationState::AboveTarget.to_string(), "Above Target");
        assert_eq!(MigrationState::MissingFailed.to_string(), "Failed (Missing)");
    }
}
