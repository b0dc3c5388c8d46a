//! Reconciled migration entries and their classification.
//!
//! Classification is a pure function of an [`EntrySource`] and a
//! [`ClassifyContext`]. The context is built once per refresh from the full
//! resolved and applied collections, so the order in which entries are
//! classified never changes the outcome.

use super::state::MigrationState;
use super::types::{AppliedMigration, MigrationType, ResolvedMigration};
use crate::version::MigrationVersion;
use serde::Serialize;

/// Where the records of a single version came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    /// A local script with no history row.
    Resolved(ResolvedMigration),
    /// A history row with no local script.
    Applied(AppliedMigration),
    /// A local script and its history row.
    Matched(ResolvedMigration, AppliedMigration),
}

impl EntrySource {
    /// Version shared by the records.
    pub fn version(&self) -> &MigrationVersion {
        match self {
            EntrySource::Resolved(resolved) | EntrySource::Matched(resolved, _) => {
                &resolved.version
            }
            EntrySource::Applied(applied) => &applied.version,
        }
    }

    /// The history row, if any.
    pub fn applied(&self) -> Option<&AppliedMigration> {
        match self {
            EntrySource::Applied(applied) | EntrySource::Matched(_, applied) => Some(applied),
            EntrySource::Resolved(_) => None,
        }
    }

    /// The local script, if any.
    pub fn resolved(&self) -> Option<&ResolvedMigration> {
        match self {
            EntrySource::Resolved(resolved) | EntrySource::Matched(resolved, _) => Some(resolved),
            EntrySource::Applied(_) => None,
        }
    }

    /// The anchor marker type when the history row is a schema or baseline marker.
    pub fn anchor(&self) -> Option<MigrationType> {
        self.applied()
            .map(|applied| applied.migration_type)
            .filter(MigrationType::is_synthetic)
    }
}

/// Values shared by every classification in one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyContext {
    /// Version of the baseline marker, if the history holds one.
    pub baseline: Option<MigrationVersion>,
    /// Greatest successfully applied version, or `Empty`.
    pub latest_applied: MigrationVersion,
    /// Greatest resolved version, if any script was resolved.
    pub max_resolved: Option<MigrationVersion>,
    /// Effective target; `Latest` is replaced by the greatest resolved version.
    pub target: MigrationVersion,
    /// Whether skipped migrations may still run.
    pub out_of_order: bool,
}

impl ClassifyContext {
    /// Build the context from every resolved and applied record of a refresh.
    pub fn build(
        resolved: &[ResolvedMigration],
        applied: &[AppliedMigration],
        target: &MigrationVersion,
        out_of_order: bool,
    ) -> Self {
        let baseline = applied
            .iter()
            .filter(|a| a.migration_type == MigrationType::Baseline)
            .map(|a| a.version.clone())
            .max();

        let latest_applied = applied
            .iter()
            .filter(|a| a.success)
            .map(|a| a.version.clone())
            .max()
            .unwrap_or(MigrationVersion::Empty);

        let max_resolved = resolved.iter().map(|r| r.version.clone()).max();

        let target = match (target, &max_resolved) {
            (MigrationVersion::Latest, Some(max)) => max.clone(),
            _ => target.clone(),
        };

        Self {
            baseline,
            latest_applied,
            max_resolved,
            target,
            out_of_order,
        }
    }
}

/// Classify one entry. The first matching rule wins.
pub fn classify(source: &EntrySource, ctx: &ClassifyContext) -> MigrationState {
    let version = source.version();
    let anchor = source.anchor();

    // Schema-creation markers are always settled, even below a baseline.
    if anchor != Some(MigrationType::Schema) {
        if let Some(baseline) = &ctx.baseline {
            if version < baseline {
                return MigrationState::BelowBaseline;
            }
        }
    }

    match anchor {
        Some(MigrationType::Schema) => return MigrationState::Success,
        Some(MigrationType::Baseline) => return MigrationState::Baseline,
        _ => {}
    }

    match source {
        EntrySource::Resolved(_) => {
            if version > &ctx.target {
                MigrationState::AboveTarget
            } else if version < &ctx.latest_applied {
                if ctx.out_of_order {
                    MigrationState::OutOfOrder
                } else {
                    MigrationState::Ignored
                }
            } else {
                MigrationState::Pending
            }
        }
        EntrySource::Applied(applied) => {
            let missing = ctx.max_resolved.as_ref().is_some_and(|max| version < max);
            match (missing, applied.success) {
                (true, true) => MigrationState::MissingSuccess,
                (true, false) => MigrationState::MissingFailed,
                (false, true) => MigrationState::FutureSuccess,
                (false, false) => MigrationState::FutureFailed,
            }
        }
        EntrySource::Matched(_, applied) => {
            if applied.success {
                MigrationState::Success
            } else {
                MigrationState::Failed
            }
        }
    }
}

/// A reconciled migration: the records of one version plus its state.
///
/// Display fields come from the history row when one exists, since that is
/// what actually ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationInfo {
    version: MigrationVersion,
    description: String,
    migration_type: MigrationType,
    script: String,
    checksum: Option<String>,
    state: MigrationState,
    resolved: Option<ResolvedMigration>,
    applied: Option<AppliedMigration>,
}

impl MigrationInfo {
    /// Classify a source and build its entry.
    pub fn new(source: EntrySource, ctx: &ClassifyContext) -> Self {
        let state = classify(&source, ctx);

        let (version, description, migration_type, script, checksum) = match &source {
            EntrySource::Applied(a) | EntrySource::Matched(_, a) => (
                a.version.clone(),
                a.description.clone(),
                a.migration_type,
                a.script.clone(),
                a.checksum.clone(),
            ),
            EntrySource::Resolved(r) => (
                r.version.clone(),
                r.description.clone(),
                r.migration_type,
                r.script.clone(),
                r.checksum.clone(),
            ),
        };

        let (resolved, applied) = match source {
            EntrySource::Resolved(resolved) => (Some(resolved), None),
            EntrySource::Applied(applied) => (None, Some(applied)),
            EntrySource::Matched(resolved, applied) => (Some(resolved), Some(applied)),
        };

        Self {
            version,
            description,
            migration_type,
            script,
            checksum,
            state,
            resolved,
            applied,
        }
    }

    /// Version of this migration.
    pub fn version(&self) -> &MigrationVersion {
        &self.version
    }

    /// Description, from the history row when present.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Migration kind, from the history row when present.
    pub fn migration_type(&self) -> MigrationType {
        self.migration_type
    }

    /// Script name, from the history row when present.
    pub fn script(&self) -> &str {
        &self.script
    }

    /// Checksum, from the history row when present.
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    /// Classification state.
    pub fn state(&self) -> MigrationState {
        self.state
    }

    /// The local script record.
    pub fn resolved(&self) -> Option<&ResolvedMigration> {
        self.resolved.as_ref()
    }

    /// The history row.
    pub fn applied(&self) -> Option<&AppliedMigration> {
        self.applied.as_ref()
    }

    /// Check whether the history row records a successful run.
    pub fn is_applied_successfully(&self) -> bool {
        self.applied.as_ref().is_some_and(|a| a.success)
    }

    pub fn installed_rank(&self) -> Option<i32> {
        self.applied.as_ref().map(|a| a.installed_rank)
    }

    pub fn installed_on(&self) -> Option<u64> {
        self.applied.as_ref().map(|a| a.installed_on)
    }

    pub fn installed_by(&self) -> Option<&str> {
        self.applied.as_ref().map(|a| a.installed_by.as_str())
    }

    pub fn execution_time(&self) -> Option<u64> {
        self.applied.as_ref().map(|a| a.execution_time)
    }
}
