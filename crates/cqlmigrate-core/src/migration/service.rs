//! Migration info service - reconciles resolved scripts with applied history.
//!
//! [`MigrationInfoService::refresh`] reads both collaborators, merge-joins
//! their records by version, classifies every entry and replaces the held
//! snapshot. Query methods only read the snapshot.

use super::info::{ClassifyContext, EntrySource, MigrationInfo};
use super::state::MigrationState;
use super::types::{AppliedMigration, MigrationType, ResolvedMigration};
use super::validate::{ensure_valid, validate_infos, ValidationIssue};
use crate::config::MigrationConfig;
use crate::error::MigrationError;
use crate::history::AppliedMigrationSource;
use crate::resolver::MigrationResolver;
use crate::version::MigrationVersion;
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// Reconciled view over resolved and applied migrations.
pub struct MigrationInfoService<'a> {
    resolver: &'a dyn MigrationResolver,
    history: &'a dyn AppliedMigrationSource,
    target: MigrationVersion,
    out_of_order: bool,
    strict: bool,
    infos: Vec<MigrationInfo>,
}

impl<'a> MigrationInfoService<'a> {
    /// Create a service. The snapshot stays empty until the first [`refresh`](Self::refresh).
    pub fn new(
        resolver: &'a dyn MigrationResolver,
        history: &'a dyn AppliedMigrationSource,
        config: &MigrationConfig,
    ) -> Self {
        Self {
            resolver,
            history,
            target: config.target.clone(),
            out_of_order: config.out_of_order,
            strict: config.strict,
            infos: Vec::new(),
        }
    }

    /// Re-read both collaborators and replace the snapshot.
    ///
    /// On error the previous snapshot is left untouched.
    pub fn refresh(&mut self) -> Result<(), MigrationError> {
        let resolved = self.resolver.resolve_migrations()?;
        let applied = self.history.find_applied_migrations()?;
        debug!(
            resolved = resolved.len(),
            applied = applied.len(),
            "Loaded migrations"
        );

        let infos = reconcile(resolved, applied, &self.target, self.out_of_order)?;
        info!(entries = infos.len(), "Refreshed migration info");
        self.infos = infos;
        Ok(())
    }

    /// Configured target.
    pub fn target(&self) -> &MigrationVersion {
        &self.target
    }

    /// Whether out-of-order migrations are permitted.
    pub fn is_out_of_order(&self) -> bool {
        self.out_of_order
    }

    /// Whether validation is strict.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Every entry, version-ascending.
    pub fn all(&self) -> &[MigrationInfo] {
        &self.infos
    }

    /// The greatest version with a successful history row.
    pub fn current(&self) -> Option<&MigrationInfo> {
        self.infos
            .iter()
            .rev()
            .find(|info| info.is_applied_successfully())
    }

    /// Entries waiting to run.
    pub fn pending(&self) -> Vec<&MigrationInfo> {
        self.filter(|info| info.state().is_pending())
    }

    /// Entries applied by a newer release than is visible locally.
    pub fn future(&self) -> Vec<&MigrationInfo> {
        self.filter(|info| info.state().is_future())
    }

    /// Entries recording a failed run.
    pub fn failed(&self) -> Vec<&MigrationInfo> {
        self.filter(|info| info.state().is_failed())
    }

    /// Entries eligible to run out of order.
    pub fn out_of_order(&self) -> Vec<&MigrationInfo> {
        self.filter(|info| info.state() == MigrationState::OutOfOrder)
    }

    /// Entries with a history row.
    pub fn applied(&self) -> Vec<&MigrationInfo> {
        self.filter(|info| info.applied().is_some())
    }

    /// Entries with a local script.
    pub fn resolved(&self) -> Vec<&MigrationInfo> {
        self.filter(|info| info.resolved().is_some())
    }

    /// Look up the entry for a version.
    pub fn find(&self, version: &MigrationVersion) -> Option<&MigrationInfo> {
        self.infos
            .binary_search_by(|info| info.version().cmp(version))
            .ok()
            .map(|idx| &self.infos[idx])
    }

    /// Collect every problem in the snapshot under the configured strictness.
    pub fn validation_issues(&self) -> Vec<ValidationIssue> {
        validate_infos(&self.infos, self.strict)
    }

    /// Fail if the snapshot has problems under the configured strictness.
    pub fn validate(&self) -> Result<(), MigrationError> {
        ensure_valid(&self.validation_issues())
    }

    fn filter(&self, predicate: impl Fn(&MigrationInfo) -> bool) -> Vec<&MigrationInfo> {
        self.infos.iter().filter(|&info| predicate(info)).collect()
    }
}

/// Merge resolved and applied records into classified entries, version-ascending.
pub fn reconcile(
    mut resolved: Vec<ResolvedMigration>,
    mut applied: Vec<AppliedMigration>,
    target: &MigrationVersion,
    out_of_order: bool,
) -> Result<Vec<MigrationInfo>, MigrationError> {
    resolved.sort_by(|a, b| a.version.cmp(&b.version));
    if let Some(pair) = resolved.windows(2).find(|w| w[0].version == w[1].version) {
        return Err(MigrationError::DuplicateResolvedVersion {
            version: pair[0].version.to_string(),
            first: pair[0].script.clone(),
            second: pair[1].script.clone(),
        });
    }

    applied.sort_by(|a, b| {
        a.version
            .cmp(&b.version)
            .then(a.installed_rank.cmp(&b.installed_rank))
    });
    check_applied_integrity(&applied)?;

    let ctx = ClassifyContext::build(&resolved, &applied, target, out_of_order);
    debug!(
        baseline = ?ctx.baseline.as_ref().map(ToString::to_string),
        latest_applied = %ctx.latest_applied,
        target = %ctx.target,
        "Classification context"
    );

    let applied = representative_rows(applied);
    let mut infos = Vec::with_capacity(resolved.len().max(applied.len()));
    let mut resolved = resolved.into_iter().peekable();
    let mut applied = applied.into_iter().peekable();

    loop {
        let step = match (resolved.peek(), applied.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(r), Some(a)) => r.version.cmp(&a.version),
        };

        let source = match step {
            Ordering::Less => resolved.next().map(EntrySource::Resolved),
            Ordering::Greater => applied.next().map(EntrySource::Applied),
            Ordering::Equal => resolved
                .next()
                .zip(applied.next())
                .map(|(r, a)| EntrySource::Matched(r, a)),
        };

        if let Some(source) = source {
            infos.push(MigrationInfo::new(source, &ctx));
        }
    }

    Ok(infos)
}

/// Reject versions with more than one successful ordinary row. Expects
/// `applied` sorted by version.
fn check_applied_integrity(applied: &[AppliedMigration]) -> Result<(), MigrationError> {
    let baselines = applied
        .iter()
        .filter(|a| a.migration_type == MigrationType::Baseline)
        .count();
    if baselines > 1 {
        warn!(count = baselines, "History holds more than one baseline marker");
    }

    for group in applied.chunk_by(|a, b| a.version == b.version) {
        let ranks: Vec<i32> = group
            .iter()
            .filter(|a| a.success && !a.migration_type.is_synthetic())
            .map(|a| a.installed_rank)
            .collect();

        if ranks.len() > 1 {
            let version = group[0].version.to_string();
            warn!(%version, ?ranks, "Duplicate successful history rows");
            return Err(MigrationError::DuplicateAppliedVersion { version, ranks });
        }
    }

    Ok(())
}

/// Pick one row per version: the latest successful row, or the latest row
/// when every attempt failed. Expects `applied` sorted by version, then
/// installed rank.
fn representative_rows(applied: Vec<AppliedMigration>) -> Vec<AppliedMigration> {
    let mut rows: Vec<AppliedMigration> = Vec::with_capacity(applied.len());
    for row in applied {
        match rows.last_mut() {
            Some(last) if last.version == row.version => {
                if row.success || !last.success {
                    *last = row;
                }
            }
            _ => rows.push(row),
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn v(text: &str) -> MigrationVersion {
        MigrationVersion::parse(text).unwrap()
    }

    fn resolved(version: &str) -> ResolvedMigration {
        ResolvedMigration::new(v(version), "resolved", format!("V{}__resolved.cql", version))
    }

    fn applied(rank: i32, version: &str, success: bool) -> AppliedMigration {
        AppliedMigration::new(rank, v(version), "applied", MigrationType::Cql, "script", success)
    }

    /// Resolver that can be switched into a failing mode.
    struct FlakyResolver {
        migrations: Vec<ResolvedMigration>,
        fail: Cell<bool>,
    }

    impl MigrationResolver for FlakyResolver {
        fn resolve_migrations(&self) -> Result<Vec<ResolvedMigration>, MigrationError> {
            if self.fail.get() {
                return Err(MigrationError::InvalidScriptName {
                    name: "V__broken.cql".to_string(),
                    reason: "missing version".to_string(),
                });
            }
            Ok(self.migrations.clone())
        }
    }

    #[test]
    fn test_empty_before_refresh() {
        let resolver = vec![resolved("1")];
        let history: Vec<AppliedMigration> = Vec::new();
        let service = MigrationInfoService::new(&resolver, &history, &MigrationConfig::default());

        assert!(service.all().is_empty());
        assert!(service.current().is_none());
        assert!(service.pending().is_empty());
    }

    #[test]
    fn test_failed_refresh_keeps_snapshot() {
        let resolver = FlakyResolver {
            migrations: vec![resolved("1"), resolved("2")],
            fail: Cell::new(false),
        };
        let history = vec![applied(1, "1", true)];
        let mut service =
            MigrationInfoService::new(&resolver, &history, &MigrationConfig::default());

        service.refresh().unwrap();
        let before = service.all().to_vec();
        assert_eq!(before.len(), 2);

        resolver.fail.set(true);
        assert!(service.refresh().is_err());
        assert_eq!(service.all(), &before[..]);
    }

    #[test]
    fn test_duplicate_successful_rows_rejected() {
        let resolver = vec![resolved("1")];
        let history = vec![applied(1, "1", true), applied(2, "1", true)];
        let mut service =
            MigrationInfoService::new(&resolver, &history, &MigrationConfig::default());

        match service.refresh() {
            Err(MigrationError::DuplicateAppliedVersion { version, ranks }) => {
                assert_eq!(version, "1");
                assert_eq!(ranks, vec![1, 2]);
            }
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_resolved_rejected() {
        let mut second = resolved("1.0");
        second.script = "V1_0__again.cql".to_string();
        let result = reconcile(
            vec![resolved("1"), second],
            Vec::new(),
            &MigrationVersion::Latest,
            false,
        );
        assert!(matches!(
            result,
            Err(MigrationError::DuplicateResolvedVersion { .. })
        ));
    }

    #[test]
    fn test_retry_after_failure_uses_latest_attempt() {
        let infos = reconcile(
            vec![resolved("1")],
            vec![applied(2, "1", true), applied(1, "1", false)],
            &MigrationVersion::Latest,
            false,
        )
        .unwrap();

        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].state(), MigrationState::Success);
        assert_eq!(infos[0].installed_rank(), Some(2));
    }

    #[test]
    fn test_failed_rerun_keeps_earlier_success() {
        let resolver = vec![resolved("1"), resolved("2")];
        let history = vec![
            applied(1, "2", true),
            applied(2, "2", false),
            applied(3, "1", false),
        ];
        let mut service =
            MigrationInfoService::new(&resolver, &history, &MigrationConfig::default());
        service.refresh().unwrap();

        let current = service.current().unwrap();
        assert_eq!(current.version(), &v("2"));
        assert_eq!(current.state(), MigrationState::Success);
        assert_eq!(current.installed_rank(), Some(1));
        assert_eq!(service.find(&v("1")).map(|i| i.state()), Some(MigrationState::Failed));
    }

    #[test]
    fn test_all_attempts_failed_reports_latest() {
        let infos = reconcile(
            vec![resolved("1")],
            vec![applied(1, "1", false), applied(2, "1", false)],
            &MigrationVersion::Latest,
            false,
        )
        .unwrap();

        assert_eq!(infos[0].state(), MigrationState::Failed);
        assert_eq!(infos[0].installed_rank(), Some(2));
    }

    #[test]
    fn test_unordered_input_is_sorted() {
        let infos = reconcile(
            vec![resolved("3"), resolved("1"), resolved("2")],
            vec![applied(2, "2", true), applied(1, "1", true)],
            &MigrationVersion::Latest,
            false,
        )
        .unwrap();

        let versions: Vec<String> = infos.iter().map(|i| i.version().to_string()).collect();
        assert_eq!(versions, vec!["1", "2", "3"]);
        assert_eq!(infos[2].state(), MigrationState::Pending);
    }

    #[test]
    fn test_find_and_views() {
        let resolver = vec![resolved("1"), resolved("2"), resolved("4")];
        let history = vec![applied(1, "1", true), applied(2, "3", false)];
        let config = MigrationConfig::default().with_out_of_order(true);
        let mut service = MigrationInfoService::new(&resolver, &history, &config);
        service.refresh().unwrap();

        assert_eq!(service.find(&v("3")).map(|i| i.state()), Some(MigrationState::MissingFailed));
        assert!(service.find(&v("5")).is_none());
        assert_eq!(service.failed().len(), 1);
        assert!(service.out_of_order().is_empty());
        assert_eq!(service.applied().len(), 2);
        assert_eq!(service.resolved().len(), 3);
        assert_eq!(service.current().map(|i| i.version().to_string()), Some("1".to_string()));
    }
}
