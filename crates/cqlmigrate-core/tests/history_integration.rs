//! End-to-end tests over a script directory and a sled history table.

use cqlmigrate_core::history::HistoryRow;
use cqlmigrate_core::{
    AppliedMigrationSource, FileSystemResolver, MigrationConfig, MigrationError,
    MigrationInfoService, MigrationResolver, MigrationState, SledHistoryStore,
};
use std::fs;

struct TestContext {
    scripts: tempfile::TempDir,
    db: sled::Db,
    config: MigrationConfig,
}

impl TestContext {
    fn new() -> Self {
        Self {
            scripts: tempfile::tempdir().unwrap(),
            db: sled::Config::new().temporary(true).open().unwrap(),
            config: MigrationConfig::new("shop"),
        }
    }

    fn write_script(&self, name: &str, content: &str) {
        fs::write(self.scripts.path().join(name), content).unwrap();
    }

    fn remove_script(&self, name: &str) {
        fs::remove_file(self.scripts.path().join(name)).unwrap();
    }

    fn resolver(&self) -> FileSystemResolver {
        FileSystemResolver::new(self.scripts.path())
    }

    fn store(&self) -> SledHistoryStore {
        SledHistoryStore::open(&self.db, &self.config.keyspace, &self.config.table).unwrap()
    }
}

/// Record every pending migration as successfully applied.
fn apply_pending(resolver: &FileSystemResolver, store: &SledHistoryStore, config: &MigrationConfig) {
    let mut service = MigrationInfoService::new(resolver, store, config);
    service.refresh().unwrap();
    let pending: Vec<_> = service
        .pending()
        .iter()
        .filter_map(|info| info.resolved().cloned())
        .collect();
    for migration in pending {
        store.record_migration(&migration, "tester", 1, true).unwrap();
    }
}

#[test]
fn test_apply_then_remove_script() {
    let ctx = TestContext::new();
    ctx.write_script("V1__Create_orders.cql", "CREATE TABLE orders (id uuid PRIMARY KEY);");
    ctx.write_script("V2__Add_total.cql", "ALTER TABLE orders ADD total decimal;");

    let resolver = ctx.resolver();
    let store = ctx.store();
    store.add_schema_marker("tester").unwrap();
    apply_pending(&resolver, &store, &ctx.config);

    let mut service = MigrationInfoService::new(&resolver, &store, &ctx.config);
    service.refresh().unwrap();
    let states: Vec<MigrationState> = service.all().iter().map(|i| i.state()).collect();
    assert_eq!(
        states,
        vec![
            MigrationState::Success,
            MigrationState::Success,
            MigrationState::Success
        ]
    );
    assert_eq!(
        service.current().map(|i| i.version().to_string()),
        Some("2".to_string())
    );

    let applied = service.find(&"1".parse().unwrap()).unwrap();
    assert_eq!(
        applied.checksum(),
        applied.resolved().and_then(|r| r.checksum.as_deref())
    );

    ctx.remove_script("V1__Create_orders.cql");
    ctx.write_script("V3__Add_status.cql", "ALTER TABLE orders ADD status text;");
    service.refresh().unwrap();

    assert_eq!(
        service.find(&"1".parse().unwrap()).map(|i| i.state()),
        Some(MigrationState::MissingSuccess)
    );
    assert_eq!(service.pending().len(), 1);
}

#[test]
fn test_baseline_then_new_scripts() {
    let ctx = TestContext::new();
    ctx.write_script("V1__Legacy.cql", "SELECT 1;");
    ctx.write_script("V2__Legacy.cql", "SELECT 2;");
    ctx.write_script("V3__New.cql", "SELECT 3;");

    let config = ctx
        .config
        .clone()
        .with_baseline_version("2".parse().unwrap());
    let store = ctx.store();
    store.baseline(&config, "tester").unwrap();

    let resolver = ctx.resolver();
    let mut service = MigrationInfoService::new(&resolver, &store, &config);
    service.refresh().unwrap();

    let states: Vec<MigrationState> = service.all().iter().map(|i| i.state()).collect();
    assert_eq!(
        states,
        vec![
            MigrationState::BelowBaseline,
            MigrationState::Baseline,
            MigrationState::Pending
        ]
    );
}

#[test]
fn test_future_rows_from_newer_release() {
    let ctx = TestContext::new();
    ctx.write_script("V1__First.cql", "SELECT 1;");
    ctx.write_script("V2__Second.cql", "SELECT 2;");

    let resolver = ctx.resolver();
    let store = ctx.store();
    apply_pending(&resolver, &store, &ctx.config);

    ctx.remove_script("V2__Second.cql");
    let mut service = MigrationInfoService::new(&resolver, &store, &ctx.config);
    service.refresh().unwrap();

    assert_eq!(service.future().len(), 1);
    assert_eq!(
        service.current().map(|i| i.state()),
        Some(MigrationState::FutureSuccess)
    );
    assert!(service.validate().is_ok());

    let strict = ctx.config.clone().with_strict(true);
    let mut strict_service = MigrationInfoService::new(&resolver, &store, &strict);
    strict_service.refresh().unwrap();
    assert!(matches!(
        strict_service.validate(),
        Err(MigrationError::ValidationFailed { .. })
    ));
}

#[test]
fn test_malformed_history_keeps_previous_snapshot() {
    let ctx = TestContext::new();
    ctx.write_script("V1__First.cql", "SELECT 1;");

    let resolver = ctx.resolver();
    let store = ctx.store();
    let mut service = MigrationInfoService::new(&resolver, &store, &ctx.config);
    service.refresh().unwrap();
    assert_eq!(service.pending().len(), 1);

    let migration = resolver.resolve_migrations().unwrap().remove(0);
    let recorded = store.record_migration(&migration, "tester", 1, true).unwrap();
    let mut row = HistoryRow::from_applied(&recorded);
    row.installed_rank = 2;
    row.version = "2.beta".to_string();
    ctx.db
        .open_tree(SledHistoryStore::tree_name(&ctx.config.keyspace, &ctx.config.table))
        .unwrap()
        .insert(2i32.to_be_bytes(), row.to_bytes().unwrap())
        .unwrap();

    assert!(matches!(
        store.find_applied_migrations(),
        Err(MigrationError::InvalidVersion { .. })
    ));
    assert!(matches!(
        service.refresh(),
        Err(MigrationError::InvalidVersion { .. })
    ));
    assert_eq!(service.pending().len(), 1);
    assert!(service.current().is_none());
}
