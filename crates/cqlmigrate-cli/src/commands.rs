//! Subcommand execution.

use crate::formatter::Formatter;
use cqlmigrate_core::{
    ensure_valid, AppliedMigrationSource, MigrationConfig, MigrationError, MigrationInfoService,
    MigrationResolver, SledHistoryStore,
};
use tracing::info;

/// Render every migration and its state.
pub fn info(
    resolver: &dyn MigrationResolver,
    history: &dyn AppliedMigrationSource,
    config: &MigrationConfig,
    formatter: &dyn Formatter,
) -> Result<String, MigrationError> {
    let mut service = MigrationInfoService::new(resolver, history, config);
    service.refresh()?;
    Ok(formatter.format_info(service.all(), service.current()))
}

/// Validate the history against the available scripts.
///
/// Returns the rendered problems alongside the error when validation fails.
pub fn validate(
    resolver: &dyn MigrationResolver,
    history: &dyn AppliedMigrationSource,
    config: &MigrationConfig,
    formatter: &dyn Formatter,
) -> Result<String, (String, MigrationError)> {
    let mut service = MigrationInfoService::new(resolver, history, config);
    service
        .refresh()
        .map_err(|e| (String::new(), e))?;

    let issues = service.validation_issues();
    match ensure_valid(&issues) {
        Ok(()) => Ok(formatter.format_message(&format!(
            "Successfully validated {} migrations",
            service.all().len()
        ))),
        Err(e) => Err((formatter.format_issues(&issues), e)),
    }
}

/// Record a baseline marker.
pub fn baseline(
    store: &SledHistoryStore,
    config: &MigrationConfig,
    user: &str,
    formatter: &dyn Formatter,
) -> Result<String, MigrationError> {
    let marker = store.baseline(config, user)?;
    store.flush()?;
    info!(keyspace = %config.keyspace, version = %marker.version, "Baselined keyspace");
    Ok(formatter.format_message(&format!(
        "Successfully baselined keyspace {} with version {}",
        config.keyspace, marker.version
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::TableFormatter;
    use cqlmigrate_core::{AppliedMigration, MigrationType, MigrationVersion, ResolvedMigration};

    fn v(text: &str) -> MigrationVersion {
        MigrationVersion::parse(text).unwrap()
    }

    #[test]
    fn test_validate_reports_failures() {
        let resolved = vec![ResolvedMigration::new(v("1"), "Broken", "V1__Broken.cql")];
        let history = vec![AppliedMigration::new(
            1,
            v("1"),
            "Broken",
            MigrationType::Cql,
            "V1__Broken.cql",
            false,
        )];
        let config = MigrationConfig::new("shop");

        match validate(&resolved, &history, &config, &TableFormatter) {
            Err((rendered, MigrationError::ValidationFailed { message })) => {
                assert!(rendered.contains("V1__Broken.cql"));
                assert_eq!(message, "migration 1 (V1__Broken.cql): failed to apply");
            }
            other => panic!("expected validation failure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_validate_success() {
        let resolved = vec![ResolvedMigration::new(v("1"), "Ok", "V1__Ok.cql")];
        let history: Vec<AppliedMigration> = Vec::new();
        let output = validate(&resolved, &history, &MigrationConfig::new("shop"), &TableFormatter)
            .unwrap();
        assert_eq!(output, "Successfully validated 1 migrations");
    }

    #[test]
    fn test_baseline_command() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let config = MigrationConfig::new("shop");
        let store = SledHistoryStore::open(&db, &config.keyspace, &config.table).unwrap();

        let output = baseline(&store, &config, "ops", &TableFormatter).unwrap();
        assert_eq!(output, "Successfully baselined keyspace shop with version 1");
        assert!(baseline(&store, &config, "ops", &TableFormatter).is_err());
    }
}
