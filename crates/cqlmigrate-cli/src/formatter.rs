//! Output formatters for migration info.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use comfy_table::Table;
use cqlmigrate_core::{MigrationInfo, ValidationIssue};
use serde_json::json;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format every migration plus the current version.
    fn format_info(&self, infos: &[MigrationInfo], current: Option<&MigrationInfo>) -> String;

    /// Format validation problems.
    fn format_issues(&self, issues: &[ValidationIssue]) -> String;

    /// Format a simple message.
    fn format_message(&self, message: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_info(&self, infos: &[MigrationInfo], current: Option<&MigrationInfo>) -> String {
        let current = current
            .map(|info| info.version().to_string())
            .unwrap_or_else(|| "<< Empty Schema >>".to_string());

        if infos.is_empty() {
            return format!("Current version: {}\nNo migrations found", current);
        }

        let mut table = Table::new();
        table.set_header(vec!["Version", "Description", "Type", "Installed On", "State"]);
        for info in infos {
            table.add_row(vec![
                info.version().to_string(),
                info.description().to_string(),
                info.migration_type().to_string(),
                info.installed_on().map(format_timestamp).unwrap_or_default(),
                info.state().to_string(),
            ]);
        }

        format!("Current version: {}\n{}", current, table)
    }

    fn format_issues(&self, issues: &[ValidationIssue]) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Version", "Script", "State", "Problem"]);
        for issue in issues {
            table.add_row(vec![
                issue.version.to_string(),
                issue.script.clone(),
                issue.state.to_string(),
                issue.message.clone(),
            ]);
        }
        table.to_string()
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_info(&self, infos: &[MigrationInfo], current: Option<&MigrationInfo>) -> String {
        let migrations: Vec<serde_json::Value> = infos
            .iter()
            .map(|info| {
                json!({
                    "version": info.version(),
                    "description": info.description(),
                    "type": info.migration_type(),
                    "script": info.script(),
                    "checksum": info.checksum(),
                    "state": info.state(),
                    "installed_rank": info.installed_rank(),
                    "installed_on": info.installed_on().map(format_timestamp),
                    "installed_by": info.installed_by(),
                    "execution_time": info.execution_time(),
                })
            })
            .collect();

        let value = json!({
            "current": current.map(|info| info.version()),
            "migrations": migrations,
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }

    fn format_issues(&self, issues: &[ValidationIssue]) -> String {
        serde_json::to_string_pretty(issues).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }

    fn format_message(&self, message: &str) -> String {
        json!({ "message": message }).to_string()
    }
}

/// Render microseconds since the epoch as a UTC timestamp.
fn format_timestamp(micros: u64) -> String {
    i64::try_from(micros)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_micros)
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
