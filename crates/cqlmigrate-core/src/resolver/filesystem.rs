//! Filesystem migration resolver.
//!
//! Scripts are named `<prefix><version><separator><description><suffix>`,
//! e.g. `V1_2__Add_users_table.cql`. Underscores in the version become dots
//! and underscores in the description become spaces.

use super::MigrationResolver;
use crate::error::MigrationError;
use crate::migration::ResolvedMigration;
use crate::version::MigrationVersion;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Default script name prefix.
pub const DEFAULT_PREFIX: &str = "V";

/// Default separator between version and description.
pub const DEFAULT_SEPARATOR: &str = "__";

/// Default script name suffix.
pub const DEFAULT_SUFFIX: &str = ".cql";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Resolves CQL scripts from a directory tree.
#[derive(Debug, Clone)]
pub struct FileSystemResolver {
    location: PathBuf,
    prefix: String,
    separator: String,
    suffix: String,
}

impl FileSystemResolver {
    /// Create a resolver for the given directory.
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            prefix: DEFAULT_PREFIX.to_string(),
            separator: DEFAULT_SEPARATOR.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }

    /// Set the script name prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the version/description separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the script name suffix.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// The scanned directory.
    pub fn location(&self) -> &Path {
        &self.location
    }

    fn script_name(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.location).unwrap_or(path);
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl MigrationResolver for FileSystemResolver {
    fn resolve_migrations(&self) -> Result<Vec<ResolvedMigration>, MigrationError> {
        if !self.location.exists() {
            warn!(location = %self.location.display(), "Migration location does not exist");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        collect_files(&self.location, &mut files)?;
        files.sort();

        let mut by_version: BTreeMap<MigrationVersion, ResolvedMigration> = BTreeMap::new();
        for path in files {
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let Some((version, description)) =
                parse_script_name(file_name, &self.prefix, &self.separator, &self.suffix)?
            else {
                continue;
            };

            let content = fs::read(&path).map_err(|source| MigrationError::Resolve {
                location: path.clone(),
                source,
            })?;
            let script = self.script_name(&path);

            if let Some(existing) = by_version.get(&version) {
                return Err(MigrationError::DuplicateResolvedVersion {
                    version: version.to_string(),
                    first: existing.script.clone(),
                    second: script,
                });
            }

            let migration = ResolvedMigration::new(version.clone(), description, script)
                .with_checksum(compute_checksum(&content));
            by_version.insert(version, migration);
        }

        debug!(
            location = %self.location.display(),
            count = by_version.len(),
            "Resolved migrations"
        );
        Ok(by_version.into_values().collect())
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), MigrationError> {
    let io_err = |source: std::io::Error| MigrationError::Resolve {
        location: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let file_type = entry.file_type().map_err(io_err)?;
        let path = entry.path();
        if file_type.is_dir() {
            collect_files(&path, out)?;
        } else if file_type.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

/// Split a script file name into its version and description.
///
/// Returns `Ok(None)` for files that do not carry the prefix and suffix.
pub fn parse_script_name(
    file_name: &str,
    prefix: &str,
    separator: &str,
    suffix: &str,
) -> Result<Option<(MigrationVersion, String)>, MigrationError> {
    let Some(stem) = file_name
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(suffix))
    else {
        return Ok(None);
    };

    let invalid = |reason: &str| MigrationError::InvalidScriptName {
        name: file_name.to_string(),
        reason: reason.to_string(),
    };

    let Some((version, description)) = stem.split_once(separator) else {
        return Err(invalid(&format!(
            "missing separator '{}' between version and description",
            separator
        )));
    };
    if version.is_empty() {
        return Err(invalid("missing version"));
    }

    let version = MigrationVersion::parse(version)?;
    Ok(Some((version, description.replace('_', " ").trim().to_string())))
}

/// BLAKE3 checksum of a script, insensitive to line endings, a trailing
/// newline and a UTF-8 byte order mark.
pub fn compute_checksum(content: &[u8]) -> String {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let content = content.strip_suffix(b"\n").unwrap_or(content);

    let mut hasher = blake3::Hasher::new();
    for line in content.split(|b| *b == b'\n') {
        hasher.update(line.strip_suffix(b"\r").unwrap_or(line));
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}
