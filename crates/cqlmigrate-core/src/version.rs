//! Migration versions.
//!
//! A version is a sequence of non-negative integer components written with
//! `.` or `_` delimiters (`1.2.3`, `1_2_3`). Trailing zero components carry no
//! meaning, so `1`, `1.0` and `1.0.0` are the same version. Two sentinels
//! bracket every concrete version: [`MigrationVersion::Empty`] sorts first and
//! [`MigrationVersion::Latest`] sorts last.

use crate::error::MigrationError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Display text of the empty sentinel.
pub const EMPTY_DISPLAY: &str = "<< Empty Schema >>";

/// Display text of the latest sentinel.
pub const LATEST_DISPLAY: &str = "<< Latest Version >>";

/// An ordered migration version.
///
/// Variant order is the sort order: `Empty < Version(..) < Latest`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MigrationVersion {
    /// Nothing applied yet.
    Empty,
    /// A concrete version. Trailing zero components are stripped on construction.
    Version(Vec<u64>),
    /// Whatever is newest.
    Latest,
}

impl MigrationVersion {
    /// Build a concrete version from its components.
    pub fn from_components(components: impl Into<Vec<u64>>) -> Self {
        let mut components = components.into();
        while components.last() == Some(&0) {
            components.pop();
        }
        MigrationVersion::Version(components)
    }

    /// Parse a concrete version such as `1.2.3` or `1_2_3`.
    pub fn parse(text: &str) -> Result<Self, MigrationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(invalid(text, "version is empty"));
        }

        let components = trimmed
            .split(['.', '_'])
            .map(|part| {
                if part.is_empty() {
                    return Err(invalid(text, "empty version component"));
                }
                if !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid(
                        text,
                        &format!("component '{}' is not a non-negative integer", part),
                    ));
                }
                part.parse::<u64>()
                    .map_err(|e| invalid(text, &format!("component '{}': {}", part, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_components(components))
    }

    /// Parse a migration target: `latest` (any case) or a concrete version.
    pub fn parse_target(text: &str) -> Result<Self, MigrationError> {
        if text.trim().eq_ignore_ascii_case("latest") {
            Ok(MigrationVersion::Latest)
        } else {
            Self::parse(text)
        }
    }

    /// Check whether this is a concrete (non-sentinel) version.
    pub fn is_concrete(&self) -> bool {
        matches!(self, MigrationVersion::Version(_))
    }
}

fn invalid(text: &str, reason: &str) -> MigrationError {
    MigrationError::InvalidVersion {
        version: text.to_string(),
        reason: reason.to_string(),
    }
}

impl FromStr for MigrationVersion {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationVersion::Empty => f.write_str(EMPTY_DISPLAY),
            MigrationVersion::Latest => f.write_str(LATEST_DISPLAY),
            MigrationVersion::Version(components) if components.is_empty() => f.write_str("0"),
            MigrationVersion::Version(components) => {
                for (i, component) in components.iter().enumerate() {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    write!(f, "{}", component)?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for MigrationVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
