//! Maintenance overrides.
//!
//! An operator can take a whole row or a single unit out of service. The
//! flags are owned by an external settings store; this module only reads
//! them. A key that is absent from the store reads as `false`, so a fresh
//! install shows every unit in service.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::config::ConfigError;

/// Whether a unit is drawn offline, given its row flag and its own flag.
///
/// A missing unit flag counts as `false`.
pub fn is_offline(row_flag: bool, unit_flag: Option<bool>) -> bool {
    row_flag || unit_flag.unwrap_or(false)
}

/// Read-only view of the maintenance flags, keyed by stable string keys
/// such as `maintenance_21_20` or `maintenance_DC101A`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct MaintenanceFlags {
    flags: BTreeMap<String, bool>,
}

impl MaintenanceFlags {
    /// An empty flag table: every unit in service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a flag. Unknown keys read as `false`.
    pub fn get(&self, key: &str) -> bool {
        self.lookup(key).unwrap_or(false)
    }

    /// Look up a flag, distinguishing "unset" from `false`.
    pub fn lookup(&self, key: &str) -> Option<bool> {
        self.flags.get(key).copied()
    }

    /// Set a flag, returning the table for chaining.
    #[must_use]
    pub fn with(mut self, key: &str, value: bool) -> Self {
        self.set(key, value);
        self
    }

    /// Set a flag in place.
    pub fn set(&mut self, key: &str, value: bool) {
        self.flags.insert(key.to_owned(), value);
    }

    /// Number of flags currently set to `true`.
    pub fn active_count(&self) -> usize {
        self.flags.values().filter(|v| **v).count()
    }

    /// Combine a row flag and a unit flag from this table.
    pub fn unit_offline(&self, row_key: &str, unit_key: &str) -> bool {
        is_offline(self.get(row_key), self.lookup(unit_key))
    }

    /// Load flags from a flat YAML map of booleans.
    ///
    /// A missing file is the same as an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read,
    /// or [`ConfigError::Yaml`] if it is not a map of booleans.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "flags file not found, all units in service");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse flags from YAML. An empty document is an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the content is not a map of booleans.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let flags: BTreeMap<String, bool> = serde_yml::from_str(yaml)?;
        Ok(Self { flags })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn overlay_truth_table() {
        assert!(is_offline(true, Some(false)));
        assert!(!is_offline(false, Some(false)));
        assert!(is_offline(false, Some(true)));
        assert!(is_offline(true, Some(true)));
        assert!(!is_offline(false, None));
        assert!(is_offline(true, None));
    }

    #[test]
    fn unknown_keys_read_false() {
        let flags = MaintenanceFlags::new();
        assert!(!flags.get("maintenance_DC101A"));
        assert_eq!(flags.lookup("maintenance_DC101A"), None);
        assert!(!flags.unit_offline("maintenance_21_20", "maintenance_DC101A"));
    }

    #[test]
    fn row_flag_takes_whole_row_offline() {
        let flags = MaintenanceFlags::new().with("maintenance_21_20", true);
        assert!(flags.unit_offline("maintenance_21_20", "maintenance_DC101A"));
        assert!(flags.unit_offline("maintenance_21_20", "maintenance_DC101D"));
        assert!(!flags.unit_offline("maintenance_21_10", "maintenance_R1"));
    }

    #[test]
    fn parses_flat_yaml_map() {
        let flags = MaintenanceFlags::parse(
            "maintenance_R2: true\nmaintenance_DC101C: false\n",
        )
        .unwrap();
        assert!(flags.get("maintenance_R2"));
        assert_eq!(flags.lookup("maintenance_DC101C"), Some(false));
        assert_eq!(flags.active_count(), 1);
    }

    #[test]
    fn empty_document_is_empty_table() {
        let flags = MaintenanceFlags::parse("  \n").unwrap();
        assert_eq!(flags, MaintenanceFlags::default());
    }

    #[test]
    fn non_boolean_values_are_rejected() {
        let result = MaintenanceFlags::parse("maintenance_R1: sometimes\n");
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_is_empty_table() {
        let path = std::env::temp_dir().join("drumwatch-flags-does-not-exist.yaml");
        let flags = MaintenanceFlags::from_file(&path).unwrap();
        assert_eq!(flags.active_count(), 0);
    }
}
