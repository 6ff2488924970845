//! Version ledger
//!
//! The number of applied migrations lives in a single store variable.
//! It is read from the job's snapshot and written back through the store.

use std::fmt;

use crate::errors::{MigrateError, Result};
use crate::snapshot::EnvSnapshot;
use crate::store::KeyedStore;

/// Variable holding the applied version
pub const VERSION_KEY: &str = "TF_MIGRATION_VERSION";

/// Count of migrations applied so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MigrationVersion(u64);

impl MigrationVersion {
    /// Nothing applied yet
    pub const BASELINE: MigrationVersion = MigrationVersion(0);

    pub fn new(version: u64) -> Self {
        Self(version)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// The version that follows this one
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Parse the persisted decimal form
    ///
    /// # Errors
    ///
    /// Returns `InvalidVersion` if `raw` is not a non-negative integer.
    pub fn parse(raw: &str) -> Result<Self> {
        raw.parse::<u64>()
            .map(Self)
            .map_err(|e| MigrateError::InvalidVersion {
                value: raw.to_string(),
                reason: format!("invalid value {:?}: {}", raw, e),
            })
    }
}

impl fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reads and writes the applied version
pub struct VersionLedger<'a> {
    snapshot: &'a EnvSnapshot,
    store: &'a dyn KeyedStore,
}

impl<'a> VersionLedger<'a> {
    pub fn new(snapshot: &'a EnvSnapshot, store: &'a dyn KeyedStore) -> Self {
        Self { snapshot, store }
    }

    /// Version recorded in the snapshot; unset means baseline
    ///
    /// # Errors
    ///
    /// Returns `InvalidVersion` if the recorded value is not an integer.
    pub fn current_version(&self) -> Result<MigrationVersion> {
        current_version(self.snapshot)
    }

    /// # Errors
    ///
    /// Same as [`VersionLedger::current_version`].
    pub fn next_version(&self) -> Result<MigrationVersion> {
        self.current_version().map(MigrationVersion::next)
    }

    /// Persist `version` to the store
    ///
    /// # Errors
    ///
    /// Returns `SetVersionFailed` wrapping the store error.
    pub fn set_version(&self, version: MigrationVersion) -> Result<()> {
        self.store
            .put(VERSION_KEY, &version.to_string())
            .map_err(MigrateError::set_version_failed)?;
        tracing::info!(version = version.get(), "recorded migration version");
        Ok(())
    }
}

/// Read the applied version without a store
///
/// Local runs never write the ledger, so they only need this half.
///
/// # Errors
///
/// Returns `InvalidVersion` if the recorded value is not an integer.
pub fn current_version(snapshot: &EnvSnapshot) -> Result<MigrationVersion> {
    match snapshot.get(VERSION_KEY) {
        None => Ok(MigrationVersion::BASELINE),
        Some(raw) => MigrationVersion::parse(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_current_version_unset_is_baseline() {
        let snapshot = EnvSnapshot::default();
        assert_eq!(current_version(&snapshot).unwrap(), MigrationVersion::new(0));
    }

    #[test]
    fn test_current_version_is_set() {
        let snapshot = EnvSnapshot::from_pairs([(VERSION_KEY, "99")]);
        assert_eq!(current_version(&snapshot).unwrap(), MigrationVersion::new(99));
    }

    #[test]
    fn test_current_version_is_not_number() {
        let snapshot = EnvSnapshot::from_pairs([(VERSION_KEY, "boom")]);
        let err = current_version(&snapshot).unwrap_err();
        assert!(matches!(err, MigrateError::InvalidVersion { ref value, .. } if value == "boom"));
        assert!(err
            .to_string()
            .starts_with("failed to parse current version: invalid value \"boom\""));
    }

    #[test]
    fn test_negative_version_is_rejected() {
        let snapshot = EnvSnapshot::from_pairs([(VERSION_KEY, "-1")]);
        assert!(current_version(&snapshot).is_err());
    }

    #[test]
    fn test_next_version_follows_current() {
        let snapshot = EnvSnapshot::from_pairs([(VERSION_KEY, "4")]);
        let store = MemoryStore::new();
        let ledger = VersionLedger::new(&snapshot, &store);
        assert_eq!(ledger.next_version().unwrap(), MigrationVersion::new(5));
    }

    #[test]
    fn test_set_version_writes_decimal() {
        let snapshot = EnvSnapshot::default();
        let store = MemoryStore::new();
        VersionLedger::new(&snapshot, &store)
            .set_version(MigrationVersion::new(12))
            .unwrap();
        assert_eq!(store.get(VERSION_KEY).as_deref(), Some("12"));
    }
}
