//! Migration repository
//!
//! Migrations are executables named `<version>_<description>.<ext>` in one
//! directory. The version prefix is matched textually against the decimal
//! form of the requested version, so `01_init.sh` is never version 1.

use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::errors::{MigrateError, Result};
use crate::ledger::MigrationVersion;

/// Default migrations directory, relative to the working directory
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Default script extension
pub const DEFAULT_EXTENSION: &str = "sh";

/// One resolved migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub version: MigrationVersion,
    pub path: PathBuf,
}

/// Directory of migration scripts
#[derive(Debug, Clone)]
pub struct MigrationRepository {
    dir: PathBuf,
    extension: String,
}

impl MigrationRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve the migration for `version`
    ///
    /// `None` means nothing is pending, which callers report as up to date.
    ///
    /// # Errors
    ///
    /// Same as [`find_migration`].
    pub fn find_next_migration(&self, version: MigrationVersion) -> Result<Option<Migration>> {
        let path = find_migration(&self.dir, &self.extension, version)?;
        Ok(path.map(|path| Migration { version, path }))
    }
}

/// Find the single file for `version` in `dir`
///
/// Returns `Ok(None)` when no file matches.
///
/// # Errors
///
/// - `AmbiguousMigration` when several files carry the version
/// - `MigrationLookup` when the directory cannot be read
pub fn find_migration(
    dir: &Path,
    extension: &str,
    version: MigrationVersion,
) -> Result<Option<PathBuf>> {
    let pattern = format!(
        "{}/{}_*.{}",
        Pattern::escape(&dir.to_string_lossy()),
        version,
        Pattern::escape(extension)
    );

    let mut files = glob::glob(&pattern)
        .map_err(|e| MigrateError::MigrationLookup {
            reason: e.to_string(),
        })?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| MigrateError::MigrationLookup {
            reason: e.to_string(),
        })?;

    match files.len() {
        0 => Ok(None),
        1 => Ok(files.pop()),
        count => Err(MigrateError::AmbiguousMigration {
            count,
            version: version.get(),
        }),
    }
}
