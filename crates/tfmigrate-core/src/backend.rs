//! Terraform backend toggle for local runs
//!
//! Local runs operate on a local copy of the state. The remote backend
//! declaration is moved aside to `<file>.disable` and Terraform is
//! re-initialized, once; the presence of the marker file means it has
//! already happened.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{io_error, MigrateError, Result};
use crate::executor::Executor;

/// Default backend declaration file
pub const DEFAULT_BACKEND_FILE: &str = "backend.tf";

const DISABLED_SUFFIX: &str = ".disable";

/// What `disable_or_skip` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    /// The marker already existed
    AlreadyDisabled,
    /// The backend file was renamed and Terraform re-initialized
    Disabled,
}

/// Location of the backend declaration and its disabled marker
#[derive(Debug, Clone)]
pub struct TerraformBackend {
    file: PathBuf,
    disabled: PathBuf,
}

impl Default for TerraformBackend {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_FILE)
    }
}

impl TerraformBackend {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        let mut disabled = file.clone().into_os_string();
        disabled.push(DISABLED_SUFFIX);
        Self {
            file,
            disabled: PathBuf::from(disabled),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn disabled_marker(&self) -> &Path {
        &self.disabled
    }

    /// Disable the backend unless the marker shows it already is
    ///
    /// # Errors
    ///
    /// - `Io` if the marker's presence cannot be determined
    /// - `BackendDisable` if the rename fails
    /// - `BackendInit` if `terraform init` fails
    pub fn disable_or_skip(&self, executor: &dyn Executor) -> Result<BackendState> {
        match fs::metadata(&self.disabled) {
            Ok(_) => {
                tracing::debug!(marker = %self.disabled.display(), "backend already disabled");
                return Ok(BackendState::AlreadyDisabled);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_error("stat_backend_marker", e)),
        }

        self.rename_backend_file()?;
        executor.reinitialize_backend()?;
        Ok(BackendState::Disabled)
    }

    /// Move the backend file to its disabled name
    ///
    /// # Errors
    ///
    /// Returns `BackendDisable` if the rename fails, e.g. the file is missing.
    pub fn rename_backend_file(&self) -> Result<()> {
        fs::rename(&self.file, &self.disabled).map_err(|e| MigrateError::BackendDisable {
            reason: format!(
                "rename {} {}: {}",
                self.file.display(),
                self.disabled.display(),
                e
            ),
        })?;
        tracing::info!(backend_file = %self.file.display(), "disabled terraform backend");
        Ok(())
    }
}
