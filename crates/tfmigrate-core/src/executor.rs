//! Subprocess execution
//!
//! Migration scripts and `terraform init` run as child processes whose
//! stdout and stderr are inherited, so their output streams straight into
//! the CI log.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::errors::{MigrateError, Result};

/// Runs the external programs a migration needs
pub trait Executor {
    /// Execute one migration script
    ///
    /// # Errors
    ///
    /// Returns `MigrationFailed` if the script cannot start or exits non-zero.
    fn run_migration(&self, path: &Path) -> Result<()>;

    /// Re-initialize Terraform after its backend was disabled
    ///
    /// # Errors
    ///
    /// Returns `BackendInit` if `terraform init` cannot start or exits non-zero.
    fn reinitialize_backend(&self) -> Result<()>;
}

/// Executor backed by real child processes
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    terraform: PathBuf,
    working_dir: Option<PathBuf>,
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self {
            terraform: PathBuf::from("terraform"),
            working_dir: None,
        }
    }
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific terraform binary
    pub fn with_terraform(mut self, terraform: impl Into<PathBuf>) -> Self {
        self.terraform = terraform.into();
        self
    }

    /// Run children in `dir` instead of the current directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn command(&self, program: &Path) -> Command {
        let mut cmd = Command::new(program);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

fn check_status(status: std::io::Result<ExitStatus>) -> std::result::Result<(), String> {
    match status {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(status.to_string()),
        Err(e) => Err(e.to_string()),
    }
}

impl Executor for ProcessExecutor {
    fn run_migration(&self, path: &Path) -> Result<()> {
        tracing::info!(migration_path = %path.display(), "running migration");
        check_status(self.command(path).status()).map_err(|reason| MigrateError::MigrationFailed {
            path: path.display().to_string(),
            reason,
        })
    }

    fn reinitialize_backend(&self) -> Result<()> {
        tracing::info!("running terraform init");
        let mut cmd = self.command(&self.terraform);
        cmd.args(["init", "-force-copy", "-lock-timeout=60s"]);
        check_status(cmd.status()).map_err(|reason| MigrateError::BackendInit { reason })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_run_migration_success() {
        let dir = TempDir::new().unwrap();
        let path = script(&dir, "1_touch.sh", "touch ran");
        ProcessExecutor::new()
            .with_working_dir(dir.path())
            .run_migration(&path)
            .unwrap();
        assert!(dir.path().join("ran").exists());
    }

    #[test]
    fn test_run_migration_non_zero_exit() {
        let dir = TempDir::new().unwrap();
        let path = script(&dir, "1_fail.sh", "exit 3");
        let err = ProcessExecutor::new().run_migration(&path).unwrap_err();
        assert!(matches!(err, MigrateError::MigrationFailed { .. }));
        assert!(err.to_string().starts_with("failed to run migration: "));
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_run_migration_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ProcessExecutor::new()
            .run_migration(&dir.path().join("9_missing.sh"))
            .unwrap_err();
        assert!(matches!(err, MigrateError::MigrationFailed { .. }));
    }

    #[test]
    fn test_reinitialize_backend_uses_configured_terraform() {
        let dir = TempDir::new().unwrap();
        let fake = script(&dir, "terraform", "echo \"$@\" > init-args");
        ProcessExecutor::new()
            .with_terraform(&fake)
            .with_working_dir(dir.path())
            .reinitialize_backend()
            .unwrap();
        let args = fs::read_to_string(dir.path().join("init-args")).unwrap();
        assert_eq!(args.trim(), "init -force-copy -lock-timeout=60s");
    }

    #[test]
    fn test_reinitialize_backend_failure() {
        let dir = TempDir::new().unwrap();
        let fake = script(&dir, "terraform", "exit 1");
        let err = ProcessExecutor::new()
            .with_terraform(&fake)
            .reinitialize_backend()
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to terraform init: "));
    }
}
