//! Command implementations and the settings they share

pub mod apply;
pub mod local;
pub mod lock;

use std::path::PathBuf;

use clap::Args;
use tfmigrate_core::backend::{TerraformBackend, DEFAULT_BACKEND_FILE};
use tfmigrate_core::config::{StoreConfig, DEFAULT_API_URL, PROJECT_SLUG_VAR};
use tfmigrate_core::executor::ProcessExecutor;
use tfmigrate_core::repository::DEFAULT_MIGRATIONS_DIR;
use tfmigrate_core::{EnvSnapshot, MigrationRepository, Result, RunOutcome, Runner};
use tfmigrate_store::CircleCiStore;

/// Options shared by every command
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Directory holding `<version>_<description>.sh` scripts
    #[arg(long, global = true, default_value = DEFAULT_MIGRATIONS_DIR)]
    pub migrations_dir: PathBuf,

    /// Terraform file declaring the remote backend; `local` renames it to `<file>.disable`
    #[arg(long, global = true, default_value = DEFAULT_BACKEND_FILE)]
    pub backend_file: PathBuf,

    /// CircleCI API base URL
    #[arg(long, global = true, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Project slug, e.g. github/org/repo
    #[arg(long, global = true, env = PROJECT_SLUG_VAR)]
    pub project: Option<String>,

    /// Terraform binary used to re-initialize the backend
    #[arg(long, global = true, default_value = "terraform")]
    pub terraform: PathBuf,

    /// Emit JSON logs on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Everything a command needs, resolved once at startup
pub struct Settings {
    pub snapshot: EnvSnapshot,
    pub store_config: StoreConfig,
    pub repository: MigrationRepository,
    pub backend: TerraformBackend,
    pub executor: ProcessExecutor,
}

impl Settings {
    pub fn resolve(args: GlobalArgs, snapshot: EnvSnapshot) -> Self {
        let store_config = StoreConfig::from_snapshot(&snapshot)
            .with_api_url(args.api_url)
            .with_project(args.project);

        Self {
            snapshot,
            store_config,
            repository: MigrationRepository::new(args.migrations_dir),
            backend: TerraformBackend::new(args.backend_file),
            executor: ProcessExecutor::new().with_terraform(args.terraform),
        }
    }

    /// # Errors
    ///
    /// Returns `Transport` if the HTTP client cannot be built.
    pub fn store(&self) -> Result<CircleCiStore> {
        CircleCiStore::new(self.store_config.clone())
    }

    pub fn runner<'a>(&'a self, store: &'a CircleCiStore) -> Runner<'a> {
        Runner::new(&self.snapshot, store, &self.executor)
            .with_repository(self.repository.clone())
            .with_backend(self.backend.clone())
    }
}

/// Print the user-facing result of a run
pub fn report(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::UpToDate { pending } => {
            tracing::debug!(version = pending.get(), "no migration pending");
            println!("Already up to date.");
        }
        RunOutcome::Applied(migration) => {
            tracing::info!(
                version = migration.version.get(),
                migration_path = %migration.path.display(),
                "migration applied"
            );
        }
    }
}
