//! Migration runner
//!
//! A run is a linear walk through explicit states:
//!
//! ```text
//! apply: DetermineVersion -> LocateMigration -> Lock -> PersistVersion -> Execute -> Unlock
//! local: DetermineVersion -> LocateMigration -> DisableBackend -> Execute
//! ```
//!
//! `LocateMigration` finishes early with `UpToDate` when nothing is
//! pending. A failing stage ends the run with its error unchanged. Nothing
//! is undone: a version persisted before a failing script stays persisted,
//! and a lock acquired before a failure stays held until `force-unlock`.

use std::fmt;
use std::time::Instant;

use crate::backend::TerraformBackend;
use crate::errors::Result;
use crate::executor::Executor;
use crate::ledger::{MigrationVersion, VersionLedger};
use crate::lock::LockManager;
use crate::repository::{Migration, MigrationRepository, DEFAULT_MIGRATIONS_DIR};
use crate::snapshot::EnvSnapshot;
use crate::store::KeyedStore;
use crate::{log_op_end, log_op_error, log_op_start};

/// How a run is coordinated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Locked, ledger-recorded run for CI
    Apply,
    /// Uncoordinated run against a local copy of the state
    Local {
        /// Run this version instead of the ledger's next one
        version: Option<MigrationVersion>,
    },
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Apply => "apply",
            RunMode::Local { .. } => "local",
        }
    }
}

/// Named pipeline stages, used in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    DetermineVersion,
    LocateMigration,
    Lock,
    PersistVersion,
    DisableBackend,
    Execute,
    Unlock,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::DetermineVersion => "determine_version",
            Stage::LocateMigration => "locate_migration",
            Stage::Lock => "lock",
            Stage::PersistVersion => "persist_version",
            Stage::DisableBackend => "disable_backend",
            Stage::Execute => "execute",
            Stage::Unlock => "unlock",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The migration ran to completion
    Applied(Migration),
    /// No migration exists for the pending version
    UpToDate { pending: MigrationVersion },
}

enum State {
    DetermineVersion,
    LocateMigration(MigrationVersion),
    Lock(Migration),
    PersistVersion(Migration),
    DisableBackend(Migration),
    Execute(Migration),
    Unlock(Migration),
    Finished(RunOutcome),
}

impl State {
    fn stage(&self) -> Option<Stage> {
        match self {
            State::DetermineVersion => Some(Stage::DetermineVersion),
            State::LocateMigration(_) => Some(Stage::LocateMigration),
            State::Lock(_) => Some(Stage::Lock),
            State::PersistVersion(_) => Some(Stage::PersistVersion),
            State::DisableBackend(_) => Some(Stage::DisableBackend),
            State::Execute(_) => Some(Stage::Execute),
            State::Unlock(_) => Some(Stage::Unlock),
            State::Finished(_) => None,
        }
    }
}

/// Drives one run through its stages
pub struct Runner<'a> {
    snapshot: &'a EnvSnapshot,
    store: &'a dyn KeyedStore,
    executor: &'a dyn Executor,
    repository: MigrationRepository,
    backend: TerraformBackend,
}

impl<'a> Runner<'a> {
    pub fn new(
        snapshot: &'a EnvSnapshot,
        store: &'a dyn KeyedStore,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            snapshot,
            store,
            executor,
            repository: MigrationRepository::new(DEFAULT_MIGRATIONS_DIR),
            backend: TerraformBackend::default(),
        }
    }

    pub fn with_repository(mut self, repository: MigrationRepository) -> Self {
        self.repository = repository;
        self
    }

    pub fn with_backend(mut self, backend: TerraformBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Run the pipeline for `mode` to completion
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing stage, unchanged.
    pub fn run(&self, mode: RunMode) -> Result<RunOutcome> {
        let start = Instant::now();
        log_op_start!("run", mode = mode.as_str());

        let mut state = State::DetermineVersion;
        loop {
            let current = match state {
                State::Finished(outcome) => {
                    log_op_end!(
                        "run",
                        start,
                        mode = mode.as_str(),
                        up_to_date = matches!(outcome, RunOutcome::UpToDate { .. })
                    );
                    return Ok(outcome);
                }
                other => other,
            };

            let stage = current.stage().map_or("finished", |s| s.as_str());
            match self.step(mode, current) {
                Ok(next) => state = next,
                Err(err) => {
                    log_op_error!(
                        "run",
                        start,
                        &err,
                        mode = mode.as_str(),
                        stage = stage
                    );
                    return Err(err);
                }
            }
        }
    }

    fn step(&self, mode: RunMode, state: State) -> Result<State> {
        let ledger = VersionLedger::new(self.snapshot, self.store);
        let lock = LockManager::new(self.snapshot, self.store);

        match state {
            State::DetermineVersion => {
                let version = match mode {
                    RunMode::Local {
                        version: Some(version),
                    } => version,
                    _ => ledger.next_version()?,
                };
                tracing::debug!(version = version.get(), "pending migration version");
                Ok(State::LocateMigration(version))
            }
            State::LocateMigration(version) => {
                match self.repository.find_next_migration(version)? {
                    None => Ok(State::Finished(RunOutcome::UpToDate { pending: version })),
                    Some(migration) => {
                        tracing::info!(
                            version = migration.version.get(),
                            migration_path = %migration.path.display(),
                            "found migration"
                        );
                        Ok(match mode {
                            RunMode::Apply => State::Lock(migration),
                            RunMode::Local { .. } => State::DisableBackend(migration),
                        })
                    }
                }
            }
            State::Lock(migration) => {
                lock.acquire()?;
                Ok(State::PersistVersion(migration))
            }
            State::PersistVersion(migration) => {
                ledger.set_version(migration.version)?;
                Ok(State::Execute(migration))
            }
            State::DisableBackend(migration) => {
                self.backend.disable_or_skip(self.executor)?;
                Ok(State::Execute(migration))
            }
            State::Execute(migration) => {
                self.executor.run_migration(&migration.path)?;
                Ok(match mode {
                    RunMode::Apply => State::Unlock(migration),
                    RunMode::Local { .. } => State::Finished(RunOutcome::Applied(migration)),
                })
            }
            State::Unlock(migration) => {
                lock.release()?;
                Ok(State::Finished(RunOutcome::Applied(migration)))
            }
            State::Finished(outcome) => Ok(State::Finished(outcome)),
        }
    }
}
