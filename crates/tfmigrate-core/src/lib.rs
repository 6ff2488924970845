//! tfmigrate core - sequencing Terraform migrations across CI runs
//!
//! This crate provides:
//! - The advisory lock protocol over a store without compare-and-swap
//! - The version ledger and migration repository
//! - The runner state machine for `apply` and `local` runs
//! - Error and logging facilities shared by the store client and the CLI
//!
//! Remote I/O is reached only through [`store::KeyedStore`]; the process
//! environment only through [`snapshot::EnvSnapshot`].

pub mod backend;
pub mod config;
pub mod errors;
pub mod executor;
pub mod ledger;
pub mod lock;
pub mod logging_facility;
pub mod repository;
pub mod runner;
pub mod snapshot;
pub mod store;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, MigrateError, Result};
pub use ledger::{MigrationVersion, VersionLedger};
pub use lock::{LockKey, LockManager, LockToken};
pub use repository::{Migration, MigrationRepository};
pub use runner::{RunMode, RunOutcome, Runner};
pub use snapshot::EnvSnapshot;
pub use store::{DeleteOutcome, KeyedStore, MemoryStore};
