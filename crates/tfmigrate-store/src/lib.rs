//! tfmigrate store - the CircleCI project environment as a keyed store
//!
//! Provides:
//! - [`CircleCiStore`], a blocking HTTP client implementing `KeyedStore`
//! - Error helpers mapping HTTP answers onto `MigrateError`

pub mod circleci;
pub mod errors;

// Re-export key types
pub use circleci::CircleCiStore;
pub use errors::Result;
