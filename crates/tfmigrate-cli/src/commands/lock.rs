//! `init` and `force-unlock`

use tfmigrate_core::lock::InitOutcome;
use tfmigrate_core::{LockManager, Result};

use super::Settings;

/// Publish the first lock generation unless one is already visible
///
/// # Errors
///
/// Returns `UnlockFailed` if the lock could not be published.
pub fn init(settings: &Settings) -> Result<()> {
    let store = settings.store()?;
    let lock = LockManager::new(&settings.snapshot, &store);
    match lock.initialize()? {
        InitOutcome::AlreadyInitialized => {}
        InitOutcome::Released(_) => {
            tracing::info!(lock_key = %lock.key(), "lock initialized");
        }
    }
    Ok(())
}

/// Publish a fresh lock generation regardless of the current state
///
/// # Errors
///
/// Returns `UnlockFailed` if the lock could not be published.
pub fn force_unlock(settings: &Settings) -> Result<()> {
    let store = settings.store()?;
    LockManager::new(&settings.snapshot, &store).release()?;
    Ok(())
}
