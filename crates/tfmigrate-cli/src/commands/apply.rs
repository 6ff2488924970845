//! `apply`: run the next migration under the lock

use tfmigrate_core::{Result, RunMode};

use super::{report, Settings};

/// # Errors
///
/// Returns the error of the first failing stage. A lock acquired before a
/// failing script stays held.
pub fn execute(settings: &Settings) -> Result<()> {
    let store = settings.store()?;
    let outcome = settings.runner(&store).run(RunMode::Apply)?;
    report(&outcome);
    Ok(())
}
