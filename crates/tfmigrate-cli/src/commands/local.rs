//! `local [VERSION]`: run a migration against a local copy of the state

use clap::Args;
use tfmigrate_core::{MigrationVersion, Result, RunMode};

use super::{report, Settings};

#[derive(Debug, Args)]
pub struct LocalArgs {
    /// Run this version instead of the next one recorded in CircleCI
    pub version: Option<u64>,
}

/// # Errors
///
/// Returns the error of the first failing stage.
pub fn execute(settings: &Settings, args: LocalArgs) -> Result<()> {
    let store = settings.store()?;
    let mode = RunMode::Local {
        version: args.version.map(MigrationVersion::new),
    };
    let outcome = settings.runner(&store).run(mode)?;
    report(&outcome);
    Ok(())
}
