//! tfmigrate CLI
//!
//! Runs numbered Terraform migration scripts, one per CI job

use clap::{Parser, Subcommand};
use tfmigrate_core::logging_facility::{self, Profile};
use tfmigrate_core::EnvSnapshot;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "tfmigrate")]
#[command(about = "tfmigrate - Sequenced Terraform state migrations for CircleCI", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(flatten)]
    global: commands::GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Set up the lock in CircleCI (requires CIRCLE_TOKEN)
    Init,
    /// Run the next migration against a local copy of the Terraform state
    Local(commands::local::LocalArgs),
    /// Run the next migration under the lock and record it
    Apply,
    /// Release the lock in CircleCI (requires CIRCLE_TOKEN)
    ForceUnlock,
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // help and version requests go to stdout and succeed
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    logging_facility::init(if cli.global.log_json {
        Profile::Production
    } else {
        Profile::Development
    });

    let settings = commands::Settings::resolve(cli.global, EnvSnapshot::from_env());

    let result = match cli.command {
        Commands::Init => commands::lock::init(&settings),
        Commands::Local(args) => commands::local::execute(&settings, args),
        Commands::Apply => commands::apply::execute(&settings),
        Commands::ForceUnlock => commands::lock::force_unlock(&settings),
    };

    if let Err(e) = result {
        eprintln!("command failed: {}", e);
        std::process::exit(1);
    }
}
