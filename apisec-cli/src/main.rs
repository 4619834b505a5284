//! apisec: keep an API-protection inventory in sync with discovered APIs.
//!
//! # Usage
//!
//! ```text
//! apisec run [-p <file> | -c <json>] [--dry-run]
//! apisec validate [-p <file> | -c <json>]
//! apisec example-config
//! ```

mod commands;
mod logging;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::{run::RunArgs, validate::ValidateArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "apisec",
    version,
    about = "Synchronize protected APIs with the specifications your providers publish",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile the protected inventory with every enabled provider.
    Run(RunArgs),

    /// Load and validate the configuration without contacting anything.
    Validate(ValidateArgs),

    /// Print an example configuration.
    ExampleConfig,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Validate(args) => args.run(),
        Commands::ExampleConfig => commands::example_config::run(),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
