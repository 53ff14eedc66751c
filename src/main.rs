//! Opentrons bio-art simulator CLI
//!
//! Renders pipetting protocols as images.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use bioart_sim::cli::{commands, Cli};
use bioart_sim::BioartError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logger
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("Opentrons bio-art simulator v{}", env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            // BioartError messages already embed their cause
            if let Some(cause) = err.downcast_ref::<BioartError>() {
                eprintln!("  Caused by: {}", cause);
                if let Some(suggestion) = cause.recovery_suggestion() {
                    eprintln!("  Hint: {}", suggestion);
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    commands::run(cli).with_context(|| format!("Simulation of {} failed", cli.protocol.display()))
}
