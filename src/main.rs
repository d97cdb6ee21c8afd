//! Baton: minimal file-based run orchestrator for sequential role pipelines.
//!
//! This is the main entry point for the `baton` CLI. It parses arguments,
//! dispatches to the appropriate command handler, and handles errors with
//! proper exit codes.

mod agent;
mod approval;
mod cli;
mod commands;
mod config;
mod context;
mod error;
mod events;
mod exit_codes;
mod fs;
mod manifest;
mod orchestrator;
mod packet;
mod roster;
mod state;
mod validate;
mod watchdog;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match commands::dispatch(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
