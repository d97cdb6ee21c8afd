//! Command implementations for baton.
//!
//! The dispatcher routes parsed CLI commands to their handlers. Every
//! handler is thin I/O glue: resolve the context from `--root`, call into
//! the core modules, print the outcome.

mod advance;
mod approve;
mod archive;
mod create;
mod status;
mod watchdog_cmd;

use crate::cli::{Cli, Command};
use crate::context::RunContext;
use crate::error::Result;

/// Dispatch a parsed command to its implementation.
pub fn dispatch(cli: Cli) -> Result<()> {
    let ctx = RunContext::new(&cli.root);
    match cli.command {
        Command::CreateRun(args) => create::cmd_create_run(&ctx, args),
        Command::Advance(args) => advance::cmd_advance(&ctx, args),
        Command::Watchdog(args) => watchdog_cmd::cmd_watchdog(&ctx, args),
        Command::Approve(args) => approve::cmd_approve(&ctx, args),
        Command::Archive(args) => archive::cmd_archive(&ctx, args),
        Command::Status(args) => status::cmd_status(&ctx, args),
    }
}
