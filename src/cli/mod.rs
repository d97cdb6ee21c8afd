//! CLI argument parsing for baton.
//!
//! Uses clap derive macros for declarative argument definitions. This
//! module defines the command structure; implementations live in the
//! `commands` module.
//!
//! Every command takes `--root`, the directory holding all baton state.
//! There is no ambient discovery: the external scheduler that invokes
//! baton decides where state lives.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Baton: minimal file-based run orchestrator for sequential role pipelines.
///
/// A run is an ordered sequence of roles, each executed by an external
/// worker. Baton prepares each role's inbox, observes its status record,
/// and advances the run one step per invocation.
#[derive(Parser, Debug)]
#[command(name = "baton")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Root directory for baton state (roster, runs, agent workspaces).
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for baton.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Materialize a new run packet.
    ///
    /// Writes RUN.md, per-role briefs, output placeholders, the checklist,
    /// and the initial manifest. The only non-idempotent command.
    CreateRun(CreateRunArgs),

    /// Advance a run by at most one step.
    ///
    /// Spawns the next pending role, waits on a running one, fails the run
    /// on a bad role, or marks it completed. Safe to invoke repeatedly.
    Advance(AdvanceArgs),

    /// Fail roles stuck in running past the stale timeout.
    Watchdog(WatchdogArgs),

    /// Check a completed run's required artifacts and tick the checklist.
    Approve(ApproveArgs),

    /// Archive a completed or failed run.
    Archive(ArchiveArgs),

    /// Show a run's manifest, role states, and recent events.
    Status(StatusArgs),
}

/// Arguments for the `create-run` command.
#[derive(Parser, Debug)]
pub struct CreateRunArgs {
    /// What this run is trying to achieve.
    #[arg(long)]
    pub objective: String,

    /// Acceptance criterion; repeat for several.
    #[arg(long = "criterion")]
    pub criteria: Vec<String>,

    /// Scope statement included in every brief.
    #[arg(long, default_value = "Project scope")]
    pub scope: String,

    /// Explicit run id (default: generated from the current time).
    #[arg(long)]
    pub run_id: Option<String>,
}

/// Arguments for the `advance` command.
#[derive(Parser, Debug)]
pub struct AdvanceArgs {
    /// Run id to advance.
    pub run_id: String,
}

/// Arguments for the `watchdog` command.
#[derive(Parser, Debug)]
pub struct WatchdogArgs {
    /// Run id to sweep.
    pub run_id: String,

    /// Stale timeout in seconds (default: config `stale_timeout_secs`).
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Arguments for the `approve` command.
#[derive(Parser, Debug)]
pub struct ApproveArgs {
    /// Run id to approve.
    pub run_id: String,
}

/// Arguments for the `archive` command.
#[derive(Parser, Debug)]
pub struct ArchiveArgs {
    /// Run id to archive.
    pub run_id: String,
}

/// Arguments for the `status` command.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Run id to show.
    pub run_id: String,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
