//! Implementation of the `baton watchdog` command.
//!
//! Findings fail the affected roles and are reported on stdout, but the
//! command itself succeeds; only a later `advance` turns a failed role
//! into a failed run.

use crate::cli::WatchdogArgs;
use crate::config::Config;
use crate::context::{RunContext, validate_run_id};
use crate::error::Result;
use crate::roster::Roster;
use crate::watchdog::sweep;
use chrono::{Duration, Utc};

/// Execute `baton watchdog`.
pub fn cmd_watchdog(ctx: &RunContext, args: WatchdogArgs) -> Result<()> {
    let run_id = validate_run_id(&args.run_id)?;
    ctx.ensure_run_exists(run_id)?;

    let config = Config::load_or_default(ctx.config_path())?;
    let timeout_secs = args.timeout_secs.unwrap_or(config.stale_timeout_secs);
    let roster = Roster::load_or_builtin(ctx.roster_path())?;

    let findings = sweep(
        ctx,
        run_id,
        &roster,
        Duration::seconds(timeout_secs as i64),
        Utc::now(),
    )?;

    if findings.is_empty() {
        println!("No stuck roles in {} (timeout {}s)", run_id, timeout_secs);
    } else {
        println!("Failed {} stuck role(s) in {}:", findings.len(), run_id);
        for finding in &findings {
            println!("  - {}: {}", finding.role, finding.reason);
        }
    }

    Ok(())
}
