//! Implementation of the `baton archive` command.
//!
//! Archiving is the only move out of COMPLETED or FAILED and finalizes the
//! run; an ARCHIVED run is never mutated again.

use crate::cli::ArchiveArgs;
use crate::context::{RunContext, validate_run_id};
use crate::error::Result;
use crate::events::{Event, EventAction, append_event};
use crate::manifest::Manifest;
use crate::state::FlowState;
use serde_json::json;

/// Execute `baton archive`.
pub fn cmd_archive(ctx: &RunContext, args: ArchiveArgs) -> Result<()> {
    let run_id = validate_run_id(&args.run_id)?;
    ctx.ensure_run_exists(run_id)?;

    let mut manifest = Manifest::load(ctx, run_id)?;
    let from = manifest.flow_state;
    manifest.transition_flow(FlowState::Archived)?;
    manifest.save(ctx)?;

    append_event(
        ctx,
        run_id,
        &Event::new(EventAction::Archive).with_details(json!({"from": from.to_string()})),
    )?;

    println!("Archived run {} (was {})", run_id, from);

    Ok(())
}
