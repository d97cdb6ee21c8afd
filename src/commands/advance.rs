//! Implementation of the `baton advance` command.

use crate::cli::AdvanceArgs;
use crate::context::{RunContext, validate_run_id};
use crate::error::Result;
use crate::orchestrator::{AdvanceOutcome, advance};

/// Execute `baton advance`.
pub fn cmd_advance(ctx: &RunContext, args: AdvanceArgs) -> Result<()> {
    let run_id = validate_run_id(&args.run_id)?;
    ctx.ensure_run_exists(run_id)?;

    match advance(ctx, run_id)? {
        AdvanceOutcome::Spawned { role } => {
            println!("Spawned role '{}' for {}", role, run_id);
            println!(
                "  Spawn request: {}",
                ctx.agent_dir(run_id, &role).join("inbox").display()
            );
        }
        AdvanceOutcome::Waiting { role } => {
            println!("Waiting on role '{}' for {}", role, run_id);
        }
        AdvanceOutcome::Completed => {
            println!("All roles completed; run {} is COMPLETED", run_id);
            println!("Next: baton approve {}", run_id);
        }
        AdvanceOutcome::Idle { state } => {
            println!("Run {} is {}; nothing to advance", run_id, state);
        }
    }

    Ok(())
}
