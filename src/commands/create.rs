//! Implementation of the `baton create-run` command.

use crate::cli::CreateRunArgs;
use crate::config::Config;
use crate::context::RunContext;
use crate::error::Result;
use crate::packet::{CreateRun, create_run};
use chrono::Utc;

/// Execute `baton create-run`.
pub fn cmd_create_run(ctx: &RunContext, args: CreateRunArgs) -> Result<()> {
    let config = Config::load_or_default(ctx.config_path())?;

    let params = CreateRun {
        objective: args.objective,
        criteria: args.criteria,
        scope: args.scope,
        run_id: args.run_id,
    };

    let run_id = create_run(ctx, &config, &params, Utc::now())?;

    println!("Created run {}", run_id);
    println!("  Packet: {}", ctx.run_dir(&run_id).display());
    println!();
    println!("Next: baton advance {} --root {}", run_id, ctx.root.display());

    Ok(())
}
