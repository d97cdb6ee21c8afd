//! Implementation of the `baton status` command.
//!
//! Read-only: prints the manifest, a per-role table in roster order, and
//! the tail of the event log.

use crate::agent::AgentWorkspace;
use crate::cli::StatusArgs;
use crate::config::Config;
use crate::context::{RunContext, validate_run_id};
use crate::error::Result;
use crate::events::read_events;
use crate::manifest::Manifest;
use crate::roster::Roster;
use crate::state::FlowStateMachine;

/// Execute `baton status`.
pub fn cmd_status(ctx: &RunContext, args: StatusArgs) -> Result<()> {
    let run_id = validate_run_id(&args.run_id)?;
    ctx.ensure_run_exists(run_id)?;

    let config = Config::load_or_default(ctx.config_path())?;
    let roster = Roster::load_or_builtin(ctx.roster_path())?;
    let manifest = Manifest::load(ctx, run_id)?;

    let terminal = if FlowStateMachine::new(manifest.flow_state).is_terminal() {
        " (terminal)"
    } else {
        ""
    };

    println!("Run {}", run_id);
    println!("  Flow state:   {}{}", manifest.flow_state, terminal);
    println!(
        "  Current role: {}",
        manifest.current_role.as_deref().unwrap_or("-")
    );
    println!(
        "  Last spawn:   {}",
        manifest
            .last_spawn
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!();

    println!("Roles:");
    for role in &roster.roles {
        let ws = AgentWorkspace::new(ctx, run_id, &role.id);
        match ws.load_status()? {
            None => println!("  {:12} not prepared", role.id),
            Some(status) => {
                let mut line = format!("  {:12} {}", role.id, status.state);
                if let Some(started) = &status.started {
                    line.push_str(&format!("  started {}", started));
                }
                if let Some(completed) = &status.completed {
                    line.push_str(&format!("  finished {}", completed));
                }
                println!("{}", line);
                if let Some(error) = &status.error {
                    println!("  {:12}   error: {}", "", error);
                }
            }
        }
    }

    let events = read_events(ctx, run_id)?;
    if !events.is_empty() && config.status_event_tail > 0 {
        println!();
        println!("Recent events:");
        let skip = events.len().saturating_sub(config.status_event_tail);
        for event in &events[skip..] {
            let role = event
                .role
                .as_deref()
                .map(|r| format!(" [{}]", r))
                .unwrap_or_default();
            println!(
                "  {} {}{}",
                event.ts.format("%Y-%m-%d %H:%M:%S"),
                event.action,
                role
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{AdvanceArgs, CreateRunArgs};
    use crate::commands::advance::cmd_advance;
    use crate::commands::create::cmd_create_run;
    use tempfile::TempDir;

    const RUN_ID: &str = "run-20260807-101500";

    fn created_run() -> (TempDir, RunContext) {
        let dir = TempDir::new().unwrap();
        let ctx = RunContext::new(dir.path());
        cmd_create_run(
            &ctx,
            CreateRunArgs {
                objective: "Ship it".to_string(),
                criteria: vec![],
                scope: "svc".to_string(),
                run_id: Some(RUN_ID.to_string()),
            },
        )
        .unwrap();
        (dir, ctx)
    }

    #[test]
    fn status_of_fresh_run() {
        let (_dir, ctx) = created_run();
        cmd_status(
            &ctx,
            StatusArgs {
                run_id: RUN_ID.to_string(),
            },
        )
        .unwrap();
    }

    #[test]
    fn status_after_advance() {
        let (_dir, ctx) = created_run();
        cmd_advance(
            &ctx,
            AdvanceArgs {
                run_id: RUN_ID.to_string(),
            },
        )
        .unwrap();

        cmd_status(
            &ctx,
            StatusArgs {
                run_id: RUN_ID.to_string(),
            },
        )
        .unwrap();
    }

    #[test]
    fn status_is_read_only() {
        let (_dir, ctx) = created_run();

        let before = std::fs::read_to_string(ctx.manifest_path(RUN_ID)).unwrap();
        cmd_status(
            &ctx,
            StatusArgs {
                run_id: RUN_ID.to_string(),
            },
        )
        .unwrap();
        let after = std::fs::read_to_string(ctx.manifest_path(RUN_ID)).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn rejects_missing_run() {
        let dir = TempDir::new().unwrap();
        let ctx = RunContext::new(dir.path());
        assert!(
            cmd_status(
                &ctx,
                StatusArgs {
                    run_id: RUN_ID.to_string(),
                },
            )
            .is_err()
        );
    }
}
