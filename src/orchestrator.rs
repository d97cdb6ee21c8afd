//! The sequencing algorithm at the heart of baton.
//!
//! [`advance`] is the single entry point, designed to be invoked repeatedly
//! by an external scheduler. Each call performs at most one state-advancing
//! action — spawn the next role, wait, fail the run, or complete it — and
//! then returns. There are no internal retries and no blocking waits;
//! "waiting" is returning and expecting re-invocation later.
//!
//! Roles execute in strict roster order. Role N's output is role N+1's
//! input context, so there is no parallel execution: at most one role may
//! be running at a time, and finding two is treated as unrecoverable
//! corruption rather than something to repair.

use crate::agent::{AgentWorkspace, prepare_workspace};
use crate::context::RunContext;
use crate::error::{BatonError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::manifest::Manifest;
use crate::roster::{Role, Roster};
use crate::state::{FlowState, FlowStateMachine, RoleState};
use crate::validate::missing_outputs;
use chrono::Utc;
use serde_json::json;

/// What a single `advance` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The next pending role's workspace was prepared and a spawn request
    /// written.
    Spawned { role: String },
    /// A role is running; nothing to do this call.
    Waiting { role: String },
    /// Every role completed and validated; the flow is now COMPLETED.
    Completed,
    /// The flow was already in a terminal-capable state; no mutation.
    Idle { state: FlowState },
}

/// Advance a run by at most one state-advancing action.
///
/// Idempotent per call: with unchanged role statuses, repeated calls
/// observe the same manifest and perform no duplicate spawn.
pub fn advance(ctx: &RunContext, run_id: &str) -> Result<AdvanceOutcome> {
    let roster = Roster::load_or_builtin(ctx.roster_path())?;
    let mut manifest = Manifest::load(ctx, run_id)?;

    // Terminal-capable flow states are never mutated further here; the only
    // allowed move out of them is the explicit archive command.
    if matches!(
        manifest.flow_state,
        FlowState::Completed | FlowState::Failed | FlowState::Archived
    ) {
        return Ok(AdvanceOutcome::Idle {
            state: manifest.flow_state,
        });
    }

    // A current role the roster no longer defines means the roster changed
    // under a live run; halt rather than guess.
    if let Some(current) = &manifest.current_role
        && roster.find(current).is_none()
    {
        return Err(BatonError::RoleNotFound(current.clone()));
    }

    // Protocol invariant: at most one role running. Checked before any
    // mutation so a violation aborts with all persisted state unchanged.
    let running: Vec<String> = collect_running(ctx, run_id, &roster)?;
    if running.len() > 1 {
        return Err(BatonError::MultipleRolesRunning(running));
    }

    if manifest.flow_state == FlowState::Created {
        transition_flow(ctx, run_id, &mut manifest, FlowState::Pending)?;
        manifest.save(ctx)?;
    }

    for role in &roster.roles {
        let ws = AgentWorkspace::new(ctx, run_id, &role.id);
        let status = ws.load_status()?;

        match status.as_ref().map(|s| s.state) {
            Some(RoleState::Completed) => {
                let missing = missing_outputs(ctx, run_id, role)?;
                if !missing.is_empty() {
                    return fail_role(ctx, run_id, &mut manifest, role, missing);
                }
                // Validated; move on to the next role.
            }
            Some(RoleState::Failed) => {
                let reason = status
                    .as_ref()
                    .and_then(|s| s.error.clone())
                    .unwrap_or_else(|| "unknown error".to_string());
                fail_flow(ctx, run_id, &mut manifest)?;
                append_event(
                    ctx,
                    run_id,
                    &Event::new(EventAction::RoleFailed)
                        .with_role(&role.id)
                        .with_details(json!({"reason": reason})),
                )?;
                return Err(BatonError::UserError(format!(
                    "role '{}' failed: {}; run halted",
                    role.id, reason
                )));
            }
            Some(RoleState::Running) => {
                append_event(ctx, run_id, &Event::new(EventAction::Wait).with_role(&role.id))?;
                return Ok(AdvanceOutcome::Waiting {
                    role: role.id.clone(),
                });
            }
            Some(RoleState::Pending) | None => {
                // A pending role whose spawn request is already out is
                // "ready but not yet claimed": re-advancing must not
                // produce a duplicate spawn.
                let already_requested = manifest.current_role.as_deref() == Some(role.id.as_str())
                    && AgentWorkspace::new(ctx, run_id, &role.id)
                        .spawn_request_path()
                        .is_file();
                if already_requested {
                    append_event(
                        ctx,
                        run_id,
                        &Event::new(EventAction::Wait).with_role(&role.id),
                    )?;
                    return Ok(AdvanceOutcome::Waiting {
                        role: role.id.clone(),
                    });
                }
                return spawn_role(ctx, run_id, &mut manifest, role);
            }
        }
    }

    // Every role completed and validated.
    if manifest.flow_state == FlowState::Pending {
        // All roles finished without this orchestrator ever spawning; walk
        // the chain forward rather than skipping RUNNING.
        transition_flow(ctx, run_id, &mut manifest, FlowState::Running)?;
    }
    transition_flow(ctx, run_id, &mut manifest, FlowState::Completed)?;
    manifest.save(ctx)?;

    Ok(AdvanceOutcome::Completed)
}

/// Collect ids of all roles persisted as running.
fn collect_running(ctx: &RunContext, run_id: &str, roster: &Roster) -> Result<Vec<String>> {
    let mut running = Vec::new();
    for role in &roster.roles {
        let ws = AgentWorkspace::new(ctx, run_id, &role.id);
        if let Some(status) = ws.load_status()?
            && status.state == RoleState::Running
        {
            running.push(role.id.clone());
        }
    }
    Ok(running)
}

/// Spawn the next role: prepare its workspace, record it in the manifest,
/// and write the spawn request.
fn spawn_role(
    ctx: &RunContext,
    run_id: &str,
    manifest: &mut Manifest,
    role: &Role,
) -> Result<AdvanceOutcome> {
    let brief_path = ctx.run_dir(run_id).join(format!("brief-{}.md", role.id));
    let brief = std::fs::read_to_string(&brief_path).ok();

    prepare_workspace(ctx, run_id, role, brief.as_deref())?;

    let now = Utc::now();
    manifest.record_spawn(&role.id, now);
    if manifest.flow_state == FlowState::Pending {
        transition_flow(ctx, run_id, manifest, FlowState::Running)?;
    }
    manifest.save(ctx)?;

    append_event(
        ctx,
        run_id,
        &Event::new(EventAction::Spawn)
            .with_role(&role.id)
            .with_details(json!({"output": role.output})),
    )?;

    Ok(AdvanceOutcome::Spawned {
        role: role.id.clone(),
    })
}

/// Downgrade a role that claimed completion without its outputs, fail the
/// flow, and surface the missing outputs to the caller.
fn fail_role(
    ctx: &RunContext,
    run_id: &str,
    manifest: &mut Manifest,
    role: &Role,
    missing: Vec<String>,
) -> Result<AdvanceOutcome> {
    let ws = AgentWorkspace::new(ctx, run_id, &role.id);
    if let Some(mut status) = ws.load_status()? {
        status.force_fail(&format!("missing outputs: {}", missing.join(", ")), Utc::now());
        status.save(ws.status_path())?;
    }

    fail_flow(ctx, run_id, manifest)?;

    append_event(
        ctx,
        run_id,
        &Event::new(EventAction::RoleFailed)
            .with_role(&role.id)
            .with_details(json!({"missing": missing})),
    )?;

    Err(BatonError::MissingOutputs {
        role: role.id.clone(),
        missing,
    })
}

/// Move the flow to FAILED and persist, when the transition table allows it.
fn fail_flow(ctx: &RunContext, run_id: &str, manifest: &mut Manifest) -> Result<()> {
    if FlowStateMachine::new(manifest.flow_state).can_transition(FlowState::Failed) {
        transition_flow(ctx, run_id, manifest, FlowState::Failed)?;
        manifest.save(ctx)?;
    }
    Ok(())
}

/// Transition the in-memory manifest and log the move.
fn transition_flow(
    ctx: &RunContext,
    run_id: &str,
    manifest: &mut Manifest,
    target: FlowState,
) -> Result<()> {
    let from = manifest.flow_state;
    manifest.transition_flow(target)?;
    append_event(
        ctx,
        run_id,
        &Event::new(EventAction::FlowTransition)
            .with_details(json!({"from": from.to_string(), "to": target.to_string()})),
    )?;
    Ok(())
}
