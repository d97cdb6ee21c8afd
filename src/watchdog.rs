//! Watchdog sweep for stuck roles.
//!
//! The watchdog is the only component permitted to fail a role purely on
//! the passage of time. It scans every roster role whose persisted state is
//! `running` and fails those whose `started` timestamp is missing,
//! unparseable, or older than the stale timeout.
//!
//! Findings are recorded (status flip plus event) and returned to the
//! caller; they never raise. Roles below the timeout are left untouched.

use crate::agent::AgentWorkspace;
use crate::context::RunContext;
use crate::error::Result;
use crate::events::{Event, EventAction, append_event};
use crate::roster::Roster;
use crate::state::RoleState;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

/// Why the watchdog failed a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindingReason {
    /// The status record has no `started` timestamp.
    MissingTimestamp,
    /// The `started` timestamp could not be parsed as RFC3339.
    InvalidTimestamp { value: String },
    /// The role has been running longer than the stale timeout.
    StaleRunning { elapsed_secs: i64 },
}

impl std::fmt::Display for FindingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FindingReason::MissingTimestamp => write!(f, "missing started timestamp"),
            FindingReason::InvalidTimestamp { value } => {
                write!(f, "invalid started timestamp '{}'", value)
            }
            FindingReason::StaleRunning { elapsed_secs } => {
                write!(f, "stale running for {}s", elapsed_secs)
            }
        }
    }
}

/// One role failed by the sweep.
#[derive(Debug, Clone)]
pub struct Finding {
    /// The failed role.
    pub role: String,
    /// Why it was failed.
    pub reason: FindingReason,
}

/// Sweep all running roles of a run, failing the stuck ones.
///
/// Returns the findings; an empty list means every running role is healthy.
pub fn sweep(
    ctx: &RunContext,
    run_id: &str,
    roster: &Roster,
    timeout: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    for role in &roster.roles {
        let ws = AgentWorkspace::new(ctx, run_id, &role.id);
        let Some(mut status) = ws.load_status()? else {
            continue;
        };
        if status.state != RoleState::Running {
            continue;
        }

        let reason = match status.started.as_deref() {
            None => Some(FindingReason::MissingTimestamp),
            Some(raw) => match DateTime::parse_from_rfc3339(raw) {
                Err(_) => Some(FindingReason::InvalidTimestamp {
                    value: raw.to_string(),
                }),
                Ok(started) => {
                    let elapsed = now.signed_duration_since(started.with_timezone(&Utc));
                    if elapsed > timeout {
                        Some(FindingReason::StaleRunning {
                            elapsed_secs: elapsed.num_seconds(),
                        })
                    } else {
                        None
                    }
                }
            },
        };

        let Some(reason) = reason else {
            continue;
        };

        status.transition(RoleState::Failed, now)?;
        status.error = Some(format!("watchdog: {}", reason));
        status.save(ws.status_path())?;

        append_event(
            ctx,
            run_id,
            &Event::new(EventAction::Watchdog)
                .with_role(&role.id)
                .with_details(json!({"reason": reason.to_string()})),
        )?;

        findings.push(Finding {
            role: role.id.clone(),
            reason,
        });
    }

    Ok(findings)
}
