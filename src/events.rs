//! Append-only event log for runs.
//!
//! Every state-advancing decision is recorded as one NDJSON line in the
//! run's `events.ndjson`. The log is the human-readable audit trail for a
//! run; nothing in the core reads it back to make decisions.
//!
//! Each event carries:
//! - `ts`: RFC3339 timestamp
//! - `action`: what happened (create, spawn, wait, ...)
//! - `actor`: `user@host` of the invoking process
//! - `role`: optional role id for role-scoped events
//! - `details`: freeform object with action-specific fields

use crate::context::RunContext;
use crate::error::{BatonError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;

/// Actions recorded in the run event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Run packet materialized.
    Create,
    /// Role workspace prepared and spawn request written.
    Spawn,
    /// A role is still running; the orchestrator returned without action.
    Wait,
    /// A role was marked failed (bad status, missing outputs, watchdog).
    RoleFailed,
    /// Flow state moved.
    FlowTransition,
    /// Watchdog sweep finding.
    Watchdog,
    /// Approval gate outcome.
    Approve,
    /// Run archived.
    Archive,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventAction::Create => "create",
            EventAction::Spawn => "spawn",
            EventAction::Wait => "wait",
            EventAction::RoleFailed => "role_failed",
            EventAction::FlowTransition => "flow_transition",
            EventAction::Watchdog => "watchdog",
            EventAction::Approve => "approve",
            EventAction::Archive => "archive",
        };
        write!(f, "{}", s)
    }
}

/// One record in the run event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// When the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: EventAction,

    /// Who performed the action (e.g. `scheduler@host`).
    pub actor: String,

    /// Role id for role-scoped events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Action-specific details.
    pub details: Value,
}

impl Event {
    /// Create a new event stamped with the current time and actor.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: actor_string(),
            role: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the role id for this event.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize to a single NDJSON line (no trailing newline).
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| BatonError::UserError(format!("failed to serialize event: {}", e)))
    }
}

/// `user@host` for event metadata.
fn actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    format!("{}@{}", user, host)
}

/// Append an event to a run's log, creating the file if needed.
///
/// Each append produces exactly one line and syncs to disk before
/// returning, so the log and the state records move together.
pub fn append_event(ctx: &RunContext, run_id: &str, event: &Event) -> Result<()> {
    let path = ctx.events_path(run_id);
    let line = event.to_ndjson_line()?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| {
            BatonError::UserError(format!(
                "failed to open event log '{}': {}",
                path.display(),
                e
            ))
        })?;

    writeln!(file, "{}", line).map_err(|e| {
        BatonError::UserError(format!(
            "failed to append to event log '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        BatonError::UserError(format!(
            "failed to sync event log '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Read all events from a run's log, oldest first.
///
/// A missing log is an empty list. Unparseable lines are skipped; the log
/// is an audit aid, not a source of truth.
pub fn read_events(ctx: &RunContext, run_id: &str) -> Result<Vec<Event>> {
    let path = ctx.events_path(run_id);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(&path).map_err(|e| {
        BatonError::UserError(format!(
            "failed to read event log '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(content
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}
