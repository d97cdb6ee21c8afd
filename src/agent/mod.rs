//! Agent workspace protocol.
//!
//! Each role of a run gets a workspace under `agents/<run-id>/<role>/` with
//! three channels:
//!
//! - `inbox/` — written by the orchestrator: instructions, the full worker
//!   prompt, and a `spawn_request.json` descriptor.
//! - `outbox/` — written by the external worker: `summary.md`.
//! - `workspace/` — scratch area owned by the worker.
//!
//! `status.json` next to the channels is the role's durable status record.
//! The orchestrator writes it exactly once per role (state `pending`, just
//! before the spawn request); the external runtime owns the
//! pending -> running -> completed/failed edges. The orchestrator only ever
//! observes those transitions, it never causes them — with one exception:
//! the completion validator may downgrade a claimed `completed` to `failed`.

pub mod template;

use crate::context::RunContext;
use crate::error::{BatonError, Result};
use crate::fs::atomic_write_file;
use crate::roster::Role;
use crate::state::{RoleState, RoleStateMachine};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Durable status record for one role of one run.
///
/// `started` and `completed` are kept as raw strings: the running and
/// terminal edges are written by an external process, and the watchdog must
/// treat an unparseable timestamp as a finding rather than refuse to load
/// the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleStatus {
    /// Current role state.
    pub state: RoleState,

    /// RFC3339 timestamp set when the role started running.
    pub started: Option<String>,

    /// RFC3339 timestamp set when the role reached a terminal state.
    pub completed: Option<String>,

    /// Error message for failed roles.
    pub error: Option<String>,

    /// Role id, for human inspection of the record.
    pub role: String,

    /// Run id, for human inspection of the record.
    pub run_id: String,
}

impl RoleStatus {
    /// Fresh pending status for a role.
    pub fn new(role_id: &str, run_id: &str) -> Self {
        Self {
            state: RoleState::Pending,
            started: None,
            completed: None,
            error: None,
            role: role_id.to_string(),
            run_id: run_id.to_string(),
        }
    }

    /// Load a status record from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BatonError::UserError(format!(
                "failed to read status record '{}': {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            BatonError::UserError(format!(
                "failed to parse status record '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Atomically save the status record.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            BatonError::UserError(format!("failed to serialize status record: {}", e))
        })?;
        atomic_write_file(path, &content)
    }

    /// Move the role state forward, enforcing the transition table and
    /// stamping `started`/`completed` as the original protocol does.
    pub fn transition(&mut self, target: RoleState, at: DateTime<Utc>) -> Result<()> {
        let mut fsm = RoleStateMachine::new(self.state);
        fsm.transition(target)?;
        self.state = fsm.state();

        let stamp = at.to_rfc3339_opts(SecondsFormat::Secs, true);
        match target {
            RoleState::Running => self.started = Some(stamp),
            RoleState::Completed | RoleState::Failed => self.completed = Some(stamp),
            RoleState::Pending => {}
        }
        Ok(())
    }

    /// Force the record to `failed` regardless of current state.
    ///
    /// The completion validator uses this to downgrade a role that claimed
    /// `completed` without its artifacts; the downgrade is deliberately
    /// outside the forward-only transition table.
    pub fn force_fail(&mut self, reason: &str, at: DateTime<Utc>) {
        self.state = RoleState::Failed;
        self.error = Some(reason.to_string());
        self.completed = Some(at.to_rfc3339_opts(SecondsFormat::Secs, true));
    }
}

/// One-shot descriptor signaling a role is ready for external execution.
///
/// Advisory: an external scheduler is responsible for honoring it. All
/// paths are absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Role to execute.
    pub role: String,

    /// Run the role belongs to.
    pub run_id: String,

    /// Worker-owned scratch directory.
    pub workspace: PathBuf,

    /// Full prompt text for the external worker.
    pub prompt: String,

    /// Status record the worker must update.
    pub status_path: PathBuf,

    /// Outbox summary the worker must write.
    pub summary_path: PathBuf,

    /// Required output artifact the worker must produce.
    pub output_path: PathBuf,
}

/// Resolved paths for one role's agent workspace.
#[derive(Debug, Clone)]
pub struct AgentWorkspace {
    pub run_id: String,
    pub role_id: String,
    base: PathBuf,
}

impl AgentWorkspace {
    /// Resolve the workspace paths for a role.
    pub fn new(ctx: &RunContext, run_id: &str, role_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            role_id: role_id.to_string(),
            base: ctx.agent_dir(run_id, role_id),
        }
    }

    pub fn inbox_dir(&self) -> PathBuf {
        self.base.join("inbox")
    }

    pub fn outbox_dir(&self) -> PathBuf {
        self.base.join("outbox")
    }

    pub fn workspace_dir(&self) -> PathBuf {
        self.base.join("workspace")
    }

    pub fn status_path(&self) -> PathBuf {
        self.base.join("status.json")
    }

    pub fn instructions_path(&self) -> PathBuf {
        self.inbox_dir().join("instructions.md")
    }

    pub fn prompt_path(&self) -> PathBuf {
        self.inbox_dir().join("prompt.md")
    }

    pub fn spawn_request_path(&self) -> PathBuf {
        self.inbox_dir().join("spawn_request.json")
    }

    pub fn summary_path(&self) -> PathBuf {
        self.outbox_dir().join("summary.md")
    }

    /// Create the inbox/outbox/workspace channel directories.
    ///
    /// Idempotent: existing directories and their contents are untouched.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.inbox_dir(), self.outbox_dir(), self.workspace_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                BatonError::UserError(format!(
                    "failed to create workspace directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Load this role's status record, or `None` when it was never prepared.
    pub fn load_status(&self) -> Result<Option<RoleStatus>> {
        let path = self.status_path();
        if !path.exists() {
            return Ok(None);
        }
        RoleStatus::load(&path).map(Some)
    }
}

const INSTRUCTIONS_TEMPLATE: &str = "\
# Task: {{role}}

## Objective
Write the role output for this run.

## Responsibilities
{{responsibilities}}

## Run packet
{{run_dir}}

## Output file
{{output_path}}

## Requirements
- Read RUN.md and the acceptance criteria
- Only touch files in scope described in RUN.md
- Write your deliverable to the output file above
- Write a short summary to outbox/summary.md
- Update status.json to state=completed when done
";

/// Prepare a role's workspace for external execution.
///
/// Creates the channel directories, writes the instructions document and
/// full worker prompt, sets the status record to `pending` (only when no
/// record exists yet — re-preparation must never clobber an external
/// writer's progress), and finally writes the spawn request descriptor.
///
/// Returns the written [`SpawnRequest`].
pub fn prepare_workspace(
    ctx: &RunContext,
    run_id: &str,
    role: &Role,
    brief: Option<&str>,
) -> Result<SpawnRequest> {
    let ws = AgentWorkspace::new(ctx, run_id, &role.id);
    ws.ensure_dirs()?;

    let run_dir = ctx.run_dir(run_id);
    let output_path = run_dir.join(&role.output);

    let vars = template::vars([
        ("role", role.id.as_str()),
        ("responsibilities", role.responsibilities.as_str()),
        ("run_dir", &run_dir.display().to_string()),
        ("output_path", &output_path.display().to_string()),
    ]);
    let instructions = template::render(INSTRUCTIONS_TEMPLATE, &vars)?;
    atomic_write_file(ws.instructions_path(), &instructions)?;

    // The prompt is the instructions plus the role brief from the run packet.
    let mut prompt = instructions;
    if let Some(brief) = brief {
        prompt.push('\n');
        prompt.push_str(brief);
    }
    atomic_write_file(ws.prompt_path(), &prompt)?;

    // Pending status models "ready for execution but not yet claimed". An
    // existing record belongs to the external runtime; leave it alone.
    if ws.load_status()?.is_none() {
        RoleStatus::new(&role.id, run_id).save(ws.status_path())?;
    }

    let request = SpawnRequest {
        role: role.id.clone(),
        run_id: run_id.to_string(),
        workspace: ws.workspace_dir(),
        prompt,
        status_path: ws.status_path(),
        summary_path: ws.summary_path(),
        output_path,
    };
    let content = serde_json::to_string_pretty(&request).map_err(|e| {
        BatonError::UserError(format!("failed to serialize spawn request: {}", e))
    })?;
    atomic_write_file(ws.spawn_request_path(), &content)?;

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RUN_ID: &str = "run-20260807-101500";

    fn test_role() -> Role {
        Role {
            id: "architect".to_string(),
            responsibilities: "Define architecture changes.".to_string(),
            output: "01-architecture.md".to_string(),
        }
    }

    fn test_context() -> (TempDir, RunContext) {
        let dir = TempDir::new().unwrap();
        let ctx = RunContext::new(dir.path());
        std::fs::create_dir_all(ctx.run_dir(RUN_ID)).unwrap();
        (dir, ctx)
    }

    #[test]
    fn new_status_is_pending() {
        let status = RoleStatus::new("architect", RUN_ID);
        assert_eq!(status.state, RoleState::Pending);
        assert!(status.started.is_none());
        assert!(status.completed.is_none());
        assert!(status.error.is_none());
        assert_eq!(status.role, "architect");
        assert_eq!(status.run_id, RUN_ID);
    }

    #[test]
    fn status_roundtrip() {
        let (_dir, ctx) = test_context();
        let ws = AgentWorkspace::new(&ctx, RUN_ID, "architect");
        ws.ensure_dirs().unwrap();

        let mut status = RoleStatus::new("architect", RUN_ID);
        status.transition(RoleState::Running, Utc::now()).unwrap();
        status.save(ws.status_path()).unwrap();

        let loaded = RoleStatus::load(ws.status_path()).unwrap();
        assert_eq!(loaded.state, RoleState::Running);
        assert!(loaded.started.is_some());
    }

    #[test]
    fn transition_stamps_timestamps() {
        let mut status = RoleStatus::new("qa", RUN_ID);
        let now = Utc::now();

        status.transition(RoleState::Running, now).unwrap();
        assert!(status.started.is_some());
        assert!(status.completed.is_none());

        status.transition(RoleState::Completed, now).unwrap();
        assert!(status.completed.is_some());
    }

    #[test]
    fn transition_enforces_table() {
        let mut status = RoleStatus::new("qa", RUN_ID);
        let err = status
            .transition(RoleState::Completed, Utc::now())
            .unwrap_err();
        assert!(matches!(err, BatonError::InvalidTransition { .. }));
        assert_eq!(status.state, RoleState::Pending);
    }

    #[test]
    fn force_fail_downgrades_completed() {
        let mut status = RoleStatus::new("qa", RUN_ID);
        let now = Utc::now();
        status.transition(RoleState::Running, now).unwrap();
        status.transition(RoleState::Completed, now).unwrap();

        status.force_fail("missing outputs: 04-qa-report.md", now);

        assert_eq!(status.state, RoleState::Failed);
        assert_eq!(
            status.error.as_deref(),
            Some("missing outputs: 04-qa-report.md")
        );
    }

    #[test]
    fn prepare_creates_channels_and_documents() {
        let (_dir, ctx) = test_context();
        let role = test_role();

        let request = prepare_workspace(&ctx, RUN_ID, &role, None).unwrap();

        let ws = AgentWorkspace::new(&ctx, RUN_ID, "architect");
        assert!(ws.inbox_dir().is_dir());
        assert!(ws.outbox_dir().is_dir());
        assert!(ws.workspace_dir().is_dir());

        let instructions = std::fs::read_to_string(ws.instructions_path()).unwrap();
        assert!(instructions.contains("# Task: architect"));
        assert!(instructions.contains("01-architecture.md"));
        assert!(instructions.contains("Define architecture changes."));

        let status = ws.load_status().unwrap().unwrap();
        assert_eq!(status.state, RoleState::Pending);

        assert_eq!(request.role, "architect");
        assert!(request.output_path.ends_with("01-architecture.md"));
        assert!(ws.spawn_request_path().is_file());
    }

    #[test]
    fn prepare_embeds_brief_in_prompt() {
        let (_dir, ctx) = test_context();
        let role = test_role();

        prepare_workspace(&ctx, RUN_ID, &role, Some("## Brief\nShip the thing.")).unwrap();

        let ws = AgentWorkspace::new(&ctx, RUN_ID, "architect");
        let prompt = std::fs::read_to_string(ws.prompt_path()).unwrap();
        assert!(prompt.contains("# Task: architect"));
        assert!(prompt.contains("Ship the thing."));
    }

    #[test]
    fn prepare_is_idempotent_for_status() {
        let (_dir, ctx) = test_context();
        let role = test_role();
        let ws = AgentWorkspace::new(&ctx, RUN_ID, "architect");

        prepare_workspace(&ctx, RUN_ID, &role, None).unwrap();

        // Simulate the external runtime making progress.
        let mut status = ws.load_status().unwrap().unwrap();
        status.transition(RoleState::Running, Utc::now()).unwrap();
        status.save(ws.status_path()).unwrap();

        // Re-preparation must not clobber it.
        prepare_workspace(&ctx, RUN_ID, &role, None).unwrap();
        let status = ws.load_status().unwrap().unwrap();
        assert_eq!(status.state, RoleState::Running);
    }

    #[test]
    fn load_status_missing_is_none() {
        let (_dir, ctx) = test_context();
        let ws = AgentWorkspace::new(&ctx, RUN_ID, "architect");
        assert!(ws.load_status().unwrap().is_none());
    }

    #[test]
    fn spawn_request_serializes_all_paths() {
        let (_dir, ctx) = test_context();
        let role = test_role();

        prepare_workspace(&ctx, RUN_ID, &role, None).unwrap();

        let ws = AgentWorkspace::new(&ctx, RUN_ID, "architect");
        let content = std::fs::read_to_string(ws.spawn_request_path()).unwrap();
        let request: SpawnRequest = serde_json::from_str(&content).unwrap();
        assert_eq!(request.run_id, RUN_ID);
        assert!(request.status_path.ends_with("status.json"));
        assert!(request.summary_path.ends_with("summary.md"));
        assert!(request.prompt.contains("# Task: architect"));
    }
}
