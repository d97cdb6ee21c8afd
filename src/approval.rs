//! Approval gate: the terminal check that a run is releasable.
//!
//! Given a run whose flow state is COMPLETED, verify that every artifact
//! required by the roster's approval policy exists in the run directory.
//! Entries are file names or glob patterns. When all are present the run's
//! CHECKLIST.md is rewritten with every box ticked — all-or-nothing,
//! partial satisfaction is not representable.
//!
//! A failed gate is reported to the caller; it never touches flow state.

use crate::context::RunContext;
use crate::error::{BatonError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::fs::atomic_write_file;
use crate::manifest::Manifest;
use crate::roster::Roster;
use crate::state::FlowState;
use globset::Glob;
use serde_json::json;

/// Outcome of an approval gate check.
#[derive(Debug, Clone)]
pub struct ApprovalReport {
    /// The policy entries that were checked.
    pub required: Vec<String>,
    /// Entries with no matching file in the run directory.
    pub missing: Vec<String>,
}

impl ApprovalReport {
    /// True when every required artifact is present.
    pub fn satisfied(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Run the approval gate for a completed run.
///
/// On success the checklist is ticked and an approve event logged. A gate
/// with missing artifacts returns the report without mutating anything
/// beyond the event log.
pub fn approve(ctx: &RunContext, run_id: &str) -> Result<ApprovalReport> {
    let manifest = Manifest::load(ctx, run_id)?;
    if manifest.flow_state != FlowState::Completed {
        return Err(BatonError::UserError(format!(
            "run '{}' is {}; approval requires a completed run",
            run_id, manifest.flow_state
        )));
    }

    let roster = Roster::load_or_builtin(ctx.roster_path())?;
    let required = roster.required_artifacts();
    let report = check_artifacts(ctx, run_id, &required)?;

    append_event(
        ctx,
        run_id,
        &Event::new(EventAction::Approve)
            .with_details(json!({"satisfied": report.satisfied(), "missing": report.missing})),
    )?;

    if report.satisfied() {
        tick_checklist(ctx, run_id)?;
    }

    Ok(report)
}

/// Match every policy entry against the files in the run directory.
fn check_artifacts(ctx: &RunContext, run_id: &str, required: &[String]) -> Result<ApprovalReport> {
    let run_dir = ctx.run_dir(run_id);
    let entries = std::fs::read_dir(&run_dir).map_err(|e| {
        BatonError::UserError(format!(
            "failed to read run directory '{}': {}",
            run_dir.display(),
            e
        ))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            BatonError::UserError(format!("failed to read directory entry: {}", e))
        })?;
        let name = entry.file_name();
        if entry.path().is_file()
            && let Some(name) = name.to_str()
        {
            files.push(name.to_string());
        }
    }

    let mut missing = Vec::new();
    for pattern in required {
        let matcher = Glob::new(pattern)
            .map_err(|e| {
                BatonError::UserError(format!(
                    "invalid approval policy pattern '{}': {}",
                    pattern, e
                ))
            })?
            .compile_matcher();
        if !files.iter().any(|f| matcher.is_match(f)) {
            missing.push(pattern.clone());
        }
    }

    Ok(ApprovalReport {
        required: required.to_vec(),
        missing,
    })
}

/// Rewrite CHECKLIST.md with every `- [ ]` box ticked.
fn tick_checklist(ctx: &RunContext, run_id: &str) -> Result<()> {
    let path = ctx.run_dir(run_id).join("CHECKLIST.md");
    if !path.is_file() {
        return Ok(());
    }
    let content = std::fs::read_to_string(&path).map_err(|e| {
        BatonError::UserError(format!(
            "failed to read checklist '{}': {}",
            path.display(),
            e
        ))
    })?;
    atomic_write_file(&path, &content.replace("- [ ]", "- [x]"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::read_events;
    use tempfile::TempDir;

    const RUN_ID: &str = "run-20260807-101500";

    const ROSTER_YAML: &str = r#"roles:
  - id: alpha
    responsibilities: First step.
    output: a.md
approval:
  required:
    - a.md
    - FINAL.md
    - CHECKLIST.md
"#;

    fn test_context(flow_state: FlowState) -> (TempDir, RunContext) {
        let dir = TempDir::new().unwrap();
        let ctx = RunContext::new(dir.path());
        std::fs::create_dir_all(ctx.run_dir(RUN_ID)).unwrap();
        std::fs::create_dir_all(ctx.roster_path().parent().unwrap()).unwrap();
        std::fs::write(ctx.roster_path(), ROSTER_YAML).unwrap();

        let mut manifest = Manifest::new(RUN_ID);
        manifest.flow_state = flow_state;
        manifest.save(&ctx).unwrap();
        (dir, ctx)
    }

    fn write_artifacts(ctx: &RunContext, names: &[&str]) {
        for name in names {
            std::fs::write(ctx.run_dir(RUN_ID).join(name), "content\n").unwrap();
        }
    }

    #[test]
    fn gate_passes_with_all_artifacts() {
        let (_dir, ctx) = test_context(FlowState::Completed);
        write_artifacts(&ctx, &["a.md", "FINAL.md"]);
        std::fs::write(
            ctx.run_dir(RUN_ID).join("CHECKLIST.md"),
            "# Checklist\n\n- [ ] One\n- [ ] Two\n",
        )
        .unwrap();

        let report = approve(&ctx, RUN_ID).unwrap();

        assert!(report.satisfied());
        let checklist =
            std::fs::read_to_string(ctx.run_dir(RUN_ID).join("CHECKLIST.md")).unwrap();
        assert!(!checklist.contains("- [ ]"));
        assert_eq!(checklist.matches("- [x]").count(), 2);
    }

    #[test]
    fn gate_reports_missing_artifacts() {
        let (_dir, ctx) = test_context(FlowState::Completed);
        write_artifacts(&ctx, &["a.md", "CHECKLIST.md"]);

        let report = approve(&ctx, RUN_ID).unwrap();

        assert!(!report.satisfied());
        assert_eq!(report.missing, vec!["FINAL.md".to_string()]);
    }

    #[test]
    fn failed_gate_leaves_checklist_untouched() {
        let (_dir, ctx) = test_context(FlowState::Completed);
        std::fs::write(
            ctx.run_dir(RUN_ID).join("CHECKLIST.md"),
            "- [ ] One\n",
        )
        .unwrap();

        let report = approve(&ctx, RUN_ID).unwrap();
        assert!(!report.satisfied());

        let checklist =
            std::fs::read_to_string(ctx.run_dir(RUN_ID).join("CHECKLIST.md")).unwrap();
        assert!(checklist.contains("- [ ]"));
    }

    #[test]
    fn gate_requires_completed_flow() {
        let (_dir, ctx) = test_context(FlowState::Running);
        write_artifacts(&ctx, &["a.md", "FINAL.md", "CHECKLIST.md"]);

        let err = approve(&ctx, RUN_ID).unwrap_err();
        assert!(err.to_string().contains("requires a completed run"));
    }

    #[test]
    fn gate_never_touches_flow_state() {
        let (_dir, ctx) = test_context(FlowState::Completed);

        let report = approve(&ctx, RUN_ID).unwrap();
        assert!(!report.satisfied());

        let manifest = Manifest::load(&ctx, RUN_ID).unwrap();
        assert_eq!(manifest.flow_state, FlowState::Completed);
    }

    #[test]
    fn glob_patterns_match_artifacts() {
        let dir = TempDir::new().unwrap();
        let ctx = RunContext::new(dir.path());
        std::fs::create_dir_all(ctx.run_dir(RUN_ID)).unwrap();
        std::fs::create_dir_all(ctx.roster_path().parent().unwrap()).unwrap();
        std::fs::write(
            ctx.roster_path(),
            "roles:\n  - id: alpha\n    responsibilities: x\n    output: a.md\napproval:\n  required:\n    - \"0*.md\"\n",
        )
        .unwrap();
        let mut manifest = Manifest::new(RUN_ID);
        manifest.flow_state = FlowState::Completed;
        manifest.save(&ctx).unwrap();

        std::fs::write(ctx.run_dir(RUN_ID).join("01-architecture.md"), "x\n").unwrap();

        let report = approve(&ctx, RUN_ID).unwrap();
        assert!(report.satisfied());
    }

    #[test]
    fn approve_event_is_logged_either_way() {
        let (_dir, ctx) = test_context(FlowState::Completed);

        approve(&ctx, RUN_ID).unwrap();

        let events = read_events(&ctx, RUN_ID).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, EventAction::Approve);
        assert_eq!(events[0].details["satisfied"], false);
    }

    #[test]
    fn missing_checklist_is_tolerated() {
        let (_dir, ctx) = test_context(FlowState::Completed);
        std::fs::write(
            ctx.roster_path(),
            "roles:\n  - id: alpha\n    responsibilities: x\n    output: a.md\napproval:\n  required:\n    - a.md\n",
        )
        .unwrap();
        write_artifacts(&ctx, &["a.md"]);

        let report = approve(&ctx, RUN_ID).unwrap();
        assert!(report.satisfied());
    }
}
