//! Completion validation for roles.
//!
//! A role claiming `completed` must have produced its required output
//! artifact in the run directory and a summary in its outbox. The check
//! reports what is missing as data; deciding what to do about it (downgrade
//! the role, fail the flow) is the orchestrator's job.

use crate::agent::AgentWorkspace;
use crate::context::RunContext;
use crate::error::Result;
use crate::roster::Role;

/// Check a completed role's required outputs.
///
/// Returns the relative names of missing outputs; an empty list means the
/// completion claim is valid.
pub fn missing_outputs(ctx: &RunContext, run_id: &str, role: &Role) -> Result<Vec<String>> {
    let mut missing = Vec::new();

    let output_path = ctx.run_dir(run_id).join(&role.output);
    if !output_path.is_file() {
        missing.push(role.output.clone());
    }

    let ws = AgentWorkspace::new(ctx, run_id, &role.id);
    if !ws.summary_path().is_file() {
        missing.push("outbox/summary.md".to_string());
    }

    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RUN_ID: &str = "run-20260807-101500";

    fn test_role() -> Role {
        Role {
            id: "qa".to_string(),
            responsibilities: "Test things.".to_string(),
            output: "04-qa-report.md".to_string(),
        }
    }

    fn test_context() -> (TempDir, RunContext) {
        let dir = TempDir::new().unwrap();
        let ctx = RunContext::new(dir.path());
        std::fs::create_dir_all(ctx.run_dir(RUN_ID)).unwrap();
        (dir, ctx)
    }

    fn write_summary(ctx: &RunContext, role_id: &str) {
        let ws = AgentWorkspace::new(ctx, RUN_ID, role_id);
        std::fs::create_dir_all(ws.outbox_dir()).unwrap();
        std::fs::write(ws.summary_path(), "Done.\n").unwrap();
    }

    #[test]
    fn both_outputs_present_is_valid() {
        let (_dir, ctx) = test_context();
        let role = test_role();

        std::fs::write(ctx.run_dir(RUN_ID).join(&role.output), "# QA\n").unwrap();
        write_summary(&ctx, &role.id);

        assert!(missing_outputs(&ctx, RUN_ID, &role).unwrap().is_empty());
    }

    #[test]
    fn missing_artifact_is_reported_by_name() {
        let (_dir, ctx) = test_context();
        let role = test_role();
        write_summary(&ctx, &role.id);

        let missing = missing_outputs(&ctx, RUN_ID, &role).unwrap();
        assert_eq!(missing, vec!["04-qa-report.md".to_string()]);
    }

    #[test]
    fn missing_summary_is_reported() {
        let (_dir, ctx) = test_context();
        let role = test_role();

        std::fs::write(ctx.run_dir(RUN_ID).join(&role.output), "# QA\n").unwrap();

        let missing = missing_outputs(&ctx, RUN_ID, &role).unwrap();
        assert_eq!(missing, vec!["outbox/summary.md".to_string()]);
    }

    #[test]
    fn both_missing_are_reported() {
        let (_dir, ctx) = test_context();
        let role = test_role();

        let missing = missing_outputs(&ctx, RUN_ID, &role).unwrap();
        assert_eq!(missing.len(), 2);
        assert!(missing.contains(&"04-qa-report.md".to_string()));
        assert!(missing.contains(&"outbox/summary.md".to_string()));
    }

    #[test]
    fn directory_in_place_of_artifact_counts_as_missing() {
        let (_dir, ctx) = test_context();
        let role = test_role();

        std::fs::create_dir_all(ctx.run_dir(RUN_ID).join(&role.output)).unwrap();
        write_summary(&ctx, &role.id);

        let missing = missing_outputs(&ctx, RUN_ID, &role).unwrap();
        assert_eq!(missing, vec!["04-qa-report.md".to_string()]);
    }
}
