//! Implementation of the `baton approve` command.

use crate::approval::approve;
use crate::cli::ApproveArgs;
use crate::context::{RunContext, validate_run_id};
use crate::error::{BatonError, Result};

/// Execute `baton approve`.
pub fn cmd_approve(ctx: &RunContext, args: ApproveArgs) -> Result<()> {
    let run_id = validate_run_id(&args.run_id)?;
    ctx.ensure_run_exists(run_id)?;

    let report = approve(ctx, run_id)?;

    if report.satisfied() {
        println!(
            "Run {} approved: all {} required artifact(s) present",
            run_id,
            report.required.len()
        );
        println!("Checklist ticked. Next: baton archive {}", run_id);
        return Ok(());
    }

    println!("Run {} is not releasable. Missing artifacts:", run_id);
    for name in &report.missing {
        println!("  - {}", name);
    }

    Err(BatonError::ApprovalIncomplete {
        missing: report.missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;
    use crate::state::FlowState;
    use tempfile::TempDir;

    const RUN_ID: &str = "run-20260807-101500";

    fn completed_run() -> (TempDir, RunContext) {
        let dir = TempDir::new().unwrap();
        let ctx = RunContext::new(dir.path());
        std::fs::create_dir_all(ctx.run_dir(RUN_ID)).unwrap();
        std::fs::create_dir_all(ctx.roster_path().parent().unwrap()).unwrap();
        std::fs::write(
            ctx.roster_path(),
            "roles:\n  - id: solo\n    responsibilities: x\n    output: out.md\napproval:\n  required:\n    - out.md\n",
        )
        .unwrap();

        let mut manifest = Manifest::new(RUN_ID);
        manifest.flow_state = FlowState::Completed;
        manifest.save(&ctx).unwrap();
        (dir, ctx)
    }

    #[test]
    fn approves_when_artifacts_present() {
        let (_dir, ctx) = completed_run();
        std::fs::write(ctx.run_dir(RUN_ID).join("out.md"), "done\n").unwrap();

        cmd_approve(
            &ctx,
            ApproveArgs {
                run_id: RUN_ID.to_string(),
            },
        )
        .unwrap();
    }

    #[test]
    fn missing_artifacts_fail_with_validation_error() {
        let (_dir, ctx) = completed_run();

        let err = cmd_approve(
            &ctx,
            ApproveArgs {
                run_id: RUN_ID.to_string(),
            },
        )
        .unwrap_err();

        match err {
            BatonError::ApprovalIncomplete { missing } => {
                assert_eq!(missing, vec!["out.md".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
