//! Run packet materialization.
//!
//! Creating a run writes everything the pipeline needs under
//! `runs/<run-id>/`: the run brief (RUN.md), one rendered brief per roster
//! role, the integration checklist, the final-summary skeleton, and the
//! initial manifest in flow state CREATED. Output artifacts are never
//! pre-created; their existence is how completion claims are validated.
//!
//! Creation is the only non-idempotent operation in the CLI; an existing
//! run directory is refused rather than overwritten.

use crate::agent::template::{self, Vars};
use crate::config::Config;
use crate::context::{RunContext, validate_run_id};
use crate::error::{BatonError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::fs::atomic_write_file;
use crate::manifest::Manifest;
use crate::roster::Roster;
use chrono::{DateTime, Utc};
use serde_json::json;

/// Inputs for materializing a run packet.
#[derive(Debug, Clone)]
pub struct CreateRun {
    /// What this run is trying to achieve.
    pub objective: String,
    /// Acceptance criteria, one bullet each.
    pub criteria: Vec<String>,
    /// Scope statement included in every brief.
    pub scope: String,
    /// Explicit run id; generated from the clock when absent.
    pub run_id: Option<String>,
}

const DEFAULT_BRIEF_TEMPLATE: &str = "\
# Role Brief: {{role}}

- Run: {{run_id}}
- Output file: {{output_file}}

## Objective
{{objective}}

## Responsibilities
{{responsibilities}}

## Acceptance criteria
{{acceptance_criteria}}

## Scope
{{scope}}
";

const CHECKLIST: &str = "\
# Integration Checklist

- [ ] Architecture output complete
- [ ] Implementation complete
- [ ] Data compatibility confirmed
- [ ] Tests added/executed
- [ ] Docs updated
- [ ] FINAL.md written
";

const FINAL_SKELETON: &str = "\
# Final Summary

## Changes
- TBD

## Deferred
- TBD

## Blockers
- None
";

/// Materialize a run packet and its initial manifest.
///
/// Returns the run id.
pub fn create_run(
    ctx: &RunContext,
    config: &Config,
    params: &CreateRun,
    now: DateTime<Utc>,
) -> Result<String> {
    let roster = Roster::load_or_builtin(ctx.roster_path())?;

    let run_id = match &params.run_id {
        Some(id) => validate_run_id(id)?.to_string(),
        None => now.format("run-%Y%m%d-%H%M%S").to_string(),
    };

    let run_dir = ctx.run_dir(&run_id);
    if run_dir.exists() {
        return Err(BatonError::UserError(format!(
            "run '{}' already exists at {}",
            run_id,
            run_dir.display()
        )));
    }
    std::fs::create_dir_all(&run_dir).map_err(|e| {
        BatonError::UserError(format!(
            "failed to create run directory '{}': {}",
            run_dir.display(),
            e
        ))
    })?;

    let criteria_text = if params.criteria.is_empty() {
        "- (none provided)".to_string()
    } else {
        params
            .criteria
            .iter()
            .map(|c| format!("- {}", c))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let run_md = format!(
        "# Run\n\n- ID: {}\n- Created (UTC): {}\n- Objective: {}\n\n\
         ## Acceptance criteria\n{}\n\n## Scope\n{}\n",
        run_id,
        now.to_rfc3339(),
        params.objective,
        criteria_text,
        params.scope
    );
    atomic_write_file(run_dir.join("RUN.md"), &run_md)?;

    let brief_template = load_brief_template(ctx, config)?;
    for role in &roster.roles {
        let vars: Vars = template::vars([
            ("role", role.id.as_str()),
            ("run_id", run_id.as_str()),
            ("objective", params.objective.as_str()),
            ("acceptance_criteria", criteria_text.as_str()),
            ("scope", params.scope.as_str()),
            ("responsibilities", role.responsibilities.as_str()),
            ("output_file", role.output.as_str()),
        ]);
        let brief = template::render(&brief_template, &vars)?;
        atomic_write_file(run_dir.join(format!("brief-{}.md", role.id)), &brief)?;
    }

    atomic_write_file(run_dir.join("CHECKLIST.md"), CHECKLIST)?;
    atomic_write_file(run_dir.join("FINAL.md"), FINAL_SKELETON)?;

    Manifest::new(&run_id).save(ctx)?;

    append_event(
        ctx,
        &run_id,
        &Event::new(EventAction::Create)
            .with_details(json!({"objective": params.objective, "roles": roster.roles.len()})),
    )?;

    Ok(run_id)
}

/// The brief template: configured file when set, built-in otherwise.
fn load_brief_template(ctx: &RunContext, config: &Config) -> Result<String> {
    match &config.brief_template {
        None => Ok(DEFAULT_BRIEF_TEMPLATE.to_string()),
        Some(rel) => {
            let path = ctx.root.join(rel);
            std::fs::read_to_string(&path).map_err(|e| {
                BatonError::UserError(format!(
                    "failed to read brief template '{}': {}",
                    path.display(),
                    e
                ))
            })
        }
    }
}
