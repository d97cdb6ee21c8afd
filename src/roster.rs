//! Roster model: the ordered role definitions for a run.
//!
//! The roster lives at `roster/roles.yaml` under the state root and is
//! immutable once a run is created. When no roster file exists, a built-in
//! five-role pipeline is used so a fresh root works out of the box.
//!
//! # Roster File Format
//!
//! ```yaml
//! roles:
//!   - id: architect
//!     responsibilities: Define architecture changes, contracts, non-goals.
//!     output: 01-architecture.md
//!   - id: builder
//!     responsibilities: Implement approved scope (code/config).
//!     output: 02-implementation.md
//! approval:
//!   required:
//!     - FINAL.md
//!     - CHECKLIST.md
//!     - "0*.md"
//! ```
//!
//! Approval entries are file names or glob patterns matched against the run
//! directory. When the `approval` section is omitted, the policy defaults to
//! every role output plus `FINAL.md` and `CHECKLIST.md`.

use crate::context::validate_role_id;
use crate::error::{BatonError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One ordered step in the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Role identifier (e.g. "architect").
    pub id: String,

    /// Human-readable responsibilities, included in the worker brief.
    pub responsibilities: String,

    /// Required output artifact name, relative to the run directory.
    pub output: String,
}

/// Run-level artifacts required before a run is releasable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    /// File names or glob patterns, matched against the run directory.
    pub required: Vec<String>,
}

/// The ordered role definitions plus approval policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    /// Roles in execution order.
    pub roles: Vec<Role>,

    /// Optional approval policy; defaults derive from the roles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<ApprovalPolicy>,
}

impl Roster {
    /// The built-in pipeline used when no roster file exists.
    pub fn builtin() -> Self {
        let role = |id: &str, responsibilities: &str, output: &str| Role {
            id: id.to_string(),
            responsibilities: responsibilities.to_string(),
            output: output.to_string(),
        };
        Self {
            roles: vec![
                role(
                    "architect",
                    "Define architecture changes, contracts, non-goals.",
                    "01-architecture.md",
                ),
                role(
                    "builder",
                    "Implement approved scope (code/config).",
                    "02-implementation.md",
                ),
                role("data", "Schema/seed/migrations if needed.", "03-data-notes.md"),
                role("qa", "Add/execute tests and report evidence.", "04-qa-report.md"),
                role(
                    "docs",
                    "Update README/runbook/release notes.",
                    "05-release-notes.md",
                ),
            ],
            approval: None,
        }
    }

    /// Load a roster from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BatonError::UserError(format!(
                "failed to read roster '{}': {}",
                path.display(),
                e
            ))
        })?;
        let roster: Roster = serde_yaml::from_str(&content).map_err(|e| {
            BatonError::UserError(format!(
                "failed to parse roster '{}': {}",
                path.display(),
                e
            ))
        })?;
        roster.validate()?;
        Ok(roster)
    }

    /// Load the roster at `path`, falling back to the built-in pipeline when
    /// the file does not exist.
    pub fn load_or_builtin<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::builtin())
        }
    }

    /// Find a role by id.
    pub fn find(&self, role_id: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == role_id)
    }

    /// The run-level artifacts required by the approval gate.
    ///
    /// Explicit policy entries win; otherwise every role output plus
    /// `FINAL.md` and `CHECKLIST.md`.
    pub fn required_artifacts(&self) -> Vec<String> {
        if let Some(policy) = &self.approval {
            return policy.required.clone();
        }
        let mut required: Vec<String> = self.roles.iter().map(|r| r.output.clone()).collect();
        required.push("FINAL.md".to_string());
        required.push("CHECKLIST.md".to_string());
        required
    }

    /// Validate role ids, output names, and uniqueness.
    fn validate(&self) -> Result<()> {
        if self.roles.is_empty() {
            return Err(BatonError::UserError(
                "roster contains no roles".to_string(),
            ));
        }

        let mut seen_ids = HashSet::new();
        let mut seen_outputs = HashSet::new();
        for role in &self.roles {
            validate_role_id(&role.id)?;
            if !seen_ids.insert(role.id.as_str()) {
                return Err(BatonError::UserError(format!(
                    "duplicate role id '{}' in roster",
                    role.id
                )));
            }
            if role.output.is_empty()
                || role.output.contains('/')
                || role.output.contains('\\')
                || role.output.contains("..")
            {
                return Err(BatonError::UserError(format!(
                    "role '{}' has unsafe output name '{}'",
                    role.id, role.output
                )));
            }
            if !seen_outputs.insert(role.output.as_str()) {
                return Err(BatonError::UserError(format!(
                    "duplicate output artifact '{}' in roster",
                    role.output
                )));
            }
        }
        Ok(())
    }
}
