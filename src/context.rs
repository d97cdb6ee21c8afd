//! Path resolution for baton state.
//!
//! All durable state lives under a single root directory passed explicitly
//! on the command line. Every component receives a [`RunContext`] rather than
//! consulting process-wide constants, so tests and external schedulers can
//! point baton at any directory.
//!
//! Layout under the root:
//!
//! ```text
//! <root>/
//!   baton.yaml                     optional config
//!   roster/roles.yaml              optional roster + approval policy
//!   runs/<run-id>/                 run packet, manifest, events
//!   agents/<run-id>/<role>/        per-role workspace (inbox/outbox/workspace)
//! ```

use crate::error::{BatonError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Run ids are timestamp-shaped: `run-YYYYMMDD-HHMMSS`, optionally with a
/// short suffix (`run-20260807-101500-hotfix`).
static RUN_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^run-\d{8}-\d{6}(-[a-z0-9-]+)?$").expect("invalid run id regex")
});

/// Role ids: lowercase alphanumeric with hyphens.
static ROLE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").expect("invalid role id regex"));

/// Resolved paths for a baton state root.
///
/// All paths are derived from the root; the struct itself performs no I/O
/// beyond existence checks.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Root directory for all baton state.
    pub root: PathBuf,
}

impl RunContext {
    /// Create a context rooted at the given directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path to the optional config file.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("baton.yaml")
    }

    /// Path to the roster file.
    pub fn roster_path(&self) -> PathBuf {
        self.root.join("roster").join("roles.yaml")
    }

    /// Directory holding all run packets.
    pub fn runs_dir(&self) -> PathBuf {
        self.root.join("runs")
    }

    /// Directory for one run's packet and records.
    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.runs_dir().join(run_id)
    }

    /// Path to a run's manifest record.
    pub fn manifest_path(&self, run_id: &str) -> PathBuf {
        self.run_dir(run_id).join("manifest.json")
    }

    /// Path to a run's append-only event log.
    pub fn events_path(&self, run_id: &str) -> PathBuf {
        self.run_dir(run_id).join("events.ndjson")
    }

    /// Directory holding all agent workspaces for a run.
    pub fn agents_dir(&self, run_id: &str) -> PathBuf {
        self.root.join("agents").join(run_id)
    }

    /// One role's agent workspace directory.
    pub fn agent_dir(&self, run_id: &str, role_id: &str) -> PathBuf {
        self.agents_dir(run_id).join(role_id)
    }

    /// Path to a role's durable status record.
    pub fn status_path(&self, run_id: &str, role_id: &str) -> PathBuf {
        self.agent_dir(run_id, role_id).join("status.json")
    }

    /// Check that a run directory and manifest exist.
    pub fn ensure_run_exists(&self, run_id: &str) -> Result<()> {
        if !self.run_dir(run_id).is_dir() || !self.manifest_path(run_id).is_file() {
            return Err(BatonError::RunNotFound(run_id.to_string()));
        }
        Ok(())
    }
}

/// Validate a run id, rejecting path traversal and malformed names.
///
/// Returns the id unchanged on success.
pub fn validate_run_id(run_id: &str) -> Result<&str> {
    if run_id.contains('/') || run_id.contains('\\') || run_id.contains("..") {
        return Err(BatonError::UserError(format!(
            "invalid run id '{}': contains path separators.\n\
             Run ids look like run-20260807-101500.",
            run_id
        )));
    }
    if !RUN_ID_REGEX.is_match(run_id) {
        return Err(BatonError::UserError(format!(
            "invalid run id '{}': must match run-YYYYMMDD-HHMMSS[-suffix]",
            run_id
        )));
    }
    Ok(run_id)
}

/// Validate a role id from the roster.
pub fn validate_role_id(role_id: &str) -> Result<&str> {
    if !ROLE_ID_REGEX.is_match(role_id) {
        return Err(BatonError::UserError(format!(
            "invalid role id '{}': must be lowercase alphanumeric with hyphens",
            role_id
        )));
    }
    Ok(role_id)
}
