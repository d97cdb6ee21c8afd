//! Durable run manifest.
//!
//! The manifest is the run-level progress record: flow state, the role most
//! recently spawned, and when it was spawned. It has a single writer (the
//! orchestrator) and is always updated by whole-record read-modify-write
//! with an atomic replace; there are no partial-field updates.

use crate::context::RunContext;
use crate::error::{BatonError, Result};
use crate::fs::atomic_write_file;
use crate::state::{FlowState, FlowStateMachine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable record of a run's orchestration progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Opaque run identifier.
    pub run_id: String,

    /// Run-level lifecycle stage.
    pub flow_state: FlowState,

    /// The role most recently recorded as current (spawned).
    #[serde(default)]
    pub current_role: Option<String>,

    /// When the current role was spawned.
    #[serde(default)]
    pub last_spawn: Option<DateTime<Utc>>,
}

impl Manifest {
    /// Create a fresh manifest in flow state CREATED.
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            flow_state: FlowState::Created,
            current_role: None,
            last_spawn: None,
        }
    }

    /// Load the manifest for a run.
    pub fn load(ctx: &RunContext, run_id: &str) -> Result<Self> {
        let path = ctx.manifest_path(run_id);
        let content = std::fs::read_to_string(&path).map_err(|_| {
            BatonError::RunNotFound(run_id.to_string())
        })?;
        serde_json::from_str(&content).map_err(|e| {
            BatonError::UserError(format!(
                "failed to parse manifest '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Persist the whole record with an atomic replace.
    pub fn save(&self, ctx: &RunContext) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            BatonError::UserError(format!("failed to serialize manifest: {}", e))
        })?;
        atomic_write_file(ctx.manifest_path(&self.run_id), &content)
    }

    /// Move the flow state forward, enforcing the transition table.
    ///
    /// The in-memory record only; callers persist with [`Manifest::save`].
    pub fn transition_flow(&mut self, target: FlowState) -> Result<()> {
        let mut fsm = FlowStateMachine::new(self.flow_state);
        fsm.transition(target)?;
        self.flow_state = fsm.state();
        Ok(())
    }

    /// Record a spawn: the current role pointer and spawn time.
    pub fn record_spawn(&mut self, role_id: &str, at: DateTime<Utc>) {
        self.current_role = Some(role_id.to_string());
        self.last_spawn = Some(at);
    }
}
