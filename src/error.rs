//! Error types for the baton CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error
//! messages. Each variant maps to a specific exit code.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for baton operations.
#[derive(Error, Debug)]
pub enum BatonError {
    /// User provided invalid arguments or the system is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// The named run has no run directory or manifest.
    #[error("run not found: {0}")]
    RunNotFound(String),

    /// The named role is not in the roster.
    #[error("role not found in roster: {0}")]
    RoleNotFound(String),

    /// An attempted state-machine move is not in the allowed set.
    ///
    /// This is a logic error in the caller, never user-recoverable.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// A role claimed completion without its required artifacts.
    #[error("role '{role}' is missing required outputs: {}", .missing.join(", "))]
    MissingOutputs { role: String, missing: Vec<String> },

    /// The approval gate found required run-level artifacts missing.
    #[error("approval gate failed, missing artifacts: {}", .missing.join(", "))]
    ApprovalIncomplete { missing: Vec<String> },

    /// More than one role is persisted as running for the same run.
    ///
    /// The orchestrator treats this as unrecoverable corruption and never
    /// attempts repair.
    #[error("multiple roles running ({}): protocol invariant violated", .0.join(", "))]
    MultipleRolesRunning(Vec<String>),
}

impl BatonError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            BatonError::UserError(_) => exit_codes::USER_ERROR,
            BatonError::RunNotFound(_) => exit_codes::USER_ERROR,
            BatonError::RoleNotFound(_) => exit_codes::USER_ERROR,
            BatonError::InvalidTransition { .. } => exit_codes::PROTOCOL_FAILURE,
            BatonError::MissingOutputs { .. } => exit_codes::VALIDATION_FAILURE,
            BatonError::ApprovalIncomplete { .. } => exit_codes::VALIDATION_FAILURE,
            BatonError::MultipleRolesRunning(_) => exit_codes::PROTOCOL_FAILURE,
        }
    }
}

/// Result type alias for baton operations.
pub type Result<T> = std::result::Result<T, BatonError>;
