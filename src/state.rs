//! State machines for run and role lifecycle.
//!
//! Two pure transition validators with no I/O:
//!
//! - [`FlowStateMachine`] tracks the run-level lifecycle
//!   (CREATED -> PENDING -> RUNNING -> COMPLETED/FAILED -> ARCHIVED).
//! - [`RoleStateMachine`] tracks one role within a run
//!   (PENDING -> RUNNING -> COMPLETED/FAILED).
//!
//! States only move forward. A disallowed transition returns
//! `BatonError::InvalidTransition` and leaves the machine unchanged.

use crate::error::{BatonError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Run-level lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Created,
    Pending,
    Running,
    Completed,
    Failed,
    Archived,
}

impl FlowState {
    /// Allowed target states from this state.
    pub fn allowed_targets(self) -> &'static [FlowState] {
        match self {
            FlowState::Created => &[FlowState::Pending],
            FlowState::Pending => &[FlowState::Running],
            FlowState::Running => &[FlowState::Completed, FlowState::Failed],
            FlowState::Completed => &[FlowState::Archived],
            FlowState::Failed => &[FlowState::Archived],
            FlowState::Archived => &[],
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowState::Created => "created",
            FlowState::Pending => "pending",
            FlowState::Running => "running",
            FlowState::Completed => "completed",
            FlowState::Failed => "failed",
            FlowState::Archived => "archived",
        };
        write!(f, "{}", s)
    }
}

/// Per-role lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RoleState {
    /// Allowed target states from this state.
    pub fn allowed_targets(self) -> &'static [RoleState] {
        match self {
            RoleState::Pending => &[RoleState::Running],
            RoleState::Running => &[RoleState::Completed, RoleState::Failed],
            RoleState::Completed => &[],
            RoleState::Failed => &[],
        }
    }
}

impl fmt::Display for RoleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoleState::Pending => "pending",
            RoleState::Running => "running",
            RoleState::Completed => "completed",
            RoleState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// State machine for the run-level flow lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowStateMachine {
    state: FlowState,
}

impl FlowStateMachine {
    /// Create a machine in the given state.
    pub fn new(state: FlowState) -> Self {
        Self { state }
    }

    /// The current state.
    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Check whether a transition is valid without performing it.
    pub fn can_transition(&self, target: FlowState) -> bool {
        self.state.allowed_targets().contains(&target)
    }

    /// Transition to a new state.
    ///
    /// On a disallowed move the state is unchanged and an
    /// `InvalidTransition` error is returned.
    pub fn transition(&mut self, target: FlowState) -> Result<()> {
        if !self.can_transition(target) {
            return Err(BatonError::InvalidTransition {
                from: self.state.to_string(),
                to: target.to_string(),
            });
        }
        self.state = target;
        Ok(())
    }

    /// True iff no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        self.state.allowed_targets().is_empty()
    }
}

impl Default for FlowStateMachine {
    fn default() -> Self {
        Self::new(FlowState::Created)
    }
}

/// State machine for one role's lifecycle within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleStateMachine {
    state: RoleState,
}

impl RoleStateMachine {
    /// Create a machine in the given state.
    pub fn new(state: RoleState) -> Self {
        Self { state }
    }

    /// The current state.
    pub fn state(&self) -> RoleState {
        self.state
    }

    /// Check whether a transition is valid without performing it.
    pub fn can_transition(&self, target: RoleState) -> bool {
        self.state.allowed_targets().contains(&target)
    }

    /// Transition to a new state.
    ///
    /// On a disallowed move the state is unchanged and an
    /// `InvalidTransition` error is returned.
    pub fn transition(&mut self, target: RoleState) -> Result<()> {
        if !self.can_transition(target) {
            return Err(BatonError::InvalidTransition {
                from: self.state.to_string(),
                to: target.to_string(),
            });
        }
        self.state = target;
        Ok(())
    }

    /// True iff no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        self.state.allowed_targets().is_empty()
    }
}

impl Default for RoleStateMachine {
    fn default() -> Self {
        Self::new(RoleState::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_FLOW_STATES: [FlowState; 6] = [
        FlowState::Created,
        FlowState::Pending,
        FlowState::Running,
        FlowState::Completed,
        FlowState::Failed,
        FlowState::Archived,
    ];

    const ALL_ROLE_STATES: [RoleState; 4] = [
        RoleState::Pending,
        RoleState::Running,
        RoleState::Completed,
        RoleState::Failed,
    ];

    #[test]
    fn flow_happy_path() {
        let mut fsm = FlowStateMachine::default();
        assert_eq!(fsm.state(), FlowState::Created);

        fsm.transition(FlowState::Pending).unwrap();
        fsm.transition(FlowState::Running).unwrap();
        fsm.transition(FlowState::Completed).unwrap();
        fsm.transition(FlowState::Archived).unwrap();
        assert!(fsm.is_terminal());
    }

    #[test]
    fn flow_failure_path() {
        let mut fsm = FlowStateMachine::new(FlowState::Running);
        fsm.transition(FlowState::Failed).unwrap();
        assert!(!fsm.is_terminal());
        fsm.transition(FlowState::Archived).unwrap();
        assert!(fsm.is_terminal());
    }

    #[test]
    fn flow_can_transition_matches_allowed_sets() {
        for from in ALL_FLOW_STATES {
            let fsm = FlowStateMachine::new(from);
            for to in ALL_FLOW_STATES {
                assert_eq!(
                    fsm.can_transition(to),
                    from.allowed_targets().contains(&to),
                    "can_transition({from}, {to}) disagrees with allowed set"
                );
            }
        }
    }

    #[test]
    fn flow_invalid_transition_leaves_state_unchanged() {
        let mut fsm = FlowStateMachine::new(FlowState::Created);
        let err = fsm.transition(FlowState::Completed).unwrap_err();
        assert!(matches!(err, BatonError::InvalidTransition { .. }));
        assert_eq!(fsm.state(), FlowState::Created);
    }

    #[test]
    fn flow_archived_is_only_terminal_state() {
        for state in ALL_FLOW_STATES {
            let fsm = FlowStateMachine::new(state);
            assert_eq!(fsm.is_terminal(), state == FlowState::Archived);
        }
    }

    #[test]
    fn flow_cannot_skip_states() {
        let mut fsm = FlowStateMachine::new(FlowState::Created);
        assert!(fsm.transition(FlowState::Running).is_err());
        assert!(fsm.transition(FlowState::Archived).is_err());
        assert_eq!(fsm.state(), FlowState::Created);
    }

    #[test]
    fn flow_cannot_move_backward() {
        let mut fsm = FlowStateMachine::new(FlowState::Running);
        assert!(fsm.transition(FlowState::Pending).is_err());
        assert!(fsm.transition(FlowState::Created).is_err());
    }

    #[test]
    fn role_happy_path() {
        let mut fsm = RoleStateMachine::default();
        assert_eq!(fsm.state(), RoleState::Pending);

        fsm.transition(RoleState::Running).unwrap();
        fsm.transition(RoleState::Completed).unwrap();
        assert!(fsm.is_terminal());
    }

    #[test]
    fn role_can_transition_matches_allowed_sets() {
        for from in ALL_ROLE_STATES {
            let fsm = RoleStateMachine::new(from);
            for to in ALL_ROLE_STATES {
                assert_eq!(
                    fsm.can_transition(to),
                    from.allowed_targets().contains(&to),
                    "can_transition({from}, {to}) disagrees with allowed set"
                );
            }
        }
    }

    #[test]
    fn role_completed_and_failed_are_terminal() {
        assert!(RoleStateMachine::new(RoleState::Completed).is_terminal());
        assert!(RoleStateMachine::new(RoleState::Failed).is_terminal());
        assert!(!RoleStateMachine::new(RoleState::Pending).is_terminal());
        assert!(!RoleStateMachine::new(RoleState::Running).is_terminal());
    }

    #[test]
    fn role_invalid_transition_leaves_state_unchanged() {
        let mut fsm = RoleStateMachine::new(RoleState::Completed);
        let err = fsm.transition(RoleState::Running).unwrap_err();
        assert!(matches!(err, BatonError::InvalidTransition { .. }));
        assert_eq!(fsm.state(), RoleState::Completed);
    }

    #[test]
    fn role_cannot_skip_running() {
        let mut fsm = RoleStateMachine::new(RoleState::Pending);
        assert!(fsm.transition(RoleState::Completed).is_err());
        assert!(fsm.transition(RoleState::Failed).is_err());
        assert_eq!(fsm.state(), RoleState::Pending);
    }

    #[test]
    fn states_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&FlowState::Created).unwrap(),
            "\"created\""
        );
        assert_eq!(
            serde_json::to_string(&RoleState::Running).unwrap(),
            "\"running\""
        );

        let state: FlowState = serde_json::from_str("\"archived\"").unwrap();
        assert_eq!(state, FlowState::Archived);
    }

    #[test]
    fn display_matches_serialization() {
        for state in ALL_FLOW_STATES {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state));
        }
        for state in ALL_ROLE_STATES {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state));
        }
    }
}
