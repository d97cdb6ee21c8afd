//! Exit code constants for the baton CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, missing run, I/O)
//! - 2: Validation failure (missing outputs, approval gate)
//! - 3: Protocol failure (invalid transition, multiple running roles)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, missing run or roster, I/O failure.
pub const USER_ERROR: i32 = 1;

/// Validation failure: a role or run is missing required artifacts.
pub const VALIDATION_FAILURE: i32 = 2;

/// Protocol failure: invalid state transition or multiple running roles.
pub const PROTOCOL_FAILURE: i32 = 3;
