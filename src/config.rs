//! Configuration model for baton.
//!
//! Represents the optional `baton.yaml` at the state root. Unknown fields
//! are ignored for forward compatibility and every field has a default, so
//! a missing file is equivalent to an empty one.

use crate::error::{BatonError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a baton state root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds after which a running role is considered stale by the
    /// watchdog. Overridable per invocation with `--timeout-secs`.
    pub stale_timeout_secs: u64,

    /// Path to a brief template file, relative to the state root.
    /// When unset the built-in template is used.
    pub brief_template: Option<String>,

    /// Number of trailing events shown by `baton status`.
    pub status_event_tail: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stale_timeout_secs: default_stale_timeout_secs(),
            brief_template: None,
            status_event_tail: default_status_event_tail(),
        }
    }
}

fn default_stale_timeout_secs() -> u64 {
    3600
}

fn default_status_event_tail() -> usize {
    10
}

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields are silently ignored; missing fields take defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BatonError::UserError(format!(
                "failed to read config '{}': {}",
                path.display(),
                e
            ))
        })?;
        serde_yaml::from_str(&content).map_err(|e| {
            BatonError::UserError(format!(
                "failed to parse config '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Load config from a YAML file, falling back to defaults when the file
    /// does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
