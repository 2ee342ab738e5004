//! Engine tuning shared by every instance of a definition.

use serde::{Deserialize, Serialize};

/// Default ceiling for automatic transitions cascaded from a single step.
pub const DEFAULT_MAX_AUTOMATIC_TRANSITIONS: usize = 32;

/// Runtime limits applied by instances.
///
/// Missing fields fall back to their defaults when deserialized, so a partial
/// JSON document such as `{}` is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of automatic transitions allowed after one explicit step
    /// before the cascade is reported as a loop.
    pub max_automatic_transitions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_automatic_transitions: DEFAULT_MAX_AUTOMATIC_TRANSITIONS,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_max_automatic_transitions(mut self, max: usize) -> Self {
        self.max_automatic_transitions = max;
        self
    }
}
