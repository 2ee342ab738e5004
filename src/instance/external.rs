//! Serializable snapshot of an instance's position.
//!
//! An [`ExternalState`] captures where an instance is (current state, map
//! stack and the state to return to for every pushed map) so it can be
//! persisted and later restored. Contexts, actions and timers are not part of
//! the snapshot.

use crate::core::{Event, State};
use crate::definition::{StateMachineDefinition, DEFAULT_STATE_MAP};
use crate::instance::position::{Frame, Position};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version identifier for the snapshot format.
pub const EXTERNAL_STATE_VERSION: u32 = 1;

/// Errors raised while encoding, decoding or restoring a snapshot.
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Unsupported external state version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The snapshot does not describe a valid position in the definition.
    #[error("External state validation failed: {0}")]
    ValidationFailed(String),
}

/// Snapshot of an instance position.
///
/// `map_stack` lists active maps from the bottom (always the default map) to
/// the top. `resume_states[i]` is the state that was current in
/// `map_stack[i]` when `map_stack[i + 1]` was pushed, so
/// `resume_states.len() == map_stack.len() - 1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ExternalState<S: State> {
    pub version: u32,
    pub current_state: S,
    pub map_stack: Vec<String>,
    pub resume_states: Vec<S>,
}

impl<S: State> ExternalState<S> {
    /// Snapshot in the default map with nothing pushed.
    pub fn new(current_state: S) -> Self {
        Self {
            version: EXTERNAL_STATE_VERSION,
            current_state,
            map_stack: vec![DEFAULT_STATE_MAP.to_string()],
            resume_states: Vec::new(),
        }
    }

    /// Name of the active (topmost) map.
    pub fn current_state_map(&self) -> &str {
        self.map_stack
            .last()
            .map_or(DEFAULT_STATE_MAP, String::as_str)
    }

    pub fn to_json(&self) -> Result<String, RestoreError> {
        serde_json::to_string(self).map_err(|e| RestoreError::SerializationFailed(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, RestoreError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RestoreError::SerializationFailed(e.to_string()))
    }

    /// Decode from JSON. Rejects snapshots from other format versions.
    pub fn from_json(json: &str) -> Result<Self, RestoreError> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| RestoreError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    /// Compact binary encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RestoreError> {
        bincode::serialize(self).map_err(|e| RestoreError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RestoreError> {
        let snapshot: Self = bincode::deserialize(bytes)
            .map_err(|e| RestoreError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    fn check_version(&self) -> Result<(), RestoreError> {
        if self.version == EXTERNAL_STATE_VERSION {
            Ok(())
        } else {
            Err(RestoreError::UnsupportedVersion {
                found: self.version,
                supported: EXTERNAL_STATE_VERSION,
            })
        }
    }

    pub(crate) fn from_position(position: &Position<S>) -> Self {
        Self {
            version: EXTERNAL_STATE_VERSION,
            current_state: position.state.clone(),
            map_stack: position.frames.iter().map(|f| f.map.clone()).collect(),
            resume_states: position
                .frames
                .iter()
                .filter_map(|f| f.resume.clone())
                .collect(),
        }
    }

    /// Check the snapshot against `definition` and convert it into a position.
    pub(crate) fn into_position<E: Event, C, A, R>(
        self,
        definition: &StateMachineDefinition<S, E, C, A, R>,
    ) -> Result<Position<S>, RestoreError> {
        self.check_version()?;

        if self.map_stack.first().map(String::as_str) != Some(DEFAULT_STATE_MAP) {
            return Err(RestoreError::ValidationFailed(format!(
                "map stack must start with '{}'",
                DEFAULT_STATE_MAP
            )));
        }
        if self.map_stack[1..].iter().any(|name| name == DEFAULT_STATE_MAP) {
            return Err(RestoreError::ValidationFailed(format!(
                "'{}' may only appear at the bottom of the map stack",
                DEFAULT_STATE_MAP
            )));
        }
        if self.resume_states.len() + 1 != self.map_stack.len() {
            return Err(RestoreError::ValidationFailed(format!(
                "{} resume states for {} maps",
                self.resume_states.len(),
                self.map_stack.len()
            )));
        }

        let mut maps = Vec::with_capacity(self.map_stack.len());
        for name in &self.map_stack {
            let map = definition.map(name).ok_or_else(|| {
                RestoreError::ValidationFailed(format!("unknown state map '{}'", name))
            })?;
            maps.push(map);
        }

        for (map, state) in maps.iter().zip(&self.resume_states) {
            if !map.contains(state) {
                return Err(RestoreError::ValidationFailed(format!(
                    "resume state '{}' is not in map '{}'",
                    state.name(),
                    map.name()
                )));
            }
        }

        let top = maps[maps.len() - 1];
        if !top.contains(&self.current_state) {
            return Err(RestoreError::ValidationFailed(format!(
                "state '{}' is not in map '{}'",
                self.current_state.name(),
                top.name()
            )));
        }

        let resumes = std::iter::once(None).chain(self.resume_states.into_iter().map(Some));
        let frames = self
            .map_stack
            .into_iter()
            .zip(resumes)
            .map(|(map, resume)| Frame { map, resume })
            .collect();

        Ok(Position {
            state: self.current_state,
            frames,
        })
    }
}
