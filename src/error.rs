//! Runtime errors raised by instances.

use crate::core::ActionError;
use crate::instance::RestoreError;
use thiserror::Error;

/// Errors raised while creating or driving an instance.
///
/// None of these are retried by the engine. Steps committed before the
/// error (for example earlier steps of an automatic cascade) stay committed.
#[derive(Debug, Error)]
pub enum FsmError {
    /// No transition applies and no default action is declared.
    /// The context has not been touched.
    #[error("illegal event '{event}' in state '{state}' of map '{map}'")]
    IllegalEvent {
        state: String,
        event: String,
        map: String,
    },

    /// An invariant returned false after a transition committed.
    #[error("invariant '{label}' violated after entering '{state}'")]
    InvariantViolation { label: String, state: String },

    /// Automatic transitions kept firing past the configured ceiling.
    #[error("automatic transitions from '{state}' in map '{map}' exceeded the limit of {limit}")]
    AutomaticTransitionLoop {
        state: String,
        map: String,
        limit: usize,
    },

    /// A pop would enter a state the exposed map does not contain.
    #[error("pop target '{state}' is not a state of map '{map}'")]
    PopTargetNotInMap { state: String, map: String },

    /// A pop was attempted while only the default map is active.
    #[error("cannot pop from state '{state}': the default map is the only active map")]
    PopFromDefaultMap { state: String },

    /// An initial state or restored position does not fit the definition.
    #[error("invalid position: {reason}")]
    InvalidPosition { reason: String },

    /// A definition with timeouts or suspending actions was handed to the
    /// blocking engine, which can honour neither.
    #[error("definition declares timeouts or suspending actions; drive it with AsyncInstance")]
    RequiresAsync,

    /// An action body failed.
    #[error("action failed: {0}")]
    Action(#[source] ActionError),

    #[error("restore failed: {0}")]
    Restore(#[from] RestoreError),
}

impl FsmError {
    /// Returns whether this error means the definition itself is defective
    /// rather than the event being unacceptable right now.
    pub fn is_configuration_defect(&self) -> bool {
        matches!(
            self,
            FsmError::AutomaticTransitionLoop { .. }
                | FsmError::PopTargetNotInMap { .. }
                | FsmError::PopFromDefaultMap { .. }
                | FsmError::RequiresAsync
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_event_message_names_everything() {
        let err = FsmError::IllegalEvent {
            state: "LOCKED".to_string(),
            event: "PASS".to_string(),
            map: "default".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "illegal event 'PASS' in state 'LOCKED' of map 'default'"
        );
        assert!(!err.is_configuration_defect());
    }

    #[test]
    fn loop_is_a_configuration_defect() {
        let err = FsmError::AutomaticTransitionLoop {
            state: "A".to_string(),
            map: "default".to_string(),
            limit: 3,
        };
        assert!(err.is_configuration_defect());
    }

    #[test]
    fn action_error_keeps_source() {
        let err = FsmError::Action("jammed".into());
        assert_eq!(err.to_string(), "action failed: jammed");
        assert!(std::error::Error::source(&err).is_some());
    }
}
