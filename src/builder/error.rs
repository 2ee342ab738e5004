//! Build errors for state machine definitions.

use thiserror::Error;

/// A single defect found while freezing a definition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Initial state not specified. Call .initial(state) or .initial_with(resolver) before .build()")]
    MissingInitialState,

    #[error("Initial state '{state}' is not a state of the default map")]
    InitialStateNotInDefaultMap { state: String },

    #[error("State map name '{name}' is reserved")]
    ReservedMapName { name: String },

    #[error("State map '{name}' declared more than once")]
    DuplicateStateMap { name: String },

    #[error("State map '{name}' declares no states")]
    EmptyStateMap { name: String },

    #[error("State '{state}' is not a state of map '{map}'")]
    StateNotInMap { map: String, state: String },

    #[error("Unguarded transition for '{event}' in state '{state}' of map '{map}' declared more than once")]
    DuplicateTransition {
        map: String,
        state: String,
        event: String,
    },

    #[error("Unguarded automatic transition from '{state}' in map '{map}' declared more than once")]
    DuplicateAutomatic { map: String, state: String },

    #[error("Default transition for '{event}' in map '{map}' declared more than once")]
    DuplicateDefault { map: String, event: String },

    #[error("Default transition for '{event}' in map '{map}' cannot have a guard")]
    GuardedDefault { map: String, event: String },

    #[error("Timeout for state '{state}' in map '{map}' declared more than once")]
    DuplicateTimeout { map: String, state: String },

    #[error("{hook} hook for state '{state}' in map '{map}' declared more than once")]
    DuplicateHook {
        map: String,
        state: String,
        hook: &'static str,
    },

    #[error("Push from map '{map}' targets undeclared map '{target_map}'")]
    UnknownStateMap { map: String, target_map: String },

    #[error("Push target '{state}' is not a state of map '{target_map}'")]
    PushTargetNotInMap { target_map: String, state: String },

    #[error("Push from map '{map}' targets the default map, which can never be popped")]
    PushToDefaultMap { map: String, state: String },

    #[error("Pop from state '{state}' declared in the default map")]
    PopInDefaultMap { state: String },

    #[error("{what} in map '{map}' needs build_async()")]
    RequiresAsync { map: String, what: String },
}

/// Every defect found by a single `build()` call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid state machine definition: {}", summarize(.errors))]
pub struct BuildError {
    errors: Vec<ConfigurationError>,
}

impl BuildError {
    pub(crate) fn new(errors: Vec<ConfigurationError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[ConfigurationError] {
        &self.errors
    }

    pub fn contains(&self, error: &ConfigurationError) -> bool {
        self.errors.contains(error)
    }
}

fn summarize(errors: &[ConfigurationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
