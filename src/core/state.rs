//! State and Event traits for state machine definitions.
//!
//! States and events are opaque, comparable values. Both carry an explicit
//! `name()` label used for logging, error messages and diagram views, so the
//! engine never relies on incidental string conversion.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state machine states.
///
/// # Required Traits
///
/// - `Clone` + `Eq` + `Hash`: states are keys in transition tables
/// - `Debug`: states must be debuggable for diagnostics
/// - `Serialize` + `Deserialize`: states are part of an [`ExternalState`] snapshot
///
/// [`ExternalState`]: crate::instance::ExternalState
///
/// # Example
///
/// ```rust
/// use statemaps::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum DoorState {
///     Open,
///     Closed,
///     Locked,
/// }
///
/// impl State for DoorState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///             Self::Locked => "Locked",
///         }
///     }
/// }
///
/// assert_eq!(DoorState::Locked.name(), "Locked");
/// assert!(!DoorState::Locked.is_final());
/// ```
pub trait State:
    Clone + Eq + Hash + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Display label for logging and diagram output.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// Informational only: the engine does not refuse events in a final
    /// state, but views and callers may use it.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }
}

/// Trait for events that drive a state machine.
///
/// Events are never persisted, so unlike [`State`] they need no serde bounds.
pub trait Event: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Display label for logging and diagram output.
    fn name(&self) -> &str;
}
