//! Builder API for declaring state machine definitions.
//!
//! Builders accumulate transitions, hooks, invariants and timeouts with a
//! fluent API, then freeze everything into an immutable
//! [`StateMachineDefinition`](crate::definition::StateMachineDefinition).
//! Validation happens once, in `build`, and reports every problem found.

pub mod error;
pub mod machine;
pub mod macros;
pub mod map;
pub mod transition;

pub use error::{BuildError, ConfigurationError};
pub use machine::StateMachineBuilder;
pub use map::StateMapBuilder;
pub use transition::{TimeoutBuilder, TransitionBuilder};
