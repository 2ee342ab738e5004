//! Frozen transition tables and the resolution algorithm.
//!
//! A [`StateMachineDefinition`] is built once by the builder and then shared,
//! read-only, by every instance. It holds the default map plus any named
//! maps, the global hooks, and the invariants.

mod machine;
mod map;
mod transition;
mod view;

pub use machine::{AsyncStateMachineDefinition, InitialState, StateMachineDefinition};
pub use map::{StateMapDefinition, TimeoutDefinition, DEFAULT_STATE_MAP};
pub use transition::{Transition, TransitionKind, TransitionRules, TransitionType};
pub use view::{StateMapView, TransitionView};
