//! Statemaps: an embeddable finite state machine engine
//!
//! A machine is declared once with a fluent builder and frozen into an
//! immutable [`StateMachineDefinition`] that any number of instances share.
//! Instances own only their position (current state and map stack) and work
//! on a caller supplied context.
//!
//! # Core Concepts
//!
//! - **Transitions**: guarded rules tried in declaration order, with an
//!   unguarded fallback, per-map defaults and automatic transitions
//! - **State maps**: named transition tables entered with push and left with pop
//! - **Hooks**: entry/exit per state, global defaults and a state-change callback
//! - **Invariants**: context predicates checked after every step
//! - **Snapshots**: [`ExternalState`] persists and restores a position
//! - **Async**: [`AsyncInstance`] adds suspending actions and per-state timeouts
//!
//! # Example
//!
//! ```rust
//! use statemaps::{event_enum, state_enum, Instance, StateMachineBuilder, TransitionBuilder};
//!
//! state_enum! {
//!     enum Turnstile { Locked, Unlocked }
//! }
//!
//! event_enum! {
//!     enum Input { Coin, Push }
//! }
//!
//! #[derive(Default)]
//! struct Gate {
//!     coins: u32,
//! }
//!
//! let definition = StateMachineBuilder::<Turnstile, Input, Gate>::new(Turnstile::ALL.iter().copied())
//!     .initial(Turnstile::Locked)
//!     .transition(
//!         TransitionBuilder::on(Turnstile::Locked, Input::Coin)
//!             .to(Turnstile::Unlocked)
//!             .action(|gate: &mut Gate, _| {
//!                 gate.coins += 1;
//!                 Ok(None)
//!             }),
//!     )
//!     .transition(TransitionBuilder::on(Turnstile::Unlocked, Input::Push).to(Turnstile::Locked))
//!     .build()
//!     .unwrap();
//!
//! let mut gate = Gate::default();
//! let mut turnstile = Instance::create(&definition, &mut gate).unwrap();
//! turnstile.send_event(Input::Coin).unwrap();
//! turnstile.send_event(Input::Push).unwrap();
//!
//! assert_eq!(turnstile.current_state(), &Turnstile::Locked);
//! assert!(turnstile.send_event(Input::Push).is_err());
//! assert_eq!(gate.coins, 1);
//! ```

pub mod asynchronous;
pub mod builder;
pub mod config;
pub mod core;
pub mod definition;
pub mod error;
pub mod instance;

// Re-export commonly used types
pub use asynchronous::AsyncInstance;
pub use builder::{
    BuildError, ConfigurationError, StateMachineBuilder, StateMapBuilder, TimeoutBuilder,
    TransitionBuilder,
};
pub use config::EngineConfig;
pub use core::{Action, ActionError, ActionResult, Event, Guard, Invariant, State};
pub use definition::{
    AsyncStateMachineDefinition, StateMachineDefinition, TransitionType, DEFAULT_STATE_MAP,
};
pub use error::FsmError;
pub use instance::{ExternalState, Instance, RestoreError};
