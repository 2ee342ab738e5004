//! Core types shared by definitions and instances.
//!
//! This module contains the building blocks every transition table is made of:
//! - State and Event traits with explicit display labels
//! - Guard predicates for transition selection
//! - Actions and lifecycle hook signatures
//! - Context invariants
//!
//! Guards and invariants are pure; only actions and hooks touch the context
//! mutably.

mod action;
mod guard;
mod invariant;
mod state;

pub use action::{
    Action, ActionError, ActionResult, BlockingFn, BoxFuture, DefaultActionFn, HookFn,
    InitialStateFn, StateChangeFn, SuspendingFn,
};
pub use guard::Guard;
pub use invariant::{first_violation, Invariant};
pub use state::{Event, State};
