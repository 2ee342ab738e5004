//! Async engine.
//!
//! [`AsyncInstance`] runs definitions built with
//! [`build_async`](crate::builder::StateMachineBuilder::build_async). Actions
//! may suspend, and states may declare timeouts that fire an automatic
//! transition after a delay unless the state is left first.

mod instance;
mod timer;

pub use instance::AsyncInstance;
