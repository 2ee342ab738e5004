//! Frozen state machine definition and the transition resolution algorithm.

use crate::config::EngineConfig;
use crate::core::{
    DefaultActionFn, Event, HookFn, InitialStateFn, Invariant, State, StateChangeFn,
};
use crate::definition::map::{StateMapDefinition, DEFAULT_STATE_MAP};
use crate::definition::transition::Transition;
use std::collections::HashMap;
use std::ops::Deref;

/// How the first state of a fresh instance is chosen.
pub enum InitialState<S, C> {
    Fixed(S),
    Resolver(InitialStateFn<S, C>),
}

/// Immutable transition table shared by every instance.
///
/// Produced by [`StateMachineBuilder::build`]; there is no way to mutate it
/// afterwards. It is `Send + Sync` and can be shared by reference or `Arc`.
///
/// [`StateMachineBuilder::build`]: crate::builder::StateMachineBuilder::build
pub struct StateMachineDefinition<S, E, C, A = (), R = ()> {
    pub(crate) default_map: StateMapDefinition<S, E, C, A, R>,
    pub(crate) named_maps: HashMap<String, StateMapDefinition<S, E, C, A, R>>,
    pub(crate) initial: InitialState<S, C>,
    pub(crate) default_entry: Option<HookFn<S, C, A>>,
    pub(crate) default_exit: Option<HookFn<S, C, A>>,
    pub(crate) default_action: Option<DefaultActionFn<S, E, C, A, R>>,
    pub(crate) on_state_change: Option<StateChangeFn<S, C>>,
    pub(crate) invariants: Vec<Invariant<C>>,
    pub(crate) config: EngineConfig,
}

impl<S: State, E: Event, C, A, R> StateMachineDefinition<S, E, C, A, R> {
    pub fn default_map(&self) -> &StateMapDefinition<S, E, C, A, R> {
        &self.default_map
    }

    /// Look up a map by name; the reserved default name returns the base map.
    pub fn map(&self, name: &str) -> Option<&StateMapDefinition<S, E, C, A, R>> {
        if name == DEFAULT_STATE_MAP {
            Some(&self.default_map)
        } else {
            self.named_maps.get(name)
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn invariants(&self) -> &[Invariant<C>] {
        &self.invariants
    }

    pub fn has_default_action(&self) -> bool {
        self.default_action.is_some()
    }

    /// Initial state for a fresh instance over `context`.
    pub fn initial_state(&self, context: &C) -> S {
        match &self.initial {
            InitialState::Fixed(state) => state.clone(),
            InitialState::Resolver(resolve) => resolve(context),
        }
    }

    /// Determine the transition `event` triggers in `state` of map `map`.
    ///
    /// 1. The map's (state, event) rules: first accepting guard, then fallback.
    /// 2. The map's default transition for the event.
    /// 3. For a named map, the default map's default transition for the event.
    ///
    /// Returns `None` when nothing applies.
    pub fn resolve(
        &self,
        map: &str,
        state: &S,
        event: &E,
        context: &C,
        arg: Option<&A>,
    ) -> Option<&Transition<S, C, A, R>> {
        let active = self.map(map)?;

        let selected = active
            .rules_for(state, event)
            .and_then(|rules| rules.select(context, arg))
            .or_else(|| active.default_for(event))
            .or_else(|| {
                if active.is_default() {
                    None
                } else {
                    self.default_map.default_for(event)
                }
            });

        tracing::trace!(
            "resolve {}/{} on {}: {}",
            map,
            state.name(),
            event.name(),
            if selected.is_some() { "matched" } else { "no transition" }
        );
        selected
    }

    /// Determine the automatic transition, if any, leaving `state` of `map`.
    pub fn resolve_automatic(
        &self,
        map: &str,
        state: &S,
        context: &C,
        arg: Option<&A>,
    ) -> Option<&Transition<S, C, A, R>> {
        self.map(map)?
            .automatic_for(state)
            .and_then(|rules| rules.select(context, arg))
    }

    /// Whether any action or timeout needs the async engine.
    pub fn requires_async(&self) -> bool {
        self.maps().any(|map| {
            !map.timeouts.is_empty()
                || map
                    .transition_rules
                    .values()
                    .chain(map.automatic_transitions.values())
                    .flat_map(|rules| rules.iter())
                    .chain(map.default_transitions.values())
                    .any(|t| t.action.as_ref().is_some_and(|a| a.is_suspending()))
        })
    }

    /// Default map first, then named maps.
    pub(crate) fn maps(&self) -> impl Iterator<Item = &StateMapDefinition<S, E, C, A, R>> {
        std::iter::once(&self.default_map).chain(self.named_maps.values())
    }
}

/// Definition accepted by [`AsyncInstance`]: may contain suspending actions
/// and timeouts.
///
/// [`AsyncInstance`]: crate::asynchronous::AsyncInstance
pub struct AsyncStateMachineDefinition<S, E, C, A = (), R = ()> {
    inner: StateMachineDefinition<S, E, C, A, R>,
}

impl<S, E, C, A, R> AsyncStateMachineDefinition<S, E, C, A, R> {
    pub(crate) fn new(inner: StateMachineDefinition<S, E, C, A, R>) -> Self {
        Self { inner }
    }
}

impl<S, E, C, A, R> Deref for AsyncStateMachineDefinition<S, E, C, A, R> {
    type Target = StateMachineDefinition<S, E, C, A, R>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
