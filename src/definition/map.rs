//! A single named transition table.

use crate::core::{Action, Event, Guard, HookFn, State};
use crate::definition::transition::{Transition, TransitionKind, TransitionRules};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Reserved name of the base map every instance starts in.
pub const DEFAULT_STATE_MAP: &str = "default";

/// Deferred automatic transition armed on entry into a state.
pub struct TimeoutDefinition<S, C, A, R> {
    pub(crate) target: S,
    pub(crate) duration: Duration,
    pub(crate) guard: Option<Guard<C, A>>,
    pub(crate) action: Option<Action<C, A, R>>,
}

impl<S, C, A, R> TimeoutDefinition<S, C, A, R> {
    pub fn target(&self) -> &S {
        &self.target
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }

    /// Whether the timer may fire given the context at expiry.
    pub(crate) fn accepts(&self, context: &C) -> bool {
        self.guard.as_ref().map_or(true, |guard| guard.check(context, None))
    }
}

impl<S: State, C, A, R> TimeoutDefinition<S, C, A, R> {
    /// The automatic transition executed when the timer fires.
    pub(crate) fn to_transition(&self) -> Transition<S, C, A, R> {
        let mut transition = Transition::new(TransitionKind::Simple {
            target: Some(self.target.clone()),
        });
        transition.action = self.action.clone();
        transition.automatic = true;
        transition
    }
}

/// Scoped transition table: valid states, per-(state, event) rules,
/// per-event defaults, automatics, hooks and timeouts.
pub struct StateMapDefinition<S, E, C, A, R> {
    pub(crate) name: String,
    pub(crate) valid_states: HashSet<S>,
    pub(crate) transition_rules: HashMap<(S, E), TransitionRules<S, C, A, R>>,
    pub(crate) default_transitions: HashMap<E, Transition<S, C, A, R>>,
    pub(crate) automatic_transitions: HashMap<S, TransitionRules<S, C, A, R>>,
    pub(crate) entry_hooks: HashMap<S, HookFn<S, C, A>>,
    pub(crate) exit_hooks: HashMap<S, HookFn<S, C, A>>,
    pub(crate) timeouts: HashMap<S, TimeoutDefinition<S, C, A, R>>,
}

impl<S: State, E: Event, C, A, R> StateMapDefinition<S, E, C, A, R> {
    pub(crate) fn new(name: String, valid_states: HashSet<S>) -> Self {
        Self {
            name,
            valid_states,
            transition_rules: HashMap::new(),
            default_transitions: HashMap::new(),
            automatic_transitions: HashMap::new(),
            entry_hooks: HashMap::new(),
            exit_hooks: HashMap::new(),
            timeouts: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_STATE_MAP
    }

    pub fn valid_states(&self) -> &HashSet<S> {
        &self.valid_states
    }

    pub fn contains(&self, state: &S) -> bool {
        self.valid_states.contains(state)
    }

    pub fn rules_for(&self, state: &S, event: &E) -> Option<&TransitionRules<S, C, A, R>> {
        // HashMap<(S, E), _> cannot be queried with a pair of references.
        self.transition_rules.get(&(state.clone(), event.clone()))
    }

    pub fn default_for(&self, event: &E) -> Option<&Transition<S, C, A, R>> {
        self.default_transitions.get(event)
    }

    pub fn automatic_for(&self, state: &S) -> Option<&TransitionRules<S, C, A, R>> {
        self.automatic_transitions.get(state)
    }

    pub fn timeout_for(&self, state: &S) -> Option<&TimeoutDefinition<S, C, A, R>> {
        self.timeouts.get(state)
    }

    pub(crate) fn entry_hook(&self, state: &S) -> Option<&HookFn<S, C, A>> {
        self.entry_hooks.get(state)
    }

    pub(crate) fn exit_hook(&self, state: &S) -> Option<&HookFn<S, C, A>> {
        self.exit_hooks.get(state)
    }

    /// Events with at least one declared transition from `state`.
    pub fn events_from<'a>(&'a self, state: &'a S) -> impl Iterator<Item = &'a E> + 'a {
        self.transition_rules
            .keys()
            .filter(move |(source, _)| source == state)
            .map(|(_, event)| event)
    }

    pub fn default_events(&self) -> impl Iterator<Item = &E> {
        self.default_transitions.keys()
    }
}
