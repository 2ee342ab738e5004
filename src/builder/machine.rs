//! Builder for constructing state machine definitions.

use crate::builder::error::{BuildError, ConfigurationError};
use crate::builder::map::{check, Check, StateMapBuilder};
use crate::builder::transition::{TimeoutBuilder, TransitionBuilder};
use crate::config::EngineConfig;
use crate::core::{
    ActionResult, DefaultActionFn, Event, HookFn, InitialStateFn, Invariant, State, StateChangeFn,
};
use crate::definition::{
    AsyncStateMachineDefinition, InitialState, StateMachineDefinition, DEFAULT_STATE_MAP,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use stillwater::validation::Validation;

/// Accumulates transition rules, hooks and invariants, then freezes them.
///
/// `build` consumes the builder, so a frozen definition can never be changed
/// through it. Every defect is reported at once in the returned
/// [`BuildError`].
///
/// # Example
///
/// ```rust
/// use statemaps::builder::{StateMachineBuilder, TransitionBuilder};
/// use statemaps::{event_enum, state_enum};
///
/// state_enum! {
///     enum Light { Off, On }
/// }
/// event_enum! {
///     enum Switch { Flip }
/// }
///
/// let definition = StateMachineBuilder::<Light, Switch, u32>::new(Light::ALL.iter().copied())
///     .initial(Light::Off)
///     .transition(
///         TransitionBuilder::on(Light::Off, Switch::Flip)
///             .to(Light::On)
///             .action(|flips, _| {
///                 *flips += 1;
///                 Ok(None)
///             }),
///     )
///     .transition(TransitionBuilder::on(Light::On, Switch::Flip).to(Light::Off))
///     .build()
///     .unwrap();
///
/// assert_eq!(definition.state_maps().len(), 1);
/// ```
pub struct StateMachineBuilder<S, E, C, A = (), R = ()> {
    default_map: StateMapBuilder<S, E, C, A, R>,
    named_maps: Vec<StateMapBuilder<S, E, C, A, R>>,
    initial: Option<InitialState<S, C>>,
    default_entry: Option<HookFn<S, C, A>>,
    default_exit: Option<HookFn<S, C, A>>,
    default_action: Option<DefaultActionFn<S, E, C, A, R>>,
    on_state_change: Option<StateChangeFn<S, C>>,
    invariants: Vec<Invariant<C>>,
    config: EngineConfig,
}

impl<S: State, E: Event, C: 'static, A: 'static, R: 'static> StateMachineBuilder<S, E, C, A, R> {
    /// Create a builder whose default map contains `states`.
    pub fn new(states: impl IntoIterator<Item = S>) -> Self {
        Self {
            default_map: StateMapBuilder::new(DEFAULT_STATE_MAP, states),
            named_maps: Vec::new(),
            initial: None,
            default_entry: None,
            default_exit: None,
            default_action: None,
            on_state_change: None,
            invariants: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    /// Set a constant initial state.
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(InitialState::Fixed(state));
        self
    }

    /// Derive the initial state from the context on first creation.
    pub fn initial_with<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&C) -> S + Send + Sync + 'static,
    {
        let resolver: InitialStateFn<S, C> = Arc::new(resolver);
        self.initial = Some(InitialState::Resolver(resolver));
        self
    }

    /// Add a transition to the default map.
    pub fn transition(mut self, builder: TransitionBuilder<S, E, C, A, R>) -> Self {
        self.default_map = self.default_map.transition(builder);
        self
    }

    /// Add multiple transitions to the default map at once.
    pub fn transitions(
        mut self,
        builders: impl IntoIterator<Item = TransitionBuilder<S, E, C, A, R>>,
    ) -> Self {
        self.default_map = self.default_map.transitions(builders);
        self
    }

    pub fn on_entry<F>(mut self, state: S, hook: F) -> Self
    where
        F: Fn(&mut C, &S, &S, Option<&A>) + Send + Sync + 'static,
    {
        self.default_map = self.default_map.on_entry(state, hook);
        self
    }

    pub fn on_exit<F>(mut self, state: S, hook: F) -> Self
    where
        F: Fn(&mut C, &S, &S, Option<&A>) + Send + Sync + 'static,
    {
        self.default_map = self.default_map.on_exit(state, hook);
        self
    }

    /// Add a timeout to the default map. Requires `build_async`.
    pub fn timeout(mut self, builder: TimeoutBuilder<S, C, A, R>) -> Self {
        self.default_map = self.default_map.timeout(builder);
        self
    }

    /// Attach a named map that push transitions can enter.
    pub fn state_map(mut self, map: StateMapBuilder<S, E, C, A, R>) -> Self {
        self.named_maps.push(map);
        self
    }

    /// Entry hook run before any state-specific entry hook.
    pub fn default_entry<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut C, &S, &S, Option<&A>) + Send + Sync + 'static,
    {
        let hook: HookFn<S, C, A> = Arc::new(hook);
        self.default_entry = Some(hook);
        self
    }

    /// Exit hook run before any state-specific exit hook.
    pub fn default_exit<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut C, &S, &S, Option<&A>) + Send + Sync + 'static,
    {
        let hook: HookFn<S, C, A> = Arc::new(hook);
        self.default_exit = Some(hook);
        self
    }

    /// Fallback for events no transition accepts. Without it such events
    /// fail with `FsmError::IllegalEvent`.
    pub fn default_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut C, &S, &E, Option<&A>) -> ActionResult<R> + Send + Sync + 'static,
    {
        let action: DefaultActionFn<S, E, C, A, R> = Arc::new(action);
        self.default_action = Some(action);
        self
    }

    pub fn on_state_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut C, &S, &S) + Send + Sync + 'static,
    {
        let callback: StateChangeFn<S, C> = Arc::new(callback);
        self.on_state_change = Some(callback);
        self
    }

    /// Add a named invariant checked after every committed transition.
    pub fn invariant<F>(mut self, label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.invariants.push(Invariant::new(label, predicate));
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_automatic_transitions(mut self, max: usize) -> Self {
        self.config.max_automatic_transitions = max;
        self
    }

    /// Freeze into a definition for the blocking [`Instance`].
    ///
    /// Suspending actions and timeouts are rejected; use
    /// [`build_async`](Self::build_async) for those.
    ///
    /// [`Instance`]: crate::instance::Instance
    pub fn build(self) -> Result<StateMachineDefinition<S, E, C, A, R>, BuildError> {
        self.freeze(false)
    }

    /// Freeze into a definition for the [`AsyncInstance`].
    ///
    /// [`AsyncInstance`]: crate::asynchronous::AsyncInstance
    pub fn build_async(self) -> Result<AsyncStateMachineDefinition<S, E, C, A, R>, BuildError> {
        self.freeze(true).map(AsyncStateMachineDefinition::new)
    }

    fn freeze(self, allow_async: bool) -> Result<StateMachineDefinition<S, E, C, A, R>, BuildError> {
        let mut checks: Vec<Check> = Vec::new();

        let mut all_maps: HashMap<String, HashSet<S>> = HashMap::new();
        all_maps.insert(
            DEFAULT_STATE_MAP.to_string(),
            self.default_map.states.iter().cloned().collect(),
        );
        for map in &self.named_maps {
            checks.push(check(map.name != DEFAULT_STATE_MAP, || {
                ConfigurationError::ReservedMapName {
                    name: map.name.clone(),
                }
            }));
            if map.name == DEFAULT_STATE_MAP {
                continue;
            }
            let duplicate = all_maps
                .insert(map.name.clone(), map.states.iter().cloned().collect())
                .is_some();
            checks.push(check(!duplicate, || ConfigurationError::DuplicateStateMap {
                name: map.name.clone(),
            }));
        }

        let default_states = &all_maps[DEFAULT_STATE_MAP];
        match &self.initial {
            None => checks.push(Validation::fail(ConfigurationError::MissingInitialState)),
            Some(InitialState::Fixed(state)) => {
                checks.push(check(default_states.contains(state), || {
                    ConfigurationError::InitialStateNotInDefaultMap {
                        state: state.name().to_string(),
                    }
                }))
            }
            Some(InitialState::Resolver(_)) => {}
        }

        let default_map = self.default_map.freeze(&all_maps, allow_async, &mut checks);
        let mut named_maps = HashMap::new();
        for map in self.named_maps {
            if map.name == DEFAULT_STATE_MAP {
                continue;
            }
            let frozen = map.freeze(&all_maps, allow_async, &mut checks);
            named_maps.insert(frozen.name().to_string(), frozen);
        }

        match (Validation::all_vec(checks), self.initial) {
            (Validation::Success(_), Some(initial)) => {
                tracing::debug!(
                    "state machine definition frozen: {} named maps, {} invariants",
                    named_maps.len(),
                    self.invariants.len()
                );
                Ok(StateMachineDefinition {
                    default_map,
                    named_maps,
                    initial,
                    default_entry: self.default_entry,
                    default_exit: self.default_exit,
                    default_action: self.default_action,
                    on_state_change: self.on_state_change,
                    invariants: self.invariants,
                    config: self.config,
                })
            }
            (Validation::Success(_), None) => {
                Err(BuildError::new(vec![ConfigurationError::MissingInitialState]))
            }
            (Validation::Failure(errors), _) => {
                Err(BuildError::new(errors.iter().cloned().collect()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StateMapBuilder;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum Phase {
        Idle,
        Busy,
        Paused,
        Nested,
    }

    impl State for Phase {
        fn name(&self) -> &str {
            match self {
                Self::Idle => "Idle",
                Self::Busy => "Busy",
                Self::Paused => "Paused",
                Self::Nested => "Nested",
            }
        }
    }

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Signal {
        Go,
        Stop,
    }

    impl Event for Signal {
        fn name(&self) -> &str {
            match self {
                Self::Go => "Go",
                Self::Stop => "Stop",
            }
        }
    }

    type Builder = StateMachineBuilder<Phase, Signal, u32>;
    type Rule = TransitionBuilder<Phase, Signal, u32>;

    fn base() -> Builder {
        Builder::new([Phase::Idle, Phase::Busy, Phase::Paused]).initial(Phase::Idle)
    }

    #[test]
    fn builder_requires_initial_state() {
        let result = Builder::new([Phase::Idle]).build();

        let err = result.err().unwrap();
        assert!(err.contains(&ConfigurationError::MissingInitialState));
    }

    #[test]
    fn minimal_definition_builds() {
        let definition = base()
            .transition(Rule::on(Phase::Idle, Signal::Go).to(Phase::Busy))
            .build()
            .unwrap();

        assert_eq!(definition.initial_state(&0), Phase::Idle);
        assert!(definition.default_map().contains(&Phase::Busy));
    }

    #[test]
    fn duplicate_unguarded_transition_is_rejected() {
        let err = base()
            .transition(Rule::on(Phase::Idle, Signal::Go).to(Phase::Busy))
            .transition(Rule::on(Phase::Idle, Signal::Go).to(Phase::Paused))
            .build()
            .err()
            .unwrap();

        assert!(err.contains(&ConfigurationError::DuplicateTransition {
            map: "default".to_string(),
            state: "Idle".to_string(),
            event: "Go".to_string(),
        }));
    }

    #[test]
    fn guarded_candidates_may_share_a_pair() {
        let result = base()
            .transition(
                Rule::on(Phase::Idle, Signal::Go)
                    .to(Phase::Busy)
                    .when(|n, _| *n > 0),
            )
            .transition(
                Rule::on(Phase::Idle, Signal::Go)
                    .to(Phase::Paused)
                    .when(|n, _| *n > 10),
            )
            .transition(Rule::on(Phase::Idle, Signal::Go))
            .build();

        assert!(result.is_ok());
    }

    #[test]
    fn push_to_unknown_map_is_rejected() {
        let err = base()
            .transition(Rule::on(Phase::Idle, Signal::Go).push("missing", Phase::Nested))
            .build()
            .err()
            .unwrap();

        assert!(err.contains(&ConfigurationError::UnknownStateMap {
            map: "default".to_string(),
            target_map: "missing".to_string(),
        }));
    }

    #[test]
    fn push_target_must_belong_to_map() {
        let err = base()
            .transition(Rule::on(Phase::Idle, Signal::Go).push("inner", Phase::Busy))
            .state_map(StateMapBuilder::new("inner", [Phase::Nested]))
            .build()
            .err()
            .unwrap();

        assert!(err.contains(&ConfigurationError::PushTargetNotInMap {
            target_map: "inner".to_string(),
            state: "Busy".to_string(),
        }));
    }

    #[test]
    fn automatic_target_outside_map_is_rejected() {
        let err = base()
            .transition(Rule::automatic(Phase::Busy).to(Phase::Nested))
            .build()
            .err()
            .unwrap();

        assert!(err.contains(&ConfigurationError::StateNotInMap {
            map: "default".to_string(),
            state: "Nested".to_string(),
        }));
    }

    #[test]
    fn pop_in_default_map_is_rejected() {
        let err = base()
            .transition(Rule::on(Phase::Busy, Signal::Stop).pop())
            .build()
            .err()
            .unwrap();

        assert!(err.contains(&ConfigurationError::PopInDefaultMap {
            state: "Busy".to_string(),
        }));
    }

    #[test]
    fn push_into_default_map_is_rejected() {
        let err = base()
            .transition(Rule::on(Phase::Busy, Signal::Stop).push("default", Phase::Idle))
            .build()
            .err()
            .unwrap();

        assert!(err.contains(&ConfigurationError::PushToDefaultMap {
            map: "default".to_string(),
            state: "Idle".to_string(),
        }));
    }

    #[test]
    fn reserved_and_duplicate_map_names_are_rejected() {
        let err = base()
            .state_map(StateMapBuilder::new("default", [Phase::Nested]))
            .state_map(StateMapBuilder::new("inner", [Phase::Nested]))
            .state_map(StateMapBuilder::new("inner", [Phase::Nested]))
            .build()
            .err()
            .unwrap();

        assert!(err.contains(&ConfigurationError::ReservedMapName {
            name: "default".to_string()
        }));
        assert!(err.contains(&ConfigurationError::DuplicateStateMap {
            name: "inner".to_string()
        }));
    }

    #[test]
    fn all_problems_are_reported_together() {
        let err = Builder::new([Phase::Idle])
            .transition(Rule::on(Phase::Idle, Signal::Go).to(Phase::Busy))
            .transition(Rule::default_on(Signal::Stop).when(|_, _| true))
            .build()
            .err()
            .unwrap();

        assert_eq!(err.errors().len(), 3);
        assert!(err.contains(&ConfigurationError::MissingInitialState));
        assert!(err.contains(&ConfigurationError::GuardedDefault {
            map: "default".to_string(),
            event: "Stop".to_string(),
        }));
    }

    #[test]
    fn blocking_build_rejects_timeouts() {
        let builder = || {
            base().timeout(TimeoutBuilder::new(
                Phase::Busy,
                Duration::from_millis(10),
                Phase::Idle,
            ))
        };

        let err = builder().build().err().unwrap();
        assert!(matches!(
            err.errors()[0],
            ConfigurationError::RequiresAsync { .. }
        ));
        assert!(builder().build_async().is_ok());
    }

    #[test]
    fn blocking_build_rejects_suspending_actions() {
        let builder = || {
            base().transition(
                Rule::on(Phase::Idle, Signal::Go)
                    .to(Phase::Busy)
                    .action_async(|n, _| {
                        Box::pin(async move {
                            *n += 1;
                            Ok(None)
                        })
                    }),
            )
        };

        assert!(builder().build().is_err());
        assert!(builder().build_async().is_ok());
    }

    #[test]
    fn initial_state_must_be_in_default_map() {
        let err = Builder::new([Phase::Idle])
            .initial(Phase::Busy)
            .build()
            .err()
            .unwrap();

        assert!(err.contains(&ConfigurationError::InitialStateNotInDefaultMap {
            state: "Busy".to_string(),
        }));
    }
}
