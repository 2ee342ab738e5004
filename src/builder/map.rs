//! Builder for a single state map and its conversion into a frozen table.

use crate::builder::error::ConfigurationError;
use crate::builder::transition::{TimeoutBuilder, TransitionBuilder, Trigger};
use crate::core::{Event, HookFn, State};
use crate::definition::{StateMapDefinition, TransitionKind, TransitionRules, DEFAULT_STATE_MAP};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

pub(crate) type Check = Validation<(), NonEmptyVec<ConfigurationError>>;

pub(crate) fn check(ok: bool, error: impl FnOnce() -> ConfigurationError) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(error())
    }
}

/// Builder for a named map: its valid states, transitions, hooks and timeouts.
///
/// The default map is configured directly on
/// [`StateMachineBuilder`](crate::builder::StateMachineBuilder); named maps are
/// built here and attached with `state_map`.
pub struct StateMapBuilder<S, E, C, A = (), R = ()> {
    pub(crate) name: String,
    pub(crate) states: Vec<S>,
    transitions: Vec<TransitionBuilder<S, E, C, A, R>>,
    entry_hooks: Vec<(S, HookFn<S, C, A>)>,
    exit_hooks: Vec<(S, HookFn<S, C, A>)>,
    timeouts: Vec<TimeoutBuilder<S, C, A, R>>,
}

impl<S: State, E: Event, C: 'static, A: 'static, R: 'static> StateMapBuilder<S, E, C, A, R> {
    pub fn new(name: impl Into<String>, states: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            states: states.into_iter().collect(),
            transitions: Vec::new(),
            entry_hooks: Vec::new(),
            exit_hooks: Vec::new(),
            timeouts: Vec::new(),
        }
    }

    pub fn transition(mut self, builder: TransitionBuilder<S, E, C, A, R>) -> Self {
        self.transitions.push(builder);
        self
    }

    pub fn transitions(
        mut self,
        builders: impl IntoIterator<Item = TransitionBuilder<S, E, C, A, R>>,
    ) -> Self {
        self.transitions.extend(builders);
        self
    }

    /// Hook run after entering `state` in this map: `(context, from, to, arg)`.
    pub fn on_entry<F>(mut self, state: S, hook: F) -> Self
    where
        F: Fn(&mut C, &S, &S, Option<&A>) + Send + Sync + 'static,
    {
        let hook: HookFn<S, C, A> = Arc::new(hook);
        self.entry_hooks.push((state, hook));
        self
    }

    /// Hook run before leaving `state` in this map: `(context, from, to, arg)`.
    pub fn on_exit<F>(mut self, state: S, hook: F) -> Self
    where
        F: Fn(&mut C, &S, &S, Option<&A>) + Send + Sync + 'static,
    {
        let hook: HookFn<S, C, A> = Arc::new(hook);
        self.exit_hooks.push((state, hook));
        self
    }

    pub fn timeout(mut self, builder: TimeoutBuilder<S, C, A, R>) -> Self {
        self.timeouts.push(builder);
        self
    }

    /// Freeze into a table, recording every defect in `checks`.
    ///
    /// `all_maps` holds the valid states of every declared map so push
    /// targets can be verified.
    pub(crate) fn freeze(
        self,
        all_maps: &HashMap<String, HashSet<S>>,
        allow_async: bool,
        checks: &mut Vec<Check>,
    ) -> StateMapDefinition<S, E, C, A, R> {
        let name = self.name;
        let valid_states: HashSet<S> = self.states.into_iter().collect();
        checks.push(check(!valid_states.is_empty(), || {
            ConfigurationError::EmptyStateMap { name: name.clone() }
        }));

        let in_map = |state: &S| -> Check {
            check(valid_states.contains(state), || ConfigurationError::StateNotInMap {
                map: name.clone(),
                state: state.name().to_string(),
            })
        };

        let mut transition_rules: HashMap<(S, E), TransitionRules<S, C, A, R>> = HashMap::new();
        let mut default_transitions = HashMap::new();
        let mut automatic_transitions: HashMap<S, TransitionRules<S, C, A, R>> = HashMap::new();

        for builder in self.transitions {
            let (trigger, transition) = builder.build();

            match &trigger {
                Trigger::Event(state, _) | Trigger::Automatic(state) => checks.push(in_map(state)),
                Trigger::Default(_) => {}
            }

            match transition.kind() {
                TransitionKind::Simple { target: Some(target) }
                | TransitionKind::Default { target: Some(target) } => checks.push(in_map(target)),
                TransitionKind::Simple { target: None } | TransitionKind::Default { target: None } => {}
                TransitionKind::Push { map, target } if map == DEFAULT_STATE_MAP => {
                    checks.push(Validation::fail(ConfigurationError::PushToDefaultMap {
                        map: name.clone(),
                        state: target.name().to_string(),
                    }))
                }
                TransitionKind::Push { map, target } => match all_maps.get(map) {
                    Some(states) => checks.push(check(states.contains(target), || {
                        ConfigurationError::PushTargetNotInMap {
                            target_map: map.clone(),
                            state: target.name().to_string(),
                        }
                    })),
                    None => checks.push(Validation::fail(ConfigurationError::UnknownStateMap {
                        map: name.clone(),
                        target_map: map.clone(),
                    })),
                },
                TransitionKind::Pop { .. } => {
                    let source = match &trigger {
                        Trigger::Event(state, _) | Trigger::Automatic(state) => state.name(),
                        Trigger::Default(event) => event.name(),
                    };
                    checks.push(check(name != DEFAULT_STATE_MAP, || {
                        ConfigurationError::PopInDefaultMap {
                            state: source.to_string(),
                        }
                    }));
                }
            }

            let suspending = transition.action().is_some_and(|a| a.is_suspending());
            checks.push(check(allow_async || !suspending, || {
                ConfigurationError::RequiresAsync {
                    map: name.clone(),
                    what: "suspending action".to_string(),
                }
            }));

            match trigger {
                Trigger::Event(state, event) => {
                    let duplicate = ConfigurationError::DuplicateTransition {
                        map: name.clone(),
                        state: state.name().to_string(),
                        event: event.name().to_string(),
                    };
                    let rules = transition_rules
                        .entry((state, event))
                        .or_insert_with(TransitionRules::new);
                    checks.push(add_rule(rules, transition, duplicate));
                }
                Trigger::Automatic(state) => {
                    let duplicate = ConfigurationError::DuplicateAutomatic {
                        map: name.clone(),
                        state: state.name().to_string(),
                    };
                    let rules = automatic_transitions
                        .entry(state)
                        .or_insert_with(TransitionRules::new);
                    checks.push(add_rule(rules, transition, duplicate));
                }
                Trigger::Default(event) => {
                    checks.push(check(!transition.is_guarded(), || {
                        ConfigurationError::GuardedDefault {
                            map: name.clone(),
                            event: event.name().to_string(),
                        }
                    }));
                    let label = event.name().to_string();
                    let duplicate = default_transitions.insert(event, transition).is_some();
                    checks.push(check(!duplicate, || ConfigurationError::DuplicateDefault {
                        map: name.clone(),
                        event: label,
                    }));
                }
            }
        }

        let mut hooks = |declared: Vec<(S, HookFn<S, C, A>)>, kind: &'static str| {
            let mut frozen = HashMap::new();
            for (state, hook) in declared {
                checks.push(in_map(&state));
                let label = state.name().to_string();
                let duplicate = frozen.insert(state, hook).is_some();
                checks.push(check(!duplicate, || ConfigurationError::DuplicateHook {
                    map: name.clone(),
                    state: label,
                    hook: kind,
                }));
            }
            frozen
        };
        let entry_hooks = hooks(self.entry_hooks, "Entry");
        let exit_hooks = hooks(self.exit_hooks, "Exit");

        let mut timeouts = HashMap::new();
        for builder in self.timeouts {
            let (state, timeout) = builder.build();
            checks.push(in_map(&state));
            checks.push(in_map(timeout.target()));
            checks.push(check(allow_async, || ConfigurationError::RequiresAsync {
                map: name.clone(),
                what: format!("timeout on '{}'", state.name()),
            }));
            let label = state.name().to_string();
            let duplicate = timeouts.insert(state, timeout).is_some();
            checks.push(check(!duplicate, || ConfigurationError::DuplicateTimeout {
                map: name.clone(),
                state: label,
            }));
        }

        let mut map = StateMapDefinition::new(name, valid_states);
        map.transition_rules = transition_rules;
        map.default_transitions = default_transitions;
        map.automatic_transitions = automatic_transitions;
        map.entry_hooks = entry_hooks;
        map.exit_hooks = exit_hooks;
        map.timeouts = timeouts;
        map
    }
}

/// Guarded transitions are appended in order; at most one unguarded
/// transition becomes the fallback.
fn add_rule<S: State, C, A, R>(
    rules: &mut TransitionRules<S, C, A, R>,
    transition: crate::definition::Transition<S, C, A, R>,
    duplicate: ConfigurationError,
) -> Check {
    if transition.is_guarded() {
        rules.guarded.push(transition);
        Validation::success(())
    } else if rules.fallback.is_some() {
        Validation::fail(duplicate)
    } else {
        rules.fallback = Some(transition);
        Validation::success(())
    }
}
