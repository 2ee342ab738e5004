//! Read-only traversal of a frozen definition for diagram exporters.

use crate::core::{Event, State};
use crate::definition::machine::{InitialState, StateMachineDefinition};
use crate::definition::map::StateMapDefinition;
use crate::definition::transition::{Transition, TransitionType};
use std::time::Duration;

/// One edge of a state map, flattened for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionView<S, E> {
    /// Source state; `None` for map defaults and the start edge.
    pub source: Option<S>,
    /// Triggering event; `None` for automatic, timeout and start edges.
    pub event: Option<E>,
    /// Target state; `None` for internal transitions and pops back to the
    /// remembered state.
    pub target: Option<S>,
    pub target_map: Option<String>,
    pub transition_type: TransitionType,
    pub automatic: bool,
    pub guarded: bool,
    /// Delay for timeout edges.
    pub timeout: Option<Duration>,
}

impl<S: State, E: Event> TransitionView<S, E> {
    fn of<C, A, R>(source: Option<&S>, event: Option<&E>, t: &Transition<S, C, A, R>) -> Self {
        Self {
            source: source.cloned(),
            event: event.cloned(),
            target: t.target().cloned(),
            target_map: t.target_map().map(str::to_string),
            transition_type: t.transition_type(),
            automatic: t.is_automatic(),
            guarded: t.is_guarded(),
            timeout: None,
        }
    }

    /// Short label such as `COIN [guarded]`, built from explicit names only.
    pub fn label(&self) -> String {
        let mut label = match (&self.event, self.timeout) {
            (Some(event), _) => event.name().to_string(),
            (None, Some(delay)) => format!("after {}ms", delay.as_millis()),
            (None, None) if self.automatic => "automatic".to_string(),
            (None, None) => String::new(),
        };
        if self.guarded {
            if !label.is_empty() {
                label.push(' ');
            }
            label.push_str("[guarded]");
        }
        label
    }
}

/// Borrowed view of one state map.
pub struct StateMapView<'a, S, E, C, A, R> {
    map: &'a StateMapDefinition<S, E, C, A, R>,
    initial: Option<&'a S>,
}

impl<'a, S: State, E: Event, C, A, R> StateMapView<'a, S, E, C, A, R> {
    pub fn name(&self) -> &str {
        self.map.name()
    }

    /// Valid states sorted by name.
    pub fn states(&self) -> Vec<&'a S> {
        let mut states: Vec<&S> = self.map.valid_states().iter().collect();
        states.sort_by(|a, b| a.name().cmp(b.name()));
        states
    }

    /// Every declared edge of this map, sorted by source then event name.
    pub fn transitions(&self) -> Vec<TransitionView<S, E>> {
        let mut views = Vec::new();

        if let Some(initial) = self.initial {
            views.push(TransitionView {
                source: None,
                event: None,
                target: Some(initial.clone()),
                target_map: None,
                transition_type: TransitionType::Start,
                automatic: false,
                guarded: false,
                timeout: None,
            });
        }

        for ((state, event), rules) in &self.map.transition_rules {
            views.extend(rules.iter().map(|t| TransitionView::of(Some(state), Some(event), t)));
        }
        for (event, t) in &self.map.default_transitions {
            views.push(TransitionView::of(None, Some(event), t));
        }
        for (state, rules) in &self.map.automatic_transitions {
            views.extend(rules.iter().map(|t| TransitionView::of(Some(state), None, t)));
        }
        for (state, timeout) in &self.map.timeouts {
            views.push(TransitionView {
                source: Some(state.clone()),
                event: None,
                target: Some(timeout.target().clone()),
                target_map: None,
                transition_type: TransitionType::Normal,
                automatic: true,
                guarded: timeout.guard.is_some(),
                timeout: Some(timeout.duration()),
            });
        }

        views.sort_by(|a, b| {
            let key = |v: &TransitionView<S, E>| {
                (
                    v.source.as_ref().map(|s| s.name().to_string()),
                    v.event.as_ref().map(|e| e.name().to_string()),
                )
            };
            key(a).cmp(&key(b))
        });
        views
    }
}

impl<S: State, E: Event, C, A, R> StateMachineDefinition<S, E, C, A, R> {
    /// Views of every map: the default map first, then named maps by name.
    pub fn state_maps(&self) -> Vec<StateMapView<'_, S, E, C, A, R>> {
        let initial = match &self.initial {
            InitialState::Fixed(state) => Some(state),
            InitialState::Resolver(_) => None,
        };
        let mut named: Vec<_> = self.named_maps.values().collect();
        named.sort_by(|a, b| a.name().cmp(b.name()));

        std::iter::once(StateMapView {
            map: &self.default_map,
            initial,
        })
        .chain(named.into_iter().map(|map| StateMapView { map, initial: None }))
        .collect()
    }
}
