//! Builders for individual transitions and state timeouts.

use crate::core::{Action, ActionResult, BoxFuture, Event, Guard, State};
use crate::definition::{TimeoutDefinition, Transition, TransitionKind};
use std::time::Duration;

/// What causes a transition to be considered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Trigger<S, E> {
    Event(S, E),
    Automatic(S),
    Default(E),
}

#[derive(Clone, Debug)]
enum Movement<S> {
    Stay,
    To(S),
    Push { map: String, target: S },
    Pop(Option<S>),
}

/// Builder for constructing transitions with a fluent API.
///
/// Start with [`on`](Self::on), [`automatic`](Self::automatic) or
/// [`default_on`](Self::default_on), then describe where the transition goes.
/// A transition without `to`/`push`/`pop` is internal: only its action runs.
pub struct TransitionBuilder<S, E, C, A = (), R = ()> {
    trigger: Trigger<S, E>,
    movement: Movement<S>,
    guard: Option<Guard<C, A>>,
    action: Option<Action<C, A, R>>,
}

impl<S: State, E: Event, C: 'static, A: 'static, R: 'static> TransitionBuilder<S, E, C, A, R> {
    fn with_trigger(trigger: Trigger<S, E>) -> Self {
        Self {
            trigger,
            movement: Movement::Stay,
            guard: None,
            action: None,
        }
    }

    /// Transition taken when `event` arrives in `state`.
    pub fn on(state: S, event: E) -> Self {
        Self::with_trigger(Trigger::Event(state, event))
    }

    /// Transition taken without an event as soon as `state` is reached.
    pub fn automatic(state: S) -> Self {
        Self::with_trigger(Trigger::Automatic(state))
    }

    /// Map-scoped catch-all for `event`, whatever the current state.
    pub fn default_on(event: E) -> Self {
        Self::with_trigger(Trigger::Default(event))
    }

    /// Set the target state.
    pub fn to(mut self, state: S) -> Self {
        self.movement = Movement::To(state);
        self
    }

    /// Enter the named map at `state`.
    pub fn push(mut self, map: impl Into<String>, state: S) -> Self {
        self.movement = Movement::Push {
            map: map.into(),
            target: state,
        };
        self
    }

    /// Leave the active map, resuming the state it was pushed from.
    pub fn pop(mut self) -> Self {
        self.movement = Movement::Pop(None);
        self
    }

    /// Leave the active map and enter `state` of the exposed map.
    pub fn pop_to(mut self, state: S) -> Self {
        self.movement = Movement::Pop(Some(state));
        self
    }

    pub fn guard(mut self, guard: Guard<C, A>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&C, Option<&A>) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    /// Set a blocking action.
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut C, Option<&A>) -> ActionResult<R> + Send + Sync + 'static,
    {
        self.action = Some(Action::blocking(action));
        self
    }

    /// Set a suspending action. Only accepted by `build_async`.
    pub fn action_async<F>(mut self, action: F) -> Self
    where
        F: for<'a> Fn(&'a mut C, Option<&'a A>) -> BoxFuture<'a, ActionResult<R>>
            + Send
            + Sync
            + 'static,
    {
        self.action = Some(Action::suspending(action));
        self
    }

    pub(crate) fn build(self) -> (Trigger<S, E>, Transition<S, C, A, R>) {
        let kind = match (&self.trigger, self.movement) {
            (Trigger::Default(_), Movement::Stay) => TransitionKind::Default { target: None },
            (Trigger::Default(_), Movement::To(target)) => TransitionKind::Default {
                target: Some(target),
            },
            (_, Movement::Stay) => TransitionKind::Simple { target: None },
            (_, Movement::To(target)) => TransitionKind::Simple {
                target: Some(target),
            },
            (_, Movement::Push { map, target }) => TransitionKind::Push { map, target },
            (_, Movement::Pop(target)) => TransitionKind::Pop { target },
        };

        let transition = Transition {
            kind,
            guard: self.guard,
            action: self.action,
            automatic: matches!(self.trigger, Trigger::Automatic(_)),
        };
        (self.trigger, transition)
    }
}

/// Builder for a per-state timeout: after `duration` in `state` without
/// leaving it, move to `target`.
pub struct TimeoutBuilder<S, C, A = (), R = ()> {
    pub(crate) state: S,
    duration: Duration,
    target: S,
    guard: Option<Guard<C, A>>,
    action: Option<Action<C, A, R>>,
}

impl<S: State, C: 'static, A: 'static, R: 'static> TimeoutBuilder<S, C, A, R> {
    pub fn new(state: S, duration: Duration, target: S) -> Self {
        Self {
            state,
            duration,
            target,
            guard: None,
            action: None,
        }
    }

    /// Only fire when the context satisfies `predicate` at expiry.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::from_context(predicate));
        self
    }

    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut C, Option<&A>) -> ActionResult<R> + Send + Sync + 'static,
    {
        self.action = Some(Action::blocking(action));
        self
    }

    pub fn action_async<F>(mut self, action: F) -> Self
    where
        F: for<'a> Fn(&'a mut C, Option<&'a A>) -> BoxFuture<'a, ActionResult<R>>
            + Send
            + Sync
            + 'static,
    {
        self.action = Some(Action::suspending(action));
        self
    }

    pub(crate) fn build(self) -> (S, TimeoutDefinition<S, C, A, R>) {
        (
            self.state,
            TimeoutDefinition {
                target: self.target,
                duration: self.duration,
                guard: self.guard,
                action: self.action,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::TransitionType;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum Door {
        Open,
        Closed,
    }

    impl State for Door {
        fn name(&self) -> &str {
            match self {
                Self::Open => "Open",
                Self::Closed => "Closed",
            }
        }
    }

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Push {
        Shove,
    }

    impl Event for Push {
        fn name(&self) -> &str {
            "Shove"
        }
    }

    type Builder = TransitionBuilder<Door, Push, u32>;

    #[test]
    fn on_without_target_is_internal() {
        let (trigger, transition) = Builder::on(Door::Open, Push::Shove).build();

        assert_eq!(trigger, Trigger::Event(Door::Open, Push::Shove));
        assert_eq!(transition.kind(), &TransitionKind::Simple { target: None });
        assert!(!transition.is_automatic());
    }

    #[test]
    fn automatic_sets_flag() {
        let (trigger, transition) = Builder::automatic(Door::Open).to(Door::Closed).build();

        assert_eq!(trigger, Trigger::Automatic(Door::Open));
        assert!(transition.is_automatic());
        assert_eq!(transition.target(), Some(&Door::Closed));
    }

    #[test]
    fn default_on_builds_default_kind() {
        let (_, transition) = Builder::default_on(Push::Shove).to(Door::Closed).build();

        assert_eq!(transition.transition_type(), TransitionType::Default);
        assert_eq!(transition.target(), Some(&Door::Closed));
    }

    #[test]
    fn push_and_pop_kinds() {
        let (_, push) = Builder::on(Door::Closed, Push::Shove)
            .push("inner", Door::Open)
            .build();
        assert_eq!(push.transition_type(), TransitionType::Push);
        assert_eq!(push.target_map(), Some("inner"));

        let (_, pop) = Builder::on(Door::Open, Push::Shove).pop().build();
        assert_eq!(pop.kind(), &TransitionKind::Pop { target: None });

        let (_, pop_to) = Builder::on(Door::Open, Push::Shove)
            .pop_to(Door::Closed)
            .build();
        assert_eq!(pop_to.target(), Some(&Door::Closed));
    }

    #[test]
    fn when_adds_guard() {
        let (_, transition) = Builder::on(Door::Open, Push::Shove)
            .to(Door::Closed)
            .when(|count, _| *count > 2)
            .build();

        assert!(transition.is_guarded());
        assert!(transition.accepts(&3, None));
        assert!(!transition.accepts(&1, None));
    }

    #[test]
    fn timeout_builder_keeps_duration() {
        let (state, timeout) =
            TimeoutBuilder::<Door, u32>::new(Door::Open, Duration::from_millis(250), Door::Closed)
                .when(|count| *count == 0)
                .build();

        assert_eq!(state, Door::Open);
        assert_eq!(timeout.duration(), Duration::from_millis(250));
        assert_eq!(timeout.target(), &Door::Closed);
        assert!(timeout.guard.is_some());
    }
}
