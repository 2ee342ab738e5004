//! Transition variants and ordered transition rules.

use crate::core::{Action, Guard, State};
use serde::{Deserialize, Serialize};

/// Classification of a transition, used by views and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionType {
    Normal,
    Default,
    /// Pseudo-edge into the initial state; only appears in views.
    Start,
    Push,
    Pop,
}

/// Where a transition moves the machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionKind<S> {
    /// Event or automatic transition within the active map.
    /// Without a target the transition is internal: only the action runs.
    Simple { target: Option<S> },
    /// Map-scoped catch-all bound to an event irrespective of source state.
    Default { target: Option<S> },
    /// Enter a named map at `target`, remembering the current state.
    Push { map: String, target: S },
    /// Leave the active map. Without a target the remembered state is used.
    Pop { target: Option<S> },
}

/// A declared transition: a kind plus optional guard and action.
pub struct Transition<S, C, A, R> {
    pub(crate) kind: TransitionKind<S>,
    pub(crate) guard: Option<Guard<C, A>>,
    pub(crate) action: Option<Action<C, A, R>>,
    pub(crate) automatic: bool,
}

impl<S: State, C, A, R> Transition<S, C, A, R> {
    pub(crate) fn new(kind: TransitionKind<S>) -> Self {
        Self {
            kind,
            guard: None,
            action: None,
            automatic: false,
        }
    }

    pub fn kind(&self) -> &TransitionKind<S> {
        &self.kind
    }

    pub fn transition_type(&self) -> TransitionType {
        match self.kind {
            TransitionKind::Simple { .. } => TransitionType::Normal,
            TransitionKind::Default { .. } => TransitionType::Default,
            TransitionKind::Push { .. } => TransitionType::Push,
            TransitionKind::Pop { .. } => TransitionType::Pop,
        }
    }

    /// Explicit target state, if the transition names one.
    pub fn target(&self) -> Option<&S> {
        match &self.kind {
            TransitionKind::Simple { target }
            | TransitionKind::Default { target }
            | TransitionKind::Pop { target } => target.as_ref(),
            TransitionKind::Push { target, .. } => Some(target),
        }
    }

    pub fn target_map(&self) -> Option<&str> {
        match &self.kind {
            TransitionKind::Push { map, .. } => Some(map),
            _ => None,
        }
    }

    pub fn is_automatic(&self) -> bool {
        self.automatic
    }

    pub fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }

    pub fn action(&self) -> Option<&Action<C, A, R>> {
        self.action.as_ref()
    }

    /// True when no guard is declared or the guard accepts.
    pub(crate) fn accepts(&self, context: &C, arg: Option<&A>) -> bool {
        self.guard
            .as_ref()
            .map_or(true, |guard| guard.check(context, arg))
    }
}

/// Guarded candidates in declaration order plus an unconditional fallback.
pub struct TransitionRules<S, C, A, R> {
    pub(crate) guarded: Vec<Transition<S, C, A, R>>,
    pub(crate) fallback: Option<Transition<S, C, A, R>>,
}

impl<S: State, C, A, R> TransitionRules<S, C, A, R> {
    pub(crate) fn new() -> Self {
        Self {
            guarded: Vec::new(),
            fallback: None,
        }
    }

    /// First candidate whose guard accepts, otherwise the fallback.
    pub fn select(&self, context: &C, arg: Option<&A>) -> Option<&Transition<S, C, A, R>> {
        self.guarded
            .iter()
            .find(|t| t.accepts(context, arg))
            .or(self.fallback.as_ref())
    }

    /// All declared candidates, guarded ones first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition<S, C, A, R>> {
        self.guarded.iter().chain(self.fallback.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum Light {
        Red,
        Green,
        Amber,
    }

    impl State for Light {
        fn name(&self) -> &str {
            match self {
                Self::Red => "Red",
                Self::Green => "Green",
                Self::Amber => "Amber",
            }
        }
    }

    fn guarded(target: Light, min: u32) -> Transition<Light, u32, (), ()> {
        let mut t = Transition::new(TransitionKind::Simple {
            target: Some(target),
        });
        t.guard = Some(Guard::from_context(move |n: &u32| *n >= min));
        t
    }

    #[test]
    fn first_accepting_guard_wins() {
        let mut rules = TransitionRules::new();
        rules.guarded.push(guarded(Light::Green, 1));
        rules.guarded.push(guarded(Light::Amber, 1));

        for _ in 0..10 {
            let selected = rules.select(&5, None).unwrap();
            assert_eq!(selected.target(), Some(&Light::Green));
        }
    }

    #[test]
    fn fallback_used_when_no_guard_accepts() {
        let mut rules = TransitionRules::new();
        rules.guarded.push(guarded(Light::Green, 10));
        rules.fallback = Some(Transition::new(TransitionKind::Simple {
            target: Some(Light::Red),
        }));

        assert_eq!(rules.select(&3, None).unwrap().target(), Some(&Light::Red));
        assert_eq!(rules.select(&30, None).unwrap().target(), Some(&Light::Green));
    }

    #[test]
    fn nothing_selected_without_fallback() {
        let mut rules = TransitionRules::new();
        rules.guarded.push(guarded(Light::Green, 10));

        assert!(rules.select(&3, None).is_none());
    }

    #[test]
    fn transition_type_follows_kind() {
        let push: Transition<Light, u32, (), ()> = Transition::new(TransitionKind::Push {
            map: "night".to_string(),
            target: Light::Amber,
        });
        assert_eq!(push.transition_type(), TransitionType::Push);
        assert_eq!(push.target_map(), Some("night"));
        assert_eq!(push.target(), Some(&Light::Amber));

        let pop: Transition<Light, u32, (), ()> = Transition::new(TransitionKind::Pop { target: None });
        assert_eq!(pop.transition_type(), TransitionType::Pop);
        assert_eq!(pop.target(), None);
    }
}
