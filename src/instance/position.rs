//! Current state plus the stack of active maps.

use crate::core::{Event, State};
use crate::definition::{StateMachineDefinition, DEFAULT_STATE_MAP};
use std::collections::HashSet;

/// One active map. Pushed frames remember the state they were entered from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Frame<S> {
    pub(crate) map: String,
    pub(crate) resume: Option<S>,
}

/// Where an instance is: current state and map stack (bottom is the
/// default map, the stack is never empty).
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Position<S> {
    pub(crate) state: S,
    pub(crate) frames: Vec<Frame<S>>,
}

impl<S: State> Position<S> {
    pub(crate) fn initial(state: S) -> Self {
        Self {
            state,
            frames: vec![Frame {
                map: DEFAULT_STATE_MAP.to_string(),
                resume: None,
            }],
        }
    }

    /// Name of the topmost (active) map.
    pub(crate) fn map(&self) -> &str {
        self.frames
            .last()
            .map_or(DEFAULT_STATE_MAP, |frame| frame.map.as_str())
    }

    /// Events with a declared transition from here, ignoring guards.
    pub(crate) fn allowed<E: Event, C, A, R>(
        &self,
        definition: &StateMachineDefinition<S, E, C, A, R>,
        include_defaults: bool,
    ) -> HashSet<E> {
        let mut events = HashSet::new();
        let Some(active) = definition.map(self.map()) else {
            return events;
        };

        events.extend(active.events_from(&self.state).cloned());
        if include_defaults {
            events.extend(active.default_events().cloned());
            if !active.is_default() {
                events.extend(definition.default_map().default_events().cloned());
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{StateMachineBuilder, StateMapBuilder, TransitionBuilder};
    use crate::{event_enum, state_enum};

    state_enum! {
        enum Mode { Idle, Busy, Deep }
    }

    event_enum! {
        enum Cmd { Start, Stop, Reset, Dive }
    }

    type Rule = TransitionBuilder<Mode, Cmd, ()>;

    #[test]
    fn initial_position_is_in_default_map() {
        let position = Position::initial(Mode::Idle);
        assert_eq!(position.map(), DEFAULT_STATE_MAP);
        assert_eq!(position.frames.len(), 1);
    }

    #[test]
    fn allowed_lists_declared_events_only() {
        let definition = StateMachineBuilder::<Mode, Cmd, ()>::new([Mode::Idle, Mode::Busy])
            .initial(Mode::Idle)
            .transition(Rule::on(Mode::Idle, Cmd::Start).to(Mode::Busy).when(|_, _| false))
            .transition(Rule::on(Mode::Busy, Cmd::Stop).to(Mode::Idle))
            .transition(Rule::default_on(Cmd::Reset).to(Mode::Idle))
            .build()
            .unwrap();
        let position = Position::initial(Mode::Idle);

        let allowed = position.allowed(&definition, false);
        assert_eq!(allowed, HashSet::from([Cmd::Start]));

        let with_defaults = position.allowed(&definition, true);
        assert_eq!(with_defaults, HashSet::from([Cmd::Start, Cmd::Reset]));
    }

    #[test]
    fn allowed_in_named_map_folds_in_base_defaults() {
        let definition = StateMachineBuilder::<Mode, Cmd, ()>::new([Mode::Idle])
            .initial(Mode::Idle)
            .transition(Rule::on(Mode::Idle, Cmd::Dive).push("deep", Mode::Deep))
            .transition(Rule::default_on(Cmd::Reset))
            .state_map(
                StateMapBuilder::new("deep", [Mode::Deep])
                    .transition(Rule::on(Mode::Deep, Cmd::Stop).pop()),
            )
            .build()
            .unwrap();
        let position = Position {
            state: Mode::Deep,
            frames: vec![
                Frame {
                    map: DEFAULT_STATE_MAP.to_string(),
                    resume: None,
                },
                Frame {
                    map: "deep".to_string(),
                    resume: Some(Mode::Idle),
                },
            ],
        };

        assert_eq!(position.map(), "deep");
        assert_eq!(position.allowed(&definition, false), HashSet::from([Cmd::Stop]));
        assert_eq!(
            position.allowed(&definition, true),
            HashSet::from([Cmd::Stop, Cmd::Reset])
        );
    }
}
