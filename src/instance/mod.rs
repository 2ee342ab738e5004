//! Blocking state machine instance.
//!
//! An [`Instance`] pairs a shared [`StateMachineDefinition`] with a caller
//! owned context and tracks the current state and map stack. Events are
//! processed one at a time through `&mut self`; each committed step is
//! followed by the automatic cascade.
//!
//! # Example
//!
//! ```
//! use statemaps::builder::{StateMachineBuilder, TransitionBuilder};
//! use statemaps::instance::Instance;
//! use statemaps::{event_enum, state_enum};
//!
//! state_enum! {
//!     enum Door { Closed, Open }
//! }
//!
//! event_enum! {
//!     enum Knob { Turn }
//! }
//!
//! let definition = StateMachineBuilder::<Door, Knob, u32>::new(Door::ALL.iter().copied())
//!     .initial(Door::Closed)
//!     .transition(
//!         TransitionBuilder::on(Door::Closed, Knob::Turn)
//!             .to(Door::Open)
//!             .action(|turns: &mut u32, _| {
//!                 *turns += 1;
//!                 Ok(None)
//!             }),
//!     )
//!     .transition(TransitionBuilder::on(Door::Open, Knob::Turn).to(Door::Closed))
//!     .build()
//!     .unwrap();
//!
//! let mut turns = 0;
//! let mut door = Instance::create(&definition, &mut turns).unwrap();
//! door.send_event(Knob::Turn).unwrap();
//! assert_eq!(door.current_state(), &Door::Open);
//! assert_eq!(*door.context(), 1);
//! ```

mod external;
pub(crate) mod position;
pub(crate) mod step;

pub use external::{ExternalState, RestoreError, EXTERNAL_STATE_VERSION};

use crate::core::{Action, Event, State};
use crate::definition::{StateMachineDefinition, Transition};
use crate::error::FsmError;
use position::Position;
use std::collections::HashSet;

/// A running state machine over a borrowed context.
pub struct Instance<'a, S, E, C, A = (), R = ()> {
    definition: &'a StateMachineDefinition<S, E, C, A, R>,
    context: &'a mut C,
    position: Position<S>,
}

impl<'a, S: State, E: Event, C, A, R> Instance<'a, S, E, C, A, R> {
    /// Start a fresh instance in the definition's initial state.
    ///
    /// Fails with [`FsmError::InvalidPosition`] if a resolver picks a state
    /// outside the default map, and with [`FsmError::RequiresAsync`] if the
    /// definition declares timeouts or suspending actions.
    pub fn create(
        definition: &'a StateMachineDefinition<S, E, C, A, R>,
        context: &'a mut C,
    ) -> Result<Self, FsmError> {
        if definition.requires_async() {
            return Err(FsmError::RequiresAsync);
        }
        let state = definition.initial_state(context);
        if !definition.default_map().contains(&state) {
            return Err(FsmError::InvalidPosition {
                reason: format!("initial state '{}' is not in the default map", state.name()),
            });
        }
        tracing::debug!("created instance in '{}'", state.name());

        Ok(Self {
            definition,
            context,
            position: Position::initial(state),
        })
    }

    /// Resume from a snapshot. The initial-state resolver is not consulted.
    pub fn restore(
        definition: &'a StateMachineDefinition<S, E, C, A, R>,
        context: &'a mut C,
        external: ExternalState<S>,
    ) -> Result<Self, FsmError> {
        if definition.requires_async() {
            return Err(FsmError::RequiresAsync);
        }
        let position = external.into_position(definition)?;
        tracing::debug!(
            "restored instance in '{}' of map '{}'",
            position.state.name(),
            position.map()
        );

        Ok(Self {
            definition,
            context,
            position,
        })
    }

    pub fn send_event(&mut self, event: E) -> Result<Option<R>, FsmError> {
        self.dispatch(event, None)
    }

    /// Send an event carrying an argument for guards, hooks and actions.
    pub fn send_event_with(&mut self, event: E, arg: A) -> Result<Option<R>, FsmError> {
        self.dispatch(event, Some(arg))
    }

    pub fn current_state(&self) -> &S {
        &self.position.state
    }

    pub fn current_state_map(&self) -> &str {
        self.position.map()
    }

    /// Events with a declared transition from the current state.
    ///
    /// Guards are not evaluated. With `include_defaults`, default
    /// transitions of the active map and of the default map count too.
    pub fn allowed(&self, include_defaults: bool) -> HashSet<E> {
        self.position.allowed(self.definition, include_defaults)
    }

    pub fn event_allowed(&self, event: &E, include_defaults: bool) -> bool {
        self.allowed(include_defaults).contains(event)
    }

    pub fn external_state(&self) -> ExternalState<S> {
        ExternalState::from_position(&self.position)
    }

    pub fn context(&self) -> &C {
        self.context
    }

    pub fn definition(&self) -> &'a StateMachineDefinition<S, E, C, A, R> {
        self.definition
    }

    fn dispatch(&mut self, event: E, arg: Option<A>) -> Result<Option<R>, FsmError> {
        let arg = arg.as_ref();
        let definition = self.definition;

        let Some(transition) = definition.resolve(
            self.position.map(),
            &self.position.state,
            &event,
            self.context,
            arg,
        ) else {
            return self.fall_back(&event, arg);
        };

        let result = self.apply(transition, arg)?;
        self.cascade()?;
        Ok(result)
    }

    /// No transition applies: run the global default action or reject.
    fn fall_back(&mut self, event: &E, arg: Option<&A>) -> Result<Option<R>, FsmError> {
        let definition = self.definition;
        let Some(action) = &definition.default_action else {
            tracing::debug!(
                "illegal event {} in {}",
                event.name(),
                self.position.state.name()
            );
            return Err(step::illegal(&self.position, event));
        };

        let result =
            action(self.context, &self.position.state, event, arg).map_err(FsmError::Action)?;
        step::verify(definition, &self.position, self.context)?;
        Ok(result)
    }

    fn apply(
        &mut self,
        transition: &Transition<S, C, A, R>,
        arg: Option<&A>,
    ) -> Result<Option<R>, FsmError> {
        let run = match transition.action() {
            Some(Action::Suspending(_)) => return Err(FsmError::RequiresAsync),
            Some(Action::Blocking(run)) => Some(run),
            None => None,
        };

        let step = step::begin(self.definition, &self.position, self.context, transition, arg)?;
        let result = match run {
            Some(run) => run(self.context, arg).map_err(FsmError::Action)?,
            None => None,
        };
        step::commit(self.definition, &mut self.position, self.context, step, arg);
        step::verify(self.definition, &self.position, self.context)?;
        Ok(result)
    }

    /// Fire automatic transitions until none applies.
    ///
    /// Automatic transitions have no triggering event, so their guards,
    /// hooks and actions always see `None` as the argument.
    fn cascade(&mut self) -> Result<(), FsmError> {
        let definition = self.definition;
        let limit = definition.config().max_automatic_transitions;
        let mut fired = 0;

        while let Some(transition) = definition.resolve_automatic(
            self.position.map(),
            &self.position.state,
            self.context,
            None,
        ) {
            if fired == limit {
                return Err(step::runaway(&self.position, limit));
            }
            fired += 1;
            self.apply(transition, None)?;
        }
        Ok(())
    }
}
