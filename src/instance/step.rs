//! Step execution shared by the blocking and async engines.
//!
//! A step is split around its action so the async engine can await a
//! suspending action between [`begin`] and [`commit`]:
//!
//! 1. [`begin`] computes the move and runs exit hooks.
//! 2. The caller runs the action.
//! 3. [`commit`] applies the move, runs entry hooks and `on_state_change`.
//! 4. [`verify`] checks invariants.

use crate::core::{first_violation, Event, State};
use crate::definition::{StateMachineDefinition, Transition, TransitionKind};
use crate::error::FsmError;
use crate::instance::position::{Frame, Position};

/// How a step changes the position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Move<S> {
    /// Internal transition: no exit or entry.
    Stay,
    Enter(S),
    Push { map: String, target: S },
    Pop { target: S },
}

/// A step whose exit side has run.
#[derive(Debug)]
pub(crate) struct Step<S> {
    pub(crate) from: S,
    pub(crate) movement: Move<S>,
}

impl<S> Step<S> {
    pub(crate) fn target(&self) -> Option<&S> {
        match &self.movement {
            Move::Stay => None,
            Move::Enter(target) | Move::Push { target, .. } | Move::Pop { target } => Some(target),
        }
    }

    /// Whether the step leaves the current state (and so re-enters one).
    pub(crate) fn leaves(&self) -> bool {
        !matches!(self.movement, Move::Stay)
    }
}

fn plan<S: State, E: Event, C, A, R>(
    definition: &StateMachineDefinition<S, E, C, A, R>,
    position: &Position<S>,
    transition: &Transition<S, C, A, R>,
) -> Result<Move<S>, FsmError> {
    let movement = match transition.kind() {
        TransitionKind::Simple { target: None } | TransitionKind::Default { target: None } => {
            Move::Stay
        }
        TransitionKind::Simple { target: Some(target) }
        | TransitionKind::Default { target: Some(target) } => {
            // A default inherited from the base map may name a state the
            // active map does not have.
            let active = position.map();
            if !definition.map(active).is_some_and(|map| map.contains(target)) {
                return Err(FsmError::InvalidPosition {
                    reason: format!("'{}' is not a state of map '{}'", target.name(), active),
                });
            }
            Move::Enter(target.clone())
        }
        TransitionKind::Push { map, target } => Move::Push {
            map: map.clone(),
            target: target.clone(),
        },
        TransitionKind::Pop { target } => {
            let [.., parent, top] = position.frames.as_slice() else {
                return Err(FsmError::PopFromDefaultMap {
                    state: position.state.name().to_string(),
                });
            };
            let target = target
                .clone()
                .or_else(|| top.resume.clone())
                .ok_or_else(|| FsmError::InvalidPosition {
                    reason: format!("map '{}' has no state to return to", top.map),
                })?;
            let exposed = definition
                .map(&parent.map)
                .ok_or_else(|| FsmError::InvalidPosition {
                    reason: format!("unknown state map '{}'", parent.map),
                })?;
            if !exposed.contains(&target) {
                return Err(FsmError::PopTargetNotInMap {
                    state: target.name().to_string(),
                    map: parent.map.clone(),
                });
            }
            Move::Pop { target }
        }
    };
    Ok(movement)
}

/// Plan the move for `transition` and run exit hooks if it leaves the state.
///
/// Nothing is changed when planning fails.
pub(crate) fn begin<S: State, E: Event, C, A, R>(
    definition: &StateMachineDefinition<S, E, C, A, R>,
    position: &Position<S>,
    context: &mut C,
    transition: &Transition<S, C, A, R>,
    arg: Option<&A>,
) -> Result<Step<S>, FsmError> {
    let step = Step {
        from: position.state.clone(),
        movement: plan(definition, position, transition)?,
    };

    if let Some(to) = step.target() {
        if let Some(hook) = &definition.default_exit {
            hook(context, &step.from, to, arg);
        }
        if let Some(hook) = definition
            .map(position.map())
            .and_then(|map| map.exit_hook(&step.from))
        {
            hook(context, &step.from, to, arg);
        }
    }
    Ok(step)
}

/// Apply the move, then run entry hooks and `on_state_change`.
pub(crate) fn commit<S: State, E: Event, C, A, R>(
    definition: &StateMachineDefinition<S, E, C, A, R>,
    position: &mut Position<S>,
    context: &mut C,
    step: Step<S>,
    arg: Option<&A>,
) {
    let leaves = step.leaves();
    let from = step.from;

    match step.movement {
        Move::Stay => {}
        Move::Enter(target) => position.state = target,
        Move::Push { map, target } => {
            tracing::debug!("push map '{}' from '{}'", map, from.name());
            position.frames.push(Frame {
                map,
                resume: Some(from.clone()),
            });
            position.state = target;
        }
        Move::Pop { target } => {
            if let Some(frame) = position.frames.pop() {
                tracing::debug!("pop map '{}' back to '{}'", frame.map, target.name());
            }
            position.state = target;
        }
    }

    if leaves {
        if let Some(hook) = &definition.default_entry {
            hook(context, &from, &position.state, arg);
        }
        if let Some(hook) = definition
            .map(position.map())
            .and_then(|map| map.entry_hook(&position.state))
        {
            hook(context, &from, &position.state, arg);
        }
    }

    if from != position.state {
        tracing::debug!("{} -> {}", from.name(), position.state.name());
        if let Some(notify) = &definition.on_state_change {
            notify(context, &from, &position.state);
        }
    }
}

/// Fail on the first invariant that does not hold.
pub(crate) fn verify<S: State, E: Event, C, A, R>(
    definition: &StateMachineDefinition<S, E, C, A, R>,
    position: &Position<S>,
    context: &C,
) -> Result<(), FsmError> {
    match first_violation(definition.invariants(), context) {
        Some(invariant) => {
            tracing::debug!(
                "invariant '{}' violated in '{}'",
                invariant.label(),
                position.state.name()
            );
            Err(FsmError::InvariantViolation {
                label: invariant.label().to_string(),
                state: position.state.name().to_string(),
            })
        }
        None => Ok(()),
    }
}

/// Error for an event that resolves to nothing.
pub(crate) fn illegal<S: State, E: Event>(position: &Position<S>, event: &E) -> FsmError {
    FsmError::IllegalEvent {
        state: position.state.name().to_string(),
        event: event.name().to_string(),
        map: position.map().to_string(),
    }
}

/// Error for a cascade that fired more automatics than allowed.
pub(crate) fn runaway<S: State>(position: &Position<S>, limit: usize) -> FsmError {
    FsmError::AutomaticTransitionLoop {
        state: position.state.name().to_string(),
        map: position.map().to_string(),
        limit,
    }
}
