//! Async instance: suspending actions and per-state timeouts.

use crate::asynchronous::timer::ArmedTimer;
use crate::core::{Action, Event, State};
use crate::definition::{AsyncStateMachineDefinition, StateMachineDefinition, Transition};
use crate::error::FsmError;
use crate::instance::position::Position;
use crate::instance::{step, ExternalState};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;

/// Everything guarded by the execution gate.
struct Core<S, C> {
    context: C,
    position: Position<S>,
    timer: Option<ArmedTimer>,
    generation: u64,
    timer_error: Option<FsmError>,
}

struct Shared<S, E, C, A, R> {
    definition: Arc<AsyncStateMachineDefinition<S, E, C, A, R>>,
    gate: Mutex<Core<S, C>>,
}

impl<S, E, C, A, R> Shared<S, E, C, A, R> {
    fn definition(&self) -> &StateMachineDefinition<S, E, C, A, R> {
        &self.definition
    }
}

impl<S, E, C, A, R> Drop for Shared<S, E, C, A, R> {
    fn drop(&mut self) {
        if let Some(timer) = self.gate.get_mut().timer.take() {
            timer.cancel();
        }
    }
}

/// A state machine instance driven from async code.
///
/// The instance owns its context. All work (events, timer expiry and
/// context access) is admitted one at a time through a single execution
/// gate, so a timer that expires while a step is running waits for it and
/// then discovers whether it was cancelled.
///
/// Handles are cheap to clone and share one instance. Dropping the last
/// handle cancels any armed timer.
///
/// # Example
///
/// ```
/// use statemaps::asynchronous::AsyncInstance;
/// use statemaps::builder::{StateMachineBuilder, TimeoutBuilder, TransitionBuilder};
/// use statemaps::{event_enum, state_enum};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// state_enum! {
///     enum Light { Off, On }
/// }
///
/// event_enum! {
///     enum Switch { Flip }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let definition = StateMachineBuilder::<Light, Switch, ()>::new(Light::ALL.iter().copied())
///     .initial(Light::Off)
///     .transition(TransitionBuilder::on(Light::Off, Switch::Flip).to(Light::On))
///     .timeout(TimeoutBuilder::new(Light::On, Duration::from_millis(20), Light::Off))
///     .build_async()
///     .unwrap();
///
/// let light = AsyncInstance::create(Arc::new(definition), ()).await.unwrap();
/// light.send_event(Switch::Flip).await.unwrap();
/// assert_eq!(light.current_state().await, Light::On);
///
/// tokio::time::sleep(Duration::from_millis(200)).await;
/// assert_eq!(light.current_state().await, Light::Off);
/// # }
/// ```
pub struct AsyncInstance<S, E, C, A = (), R = ()> {
    shared: Arc<Shared<S, E, C, A, R>>,
}

impl<S, E, C, A, R> Clone for AsyncInstance<S, E, C, A, R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S, E, C, A, R> AsyncInstance<S, E, C, A, R>
where
    S: State,
    E: Event,
    C: Send + 'static,
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Start a fresh instance in the initial state, arming its timeout if
    /// it has one. Must be called within a tokio runtime.
    pub async fn create(
        definition: Arc<AsyncStateMachineDefinition<S, E, C, A, R>>,
        context: C,
    ) -> Result<Self, FsmError> {
        let state = definition.initial_state(&context);
        if !definition.default_map().contains(&state) {
            return Err(FsmError::InvalidPosition {
                reason: format!("initial state '{}' is not in the default map", state.name()),
            });
        }
        tracing::debug!("created async instance in '{}'", state.name());
        Ok(Self::start(definition, context, Position::initial(state)).await)
    }

    /// Resume from a snapshot. The initial-state resolver is not consulted;
    /// a timeout on the restored state is armed afresh.
    pub async fn restore(
        definition: Arc<AsyncStateMachineDefinition<S, E, C, A, R>>,
        context: C,
        external: ExternalState<S>,
    ) -> Result<Self, FsmError> {
        let position = external.into_position(&**definition)?;
        tracing::debug!(
            "restored async instance in '{}' of map '{}'",
            position.state.name(),
            position.map()
        );
        Ok(Self::start(definition, context, position).await)
    }

    async fn start(
        definition: Arc<AsyncStateMachineDefinition<S, E, C, A, R>>,
        context: C,
        position: Position<S>,
    ) -> Self {
        let shared = Arc::new(Shared {
            definition,
            gate: Mutex::new(Core {
                context,
                position,
                timer: None,
                generation: 0,
                timer_error: None,
            }),
        });
        {
            let mut gate = shared.gate.lock().await;
            arm(&shared, &mut *gate);
        }
        Self { shared }
    }

    /// Send an event and wait for its step and cascade to finish.
    ///
    /// The work runs in a spawned task, so dropping this future does not
    /// abandon a step halfway: it still commits, only its result is lost.
    pub async fn send_event(&self, event: E) -> Result<Option<R>, FsmError> {
        self.dispatch(event, None).await
    }

    pub async fn send_event_with(&self, event: E, arg: A) -> Result<Option<R>, FsmError> {
        self.dispatch(event, Some(arg)).await
    }

    pub async fn current_state(&self) -> S {
        self.shared.gate.lock().await.position.state.clone()
    }

    pub async fn current_state_map(&self) -> String {
        self.shared.gate.lock().await.position.map().to_string()
    }

    /// Events with a declared transition from the current state; guards are
    /// not evaluated.
    pub async fn allowed(&self, include_defaults: bool) -> HashSet<E> {
        let gate = self.shared.gate.lock().await;
        gate.position
            .allowed(self.shared.definition(), include_defaults)
    }

    pub async fn event_allowed(&self, event: &E, include_defaults: bool) -> bool {
        self.allowed(include_defaults).await.contains(event)
    }

    pub async fn external_state(&self) -> ExternalState<S> {
        let gate = self.shared.gate.lock().await;
        ExternalState::from_position(&gate.position)
    }

    /// Run `f` with exclusive access to the context.
    ///
    /// Invariants are not re-checked afterwards.
    pub async fn with_context<T>(&self, f: impl FnOnce(&mut C) -> T) -> T {
        let mut gate = self.shared.gate.lock().await;
        f(&mut gate.context)
    }

    /// Take the error raised by the most recent failed timer firing.
    pub async fn take_timer_error(&self) -> Option<FsmError> {
        self.shared.gate.lock().await.timer_error.take()
    }

    /// Whether a timeout is currently armed.
    pub async fn timer_pending(&self) -> bool {
        self.shared.gate.lock().await.timer.is_some()
    }

    pub fn definition(&self) -> &Arc<AsyncStateMachineDefinition<S, E, C, A, R>> {
        &self.shared.definition
    }

    /// Run one event to completion in its own task.
    async fn dispatch(&self, event: E, arg: Option<A>) -> Result<Option<R>, FsmError> {
        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move { handle(&shared, event, arg).await });
        match task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(FsmError::Action(Box::new(err))),
        }
    }
}

async fn handle<S, E, C, A, R>(
    shared: &Arc<Shared<S, E, C, A, R>>,
    event: E,
    arg: Option<A>,
) -> Result<Option<R>, FsmError>
where
    S: State,
    E: Event,
    C: Send + 'static,
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    let mut gate = shared.gate.lock().await;
    let core = &mut *gate;
    let arg = arg.as_ref();
    let definition = shared.definition();

    let Some(transition) = definition.resolve(
        core.position.map(),
        &core.position.state,
        &event,
        &core.context,
        arg,
    ) else {
        return fall_back(definition, core, &event, arg);
    };

    let result = apply(shared, core, transition, arg).await?;
    cascade(shared, core).await?;
    Ok(result)
}

/// No transition applies: run the global default action or reject.
fn fall_back<S: State, E: Event, C, A, R>(
    definition: &StateMachineDefinition<S, E, C, A, R>,
    core: &mut Core<S, C>,
    event: &E,
    arg: Option<&A>,
) -> Result<Option<R>, FsmError> {
    let Some(action) = &definition.default_action else {
        tracing::debug!(
            "illegal event {} in {}",
            event.name(),
            core.position.state.name()
        );
        return Err(step::illegal(&core.position, event));
    };

    let result =
        action(&mut core.context, &core.position.state, event, arg).map_err(FsmError::Action)?;
    step::verify(definition, &core.position, &core.context)?;
    Ok(result)
}

/// Run one step. A step that leaves its state cancels the armed timer and
/// arms the timeout of the state it enters.
async fn apply<S, E, C, A, R>(
    shared: &Arc<Shared<S, E, C, A, R>>,
    core: &mut Core<S, C>,
    transition: &Transition<S, C, A, R>,
    arg: Option<&A>,
) -> Result<Option<R>, FsmError>
where
    S: State,
    E: Event,
    C: Send + 'static,
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    let definition = shared.definition();
    let step = step::begin(definition, &core.position, &mut core.context, transition, arg)?;
    let result = match transition.action() {
        Some(Action::Blocking(run)) => run(&mut core.context, arg).map_err(FsmError::Action)?,
        Some(Action::Suspending(run)) => run(&mut core.context, arg)
            .await
            .map_err(FsmError::Action)?,
        None => None,
    };

    let leaves = step.leaves();
    step::commit(definition, &mut core.position, &mut core.context, step, arg);
    if leaves {
        if let Some(timer) = core.timer.take() {
            tracing::trace!("cancel timer {}", timer.generation);
            timer.cancel();
        }
        arm(shared, core);
    }
    step::verify(definition, &core.position, &core.context)?;
    Ok(result)
}

/// Fire automatic transitions until none applies. Like timeouts, they see
/// no argument.
async fn cascade<S, E, C, A, R>(
    shared: &Arc<Shared<S, E, C, A, R>>,
    core: &mut Core<S, C>,
) -> Result<(), FsmError>
where
    S: State,
    E: Event,
    C: Send + 'static,
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    let definition = shared.definition();
    let limit = definition.config().max_automatic_transitions;
    let mut fired = 0;

    while let Some(transition) = definition.resolve_automatic(
        core.position.map(),
        &core.position.state,
        &core.context,
        None,
    ) {
        if fired == limit {
            return Err(step::runaway(&core.position, limit));
        }
        fired += 1;
        apply(shared, core, transition, None).await?;
    }
    Ok(())
}

/// Arm the timeout of the current state, if it declares one.
fn arm<S, E, C, A, R>(shared: &Arc<Shared<S, E, C, A, R>>, core: &mut Core<S, C>)
where
    S: State,
    E: Event,
    C: Send + 'static,
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    let Some(timeout) = shared
        .definition()
        .map(core.position.map())
        .and_then(|map| map.timeout_for(&core.position.state))
    else {
        return;
    };

    core.generation += 1;
    let generation = core.generation;
    let duration = timeout.duration();
    tracing::debug!(
        "arm timer {} for {:?} in '{}'",
        generation,
        duration,
        core.position.state.name()
    );

    let cancelled = Arc::new(AtomicBool::new(false));
    let handle = tokio::spawn(expire(
        Arc::downgrade(shared),
        generation,
        duration,
        Arc::clone(&cancelled),
    ));
    core.timer = Some(ArmedTimer::new(generation, cancelled, handle));
}

/// Timer task body: sleep, then fire under the gate unless stood down.
async fn expire<S, E, C, A, R>(
    shared: Weak<Shared<S, E, C, A, R>>,
    generation: u64,
    duration: Duration,
    cancelled: Arc<AtomicBool>,
) where
    S: State,
    E: Event,
    C: Send + 'static,
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    tokio::time::sleep(duration).await;
    if cancelled.load(Ordering::SeqCst) {
        return;
    }
    let Some(shared) = shared.upgrade() else {
        return;
    };

    let mut gate = shared.gate.lock().await;
    let core = &mut *gate;
    if !core
        .timer
        .as_ref()
        .is_some_and(|timer| timer.is_live(generation))
    {
        tracing::trace!("timer {} stood down", generation);
        return;
    }
    // Detach: this task is now running, nothing may abort it.
    core.timer = None;

    if let Err(err) = fire(&shared, core).await {
        tracing::warn!(
            "timeout in '{}' failed: {}",
            core.position.state.name(),
            err
        );
        core.timer_error = Some(err);
    }
}

async fn fire<S, E, C, A, R>(
    shared: &Arc<Shared<S, E, C, A, R>>,
    core: &mut Core<S, C>,
) -> Result<(), FsmError>
where
    S: State,
    E: Event,
    C: Send + 'static,
    A: Send + Sync + 'static,
    R: Send + 'static,
{
    let Some(timeout) = shared
        .definition()
        .map(core.position.map())
        .and_then(|map| map.timeout_for(&core.position.state))
    else {
        return Ok(());
    };

    if !timeout.accepts(&core.context) {
        tracing::debug!(
            "timeout in '{}' suppressed by guard",
            core.position.state.name()
        );
        return Ok(());
    }

    tracing::debug!(
        "timeout in '{}' fired toward '{}'",
        core.position.state.name(),
        timeout.target().name()
    );
    let transition = timeout.to_transition();
    apply(shared, core, &transition, None).await?;
    cascade(shared, core).await
}
