//! Transition actions and lifecycle hook signatures.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Error produced by a failing action body.
pub type ActionError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of an action: an optional result value or a failure.
pub type ActionResult<R> = Result<Option<R>, ActionError>;

/// Boxed future returned by suspending actions.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Blocking action body.
pub type BlockingFn<C, A, R> = dyn Fn(&mut C, Option<&A>) -> ActionResult<R> + Send + Sync;

/// Suspending action body; the returned future borrows the context.
pub type SuspendingFn<C, A, R> =
    dyn for<'a> Fn(&'a mut C, Option<&'a A>) -> BoxFuture<'a, ActionResult<R>> + Send + Sync;

/// Entry or exit hook: `(context, from, to, arg)`.
pub type HookFn<S, C, A> = Arc<dyn Fn(&mut C, &S, &S, Option<&A>) + Send + Sync>;

/// Global fallback invoked when no transition applies: `(context, state, event, arg)`.
pub type DefaultActionFn<S, E, C, A, R> =
    Arc<dyn Fn(&mut C, &S, &E, Option<&A>) -> ActionResult<R> + Send + Sync>;

/// Callback fired after the state value changed: `(context, from, to)`.
pub type StateChangeFn<S, C> = Arc<dyn Fn(&mut C, &S, &S) + Send + Sync>;

/// Resolves the initial state from the context on first creation.
pub type InitialStateFn<S, C> = Arc<dyn Fn(&C) -> S + Send + Sync>;

/// Business action attached to a transition.
///
/// Blocking actions run to completion; suspending actions may await external
/// work and are only accepted by definitions built with `build_async`.
pub enum Action<C, A, R> {
    Blocking(Arc<BlockingFn<C, A, R>>),
    Suspending(Arc<SuspendingFn<C, A, R>>),
}

impl<C, A, R> Action<C, A, R> {
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn(&mut C, Option<&A>) -> ActionResult<R> + Send + Sync + 'static,
    {
        Action::Blocking(Arc::new(f))
    }

    pub fn suspending<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut C, Option<&'a A>) -> BoxFuture<'a, ActionResult<R>>
            + Send
            + Sync
            + 'static,
    {
        Action::Suspending(Arc::new(f))
    }

    pub fn is_suspending(&self) -> bool {
        matches!(self, Action::Suspending(_))
    }
}

impl<C, A, R> Clone for Action<C, A, R> {
    fn clone(&self) -> Self {
        match self {
            Action::Blocking(f) => Action::Blocking(Arc::clone(f)),
            Action::Suspending(f) => Action::Suspending(Arc::clone(f)),
        }
    }
}

impl<C, A, R> fmt::Debug for Action<C, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Blocking(_) => f.write_str("Action::Blocking(..)"),
            Action::Suspending(_) => f.write_str("Action::Suspending(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocking_action_mutates_context() {
        let action: Action<u32, u32, u32> = Action::blocking(|count, arg| {
            *count += arg.copied().unwrap_or(1);
            Ok(Some(*count))
        });

        let mut count = 0;
        let Action::Blocking(f) = &action else {
            panic!("expected blocking action");
        };
        assert_eq!(f(&mut count, Some(&5)).unwrap(), Some(5));
        assert_eq!(f(&mut count, None).unwrap(), Some(6));
        assert!(!action.is_suspending());
    }

    #[tokio::test]
    async fn suspending_action_awaits() {
        let action: Action<Vec<u32>, u32, ()> =
            Action::suspending(|log: &mut Vec<u32>, arg: Option<&u32>| {
                Box::pin(async move {
                    tokio::task::yield_now().await;
                    log.push(arg.copied().unwrap_or_default());
                    Ok(None)
                })
            });

        assert!(action.is_suspending());
        let mut log = Vec::new();
        if let Action::Suspending(f) = &action {
            f(&mut log, Some(&7)).await.unwrap();
        }
        assert_eq!(log, vec![7]);
    }
}
