//! Guard predicates for selecting among competing transitions.
//!
//! Guards are pure boolean functions over the context and the optional
//! event argument. They never mutate the context.

use std::fmt;
use std::sync::Arc;

/// Pure predicate that decides whether a transition candidate applies.
///
/// Guards are evaluated in declaration order during resolution; the first
/// guard that returns `true` selects its transition.
///
/// # Example
///
/// ```rust
/// use statemaps::core::Guard;
///
/// struct Wallet {
///     coins: u32,
/// }
///
/// let can_pay = Guard::new(|w: &Wallet, price: Option<&u32>| {
///     w.coins >= price.copied().unwrap_or(0)
/// });
///
/// let wallet = Wallet { coins: 40 };
/// assert!(can_pay.check(&wallet, Some(&25)));
/// assert!(!can_pay.check(&wallet, Some(&50)));
/// assert!(can_pay.check(&wallet, None));
/// ```
pub struct Guard<C, A> {
    predicate: Arc<dyn Fn(&C, Option<&A>) -> bool + Send + Sync>,
}

impl<C, A> Guard<C, A> {
    /// Create a guard from a predicate over context and argument.
    ///
    /// The predicate must be deterministic and thread-safe (Send + Sync).
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C, Option<&A>) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Create a guard that only looks at the context.
    ///
    /// ```rust
    /// use statemaps::core::Guard;
    ///
    /// let positive: Guard<i64, ()> = Guard::from_context(|n: &i64| *n > 0);
    /// assert!(positive.check(&3, None));
    /// assert!(!positive.check(&-3, None));
    /// ```
    pub fn from_context<F>(predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Guard::new(move |context: &C, _: Option<&A>| predicate(context))
    }

    /// Evaluate the guard.
    pub fn check(&self, context: &C, arg: Option<&A>) -> bool {
        (self.predicate)(context, arg)
    }
}

impl<C, A> Clone for Guard<C, A> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C, A> fmt::Debug for Guard<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Turnstile {
        coins: u32,
        locked: bool,
    }

    #[test]
    fn guard_reads_context() {
        let guard = Guard::<Turnstile, ()>::from_context(|t| t.locked);

        assert!(guard.check(&Turnstile { coins: 0, locked: true }, None));
        assert!(!guard.check(&Turnstile { coins: 0, locked: false }, None));
    }

    #[test]
    fn guard_reads_argument() {
        let guard = Guard::new(|t: &Turnstile, value: Option<&u32>| {
            t.coins + value.copied().unwrap_or(0) >= 50
        });
        let ctx = Turnstile { coins: 10, locked: true };

        assert!(!guard.check(&ctx, Some(&20)));
        assert!(guard.check(&ctx, Some(&40)));
        assert!(!guard.check(&ctx, None));
    }

    #[test]
    fn guard_is_deterministic() {
        let guard = Guard::<Turnstile, ()>::from_context(|t| t.coins > 5);
        let ctx = Turnstile { coins: 6, locked: false };

        let result1 = guard.check(&ctx, None);
        let result2 = guard.check(&ctx, None);

        assert_eq!(result1, result2);
    }

    #[test]
    fn cloned_guard_shares_predicate() {
        let guard = Guard::<Turnstile, ()>::from_context(|t| t.coins == 0);
        let cloned = guard.clone();
        let ctx = Turnstile { coins: 0, locked: true };

        assert_eq!(guard.check(&ctx, None), cloned.check(&ctx, None));
    }
}
