//! Invariants checked against the context after every committed transition.

use std::fmt;
use std::sync::Arc;

/// Named predicate over the context that must hold after each transition.
pub struct Invariant<C> {
    label: String,
    predicate: Arc<dyn Fn(&C) -> bool + Send + Sync>,
}

impl<C> Invariant<C> {
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn holds(&self, context: &C) -> bool {
        (self.predicate)(context)
    }
}

impl<C> Clone for Invariant<C> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C> fmt::Debug for Invariant<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invariant")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Returns the first invariant, in declaration order, that does not hold.
pub fn first_violation<'a, C>(invariants: &'a [Invariant<C>], context: &C) -> Option<&'a Invariant<C>> {
    invariants.iter().find(|invariant| !invariant.holds(context))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Account {
        balance: i64,
        limit: i64,
    }

    #[test]
    fn all_invariants_hold() {
        let invariants = vec![
            Invariant::new("non-negative", |a: &Account| a.balance >= 0),
            Invariant::new("under limit", |a: &Account| a.balance <= a.limit),
        ];
        let account = Account { balance: 10, limit: 100 };

        assert!(first_violation(&invariants, &account).is_none());
    }

    #[test]
    fn first_failing_invariant_is_reported() {
        let invariants = vec![
            Invariant::new("non-negative", |a: &Account| a.balance >= 0),
            Invariant::new("under limit", |a: &Account| a.balance <= a.limit),
            Invariant::new("always fails", |_: &Account| false),
        ];
        let account = Account { balance: 500, limit: 100 };

        let violated = first_violation(&invariants, &account).unwrap();
        assert_eq!(violated.label(), "under limit");
    }
}
