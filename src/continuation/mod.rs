//! Stopping criteria.
//!
//! A [`Continue`] is asked once per generation whether the run should go
//! on. Criteria are read-only on the population and carry their own small
//! state (generation counter, clock, best-so-far).
//!
//! [`CombinedContinue`] is the logical AND of an ordered list of criteria;
//! it stops at the first criterion that says stop, and later criteria are
//! not consulted.

mod criteria;

pub use criteria::{
    CancelContinue, EvalContinue, FitContinue, GenContinue, SecondsElapsed, StagnationContinue,
};

use crate::core::Individual;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A stopping criterion.
///
/// Any `FnMut(&[I]) -> bool` closure is a criterion.
pub trait Continue<I: Individual> {
    /// Returns `true` to keep going, `false` to stop.
    fn proceed(&mut self, pop: &[I]) -> bool;
}

impl<I: Individual, T> Continue<I> for T
where
    T: FnMut(&[I]) -> bool,
{
    fn proceed(&mut self, pop: &[I]) -> bool {
        self(pop)
    }
}

/// Ordered conjunction of criteria.
///
/// Never empty: it is built from a first criterion and
/// [`remove_last`](Self::remove_last) refuses to drop the last one.
///
/// # Examples
///
/// ```
/// use u_evolve::continuation::{CombinedContinue, Continue, GenContinue};
/// use u_evolve::core::{Candidate, Minimizing};
///
/// type Ind = Candidate<Vec<f64>, Minimizing>;
///
/// let mut cont: CombinedContinue<Ind> = CombinedContinue::new(GenContinue::new(3));
/// cont.add(|_: &[Ind]| true);
/// assert!(cont.proceed(&[]));
/// assert!(cont.proceed(&[]));
/// assert!(!cont.proceed(&[]));
/// ```
pub struct CombinedContinue<I> {
    criteria: Vec<Box<dyn Continue<I>>>,
}

impl<I: Individual> CombinedContinue<I> {
    /// Creates a combination holding `first`.
    pub fn new(first: impl Continue<I> + 'static) -> Self {
        Self {
            criteria: vec![Box::new(first)],
        }
    }

    /// Appends a criterion.
    pub fn add(&mut self, criterion: impl Continue<I> + 'static) {
        self.criteria.push(Box::new(criterion));
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, criterion: impl Continue<I> + 'static) -> Self {
        self.add(criterion);
        self
    }

    /// Removes the most recently added criterion.
    ///
    /// Returns `false` (and keeps it) if it is the only one left.
    pub fn remove_last(&mut self) -> bool {
        if self.criteria.len() <= 1 {
            tracing::warn!("cannot remove the last stopping criterion");
            return false;
        }
        self.criteria.pop();
        true
    }

    /// Number of criteria.
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl<I: Individual> Continue<I> for CombinedContinue<I> {
    fn proceed(&mut self, pop: &[I]) -> bool {
        self.criteria.iter_mut().all(|c| c.proceed(pop))
    }
}

/// Cooperative cancellation flag.
///
/// Clones share the same flag: hand one to another thread and call
/// [`cancel`](Self::cancel) there; [`CancelContinue`] stops the run at the
/// next generation boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl From<Arc<AtomicBool>> for CancellationToken {
    fn from(flag: Arc<AtomicBool>) -> Self {
        Self(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Candidate, Minimizing};
    use std::sync::atomic::AtomicUsize;

    type Ind = Candidate<Vec<f64>, Minimizing>;

    fn counting(answer: bool, calls: Arc<AtomicUsize>) -> impl FnMut(&[Ind]) -> bool {
        move |_: &[Ind]| {
            calls.fetch_add(1, Ordering::Relaxed);
            answer
        }
    }

    #[test]
    fn test_combined_is_and() {
        for (a, b) in [(true, true), (true, false), (false, true), (false, false)] {
            let mut cont = CombinedContinue::new(move |_: &[Ind]| a);
            cont.add(move |_: &[Ind]| b);
            assert_eq!(cont.proceed(&[]), a && b);
        }
    }

    #[test]
    fn test_combined_short_circuits() {
        let calls_a = Arc::new(AtomicUsize::new(0));
        let calls_b = Arc::new(AtomicUsize::new(0));
        let mut cont = CombinedContinue::new(counting(false, calls_a.clone()));
        cont.add(counting(true, calls_b.clone()));

        assert!(!cont.proceed(&[]));
        assert_eq!(calls_a.load(Ordering::Relaxed), 1);
        assert_eq!(calls_b.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_remove_last_keeps_one() {
        let mut cont = CombinedContinue::new(|_: &[Ind]| true).with(|_: &[Ind]| false);
        assert_eq!(cont.len(), 2);
        assert!(!cont.proceed(&[]));
        assert!(cont.remove_last());
        assert!(cont.proceed(&[]));
        assert!(!cont.remove_last());
        assert_eq!(cont.len(), 1);
        assert!(!cont.is_empty());
    }

    #[test]
    fn test_cancellation_token_shared() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(!token.is_cancelled());
        other.cancel();
        assert!(token.is_cancelled());

        let flag = Arc::new(AtomicBool::new(true));
        assert!(CancellationToken::from(flag).is_cancelled());
    }
}
