//! The sync/async duality at the heart of the sequencer.
//!
//! Every unit of test work resolves through a [`Step`]: either a result that
//! is already available, or a deferred one behind a future. Combinators on
//! `Step` bridge the two shapes so downstream logic never probes which
//! occurred, and a chain built purely from ready steps stays ready: no
//! future is ever allocated for a fully synchronous run.
//!
//! Execution is single-threaded and cooperative: futures are local (not
//! `Send`) and nothing runs concurrently. "Deferred" means completed later
//! on the same scheduler, never in parallel.

use std::future::Future;

use futures::future::LocalBoxFuture;

use crate::fault::TestFault;

/// One step of test work: a settled result or a deferred one.
pub enum Step<T> {
    /// The result is eagerly available.
    Ready(Result<T, TestFault>),
    /// The result arrives later; awaiting it may suspend the run.
    Pending(LocalBoxFuture<'static, Result<T, TestFault>>),
}

impl<T: 'static> Step<T> {
    /// A step that has already succeeded with `value`.
    pub fn ok(value: T) -> Self {
        Step::Ready(Ok(value))
    }

    /// A step that has already failed with `fault`.
    pub fn fail(fault: TestFault) -> Self {
        Step::Ready(Err(fault))
    }

    /// Wraps a future as a deferred step.
    pub fn from_future(future: impl Future<Output = Result<T, TestFault>> + 'static) -> Self {
        Step::Pending(Box::pin(future))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Step::Pending(_))
    }

    /// Converts into a future regardless of shape. Ready steps become
    /// immediately-resolved futures.
    pub fn into_future(self) -> LocalBoxFuture<'static, Result<T, TestFault>> {
        match self {
            Step::Ready(result) => Box::pin(std::future::ready(result)),
            Step::Pending(future) => future,
        }
    }

    /// Chains a continuation onto this step, bridging sync and async.
    ///
    /// This is the deferred-aware combinator: a ready success invokes `next`
    /// immediately and returns its step unchanged, so ready-in/ready-out
    /// chains never touch a future. A pending step yields a new pending step
    /// that resolves to `next`'s (possibly awaited) output. `next` observes
    /// exactly one call with exactly one value; failures short-circuit past
    /// it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use thunklet::step::Step;
    /// let chained = Step::ok(2).and_then(|n| Step::ok(n * 10));
    /// assert!(!chained.is_pending());
    /// ```
    pub fn and_then<U: 'static>(self, next: impl FnOnce(T) -> Step<U> + 'static) -> Step<U> {
        match self {
            Step::Ready(Ok(value)) => next(value),
            Step::Ready(Err(fault)) => Step::Ready(Err(fault)),
            Step::Pending(future) => Step::Pending(Box::pin(async move {
                let value = future.await?;
                next(value).into_future().await
            })),
        }
    }

    /// Like [`Step::and_then`], but hands the settled `Result` to the
    /// continuation instead of short-circuiting on failure. `throws` cases
    /// use this to capture a candidate's failure rather than propagate it.
    pub fn settle<U: 'static>(
        self,
        next: impl FnOnce(Result<T, TestFault>) -> Step<U> + 'static,
    ) -> Step<U> {
        match self {
            Step::Ready(result) => next(result),
            Step::Pending(future) => Step::Pending(Box::pin(async move {
                let settled = future.await;
                next(settled).into_future().await
            })),
        }
    }

    /// Maps a successful value, preserving the step's shape.
    pub fn map<U: 'static>(self, f: impl FnOnce(T) -> U + 'static) -> Step<U> {
        self.and_then(|value| Step::ok(f(value)))
    }
}

impl Step<()> {
    /// The unit of a run: already done, nothing produced.
    pub fn done() -> Self {
        Step::Ready(Ok(()))
    }
}

/// How an operation finished: cleanly, or with a one-shot cleanup action the
/// sequencer must run before the next operation starts.
pub enum Outcome {
    Done,
    DoneWithCleanup(Disposer),
}

/// One-shot cleanup scheduled by an operation. Invoked at most once,
/// immediately after the owning operation completes, and awaited if its own
/// result is deferred.
pub type Disposer = Box<dyn FnOnce() -> Step<()>>;

impl Outcome {
    pub fn done() -> Outcome {
        Outcome::Done
    }

    /// Schedules `cleanup` to run once the owning operation completes.
    pub fn cleanup(cleanup: impl FnOnce() -> Step<()> + 'static) -> Outcome {
        Outcome::DoneWithCleanup(Box::new(cleanup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn ready_chain_stays_ready() {
        let step = Step::ok(1).and_then(|n| Step::ok(n + 1)).map(|n| n * 2);
        assert!(!step.is_pending());
        assert_eq!(block_on(step.into_future()).unwrap(), 4);
    }

    #[test]
    fn pending_input_makes_chain_pending() {
        let step = Step::from_future(async { Ok(1) }).and_then(|n| Step::ok(n + 1));
        assert!(step.is_pending());
        assert_eq!(block_on(step.into_future()).unwrap(), 2);
    }

    #[test]
    fn pending_continuation_is_awaited() {
        let step = Step::ok(3).and_then(|n| Step::from_future(async move { Ok(n * 3) }));
        assert!(step.is_pending());
        assert_eq!(block_on(step.into_future()).unwrap(), 9);
    }

    #[test]
    fn failure_short_circuits_and_then() {
        let step: Step<i32> =
            Step::<i32>::fail(TestFault::raised("Oops", "boom")).and_then(|_| panic!("must not run"));
        match step {
            Step::Ready(Err(fault)) => assert_eq!(fault.name(), "Oops"),
            _ => panic!("expected a ready failure"),
        }
    }

    #[test]
    fn settle_observes_failure() {
        let step: Step<i32> = Step::fail(TestFault::raised("Oops", "boom"));
        let recovered = step.settle(|settled| match settled {
            Ok(_) => Step::fail(TestFault::raised("Unexpected", "success")),
            Err(fault) => Step::ok(fault.message()),
        });
        assert_eq!(block_on(recovered.into_future()).unwrap(), "boom");
    }
}
