//! The operation sequencer.
//!
//! Drives an ordered list of zero-argument operations to completion,
//! starting synchronously and switching permanently to an async drive loop
//! the moment any operation or disposer yields a deferred result. Strict
//! left-to-right completion: operation i+1 never starts until operation i
//! and its disposer have fully settled. A fault stops the run at that index;
//! remaining operations never execute.

use std::rc::Rc;

use crate::fault::TestFault;
use crate::step::{Outcome, Step};

/// One schedulable unit of test work: a hook call or a case's
/// invoke-compare-log chain. Re-invocable so a built runnable can be run
/// more than once.
pub type Operation = Rc<dyn Fn() -> Step<Outcome>>;

/// Runs every operation in order.
///
/// Returns a ready step when every operation (and disposer) completed
/// synchronously; otherwise a pending step that resolves once the remaining
/// operations have completed, still in order.
pub fn run(operations: &[Operation]) -> Step<()> {
    let mut index = 0;
    while index < operations.len() {
        match operations[index]() {
            Step::Ready(Ok(Outcome::Done)) => {}
            Step::Ready(Ok(Outcome::DoneWithCleanup(disposer))) => match disposer() {
                Step::Ready(Ok(())) => {}
                Step::Ready(Err(fault)) => return Step::Ready(Err(fault)),
                Step::Pending(cleanup) => {
                    // A deferred disposer flips the rest of the run async.
                    let rest = operations[index + 1..].to_vec();
                    return Step::Pending(Box::pin(async move {
                        cleanup.await?;
                        drive(rest).await
                    }));
                }
            },
            Step::Ready(Err(fault)) => return Step::Ready(Err(fault)),
            Step::Pending(pending) => {
                let rest = operations[index + 1..].to_vec();
                return Step::Pending(Box::pin(async move {
                    finish(pending.await?).await?;
                    drive(rest).await
                }));
            }
        }
        index += 1;
    }
    Step::done()
}

/// Async drive loop: once entered, every remaining operation goes through
/// the deferred path, including synchronous ones.
async fn drive(operations: Vec<Operation>) -> Result<(), TestFault> {
    for operation in operations {
        let outcome = operation().into_future().await?;
        finish(outcome).await?;
    }
    Ok(())
}

async fn finish(outcome: Outcome) -> Result<(), TestFault> {
    if let Outcome::DoneWithCleanup(disposer) = outcome {
        disposer().into_future().await?;
    }
    Ok(())
}
