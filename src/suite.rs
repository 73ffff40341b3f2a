//! The batch runner: composes independently built runnables into one.

use crate::fault::TestFault;
use crate::step::Step;
use crate::Test;

/// An ordered collection of runnables, driven with the same
/// stay-synchronous-as-long-as-possible discipline as the sequencer.
pub struct Suite {
    tests: Vec<Test>,
}

impl Suite {
    pub fn all(tests: Vec<Test>) -> Self {
        Suite { tests }
    }

    /// Runs every test strictly in order. The moment one run is deferred,
    /// the remainder of the batch moves to an async drive loop and stays
    /// there; completion order still equals registration order.
    pub fn run(&self) -> Step<()> {
        let mut index = 0;
        while index < self.tests.len() {
            match self.tests[index].run() {
                Step::Ready(Ok(())) => {}
                Step::Ready(Err(fault)) => return Step::Ready(Err(fault)),
                Step::Pending(pending) => {
                    let rest = self.tests[index + 1..].to_vec();
                    return Step::Pending(Box::pin(async move {
                        pending.await?;
                        drive(rest).await
                    }));
                }
            }
            index += 1;
        }
        Step::done()
    }
}

async fn drive(tests: Vec<Test>) -> Result<(), TestFault> {
    for test in tests {
        test.run().into_future().await?;
    }
    Ok(())
}
