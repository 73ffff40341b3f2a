//! Failure model for test runs.
//!
//! A run resolves to `Result<_, TestFault>`. Assertion variants are raised by
//! the harness itself when an expectation is unmet; `Raised` carries a
//! failure produced by a candidate function or a hook, propagated unchanged
//! to the runnable's caller. Nothing is recovered locally and there is no
//! retry: the first fault terminates the run at that operation.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// The single failure type threaded through every step of a run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum TestFault {
    /// A case's actual result was not deep-equal to the expected value.
    #[error("not equal")]
    #[diagnostic(
        code(thunklet::assertion::not_equal),
        help("expect/actual dumps precede this fault on the trace stream")
    )]
    NotEqual { expected: String, actual: String },

    /// A `throws` case's candidate completed without failing.
    #[error("did not throw")]
    #[diagnostic(
        code(thunklet::assertion::did_not_throw),
        help("{signature} completed without failing")
    )]
    DidNotThrow { signature: String },

    /// A captured failure's name differed from the expected descriptor's.
    #[error("error names are different")]
    #[diagnostic(code(thunklet::assertion::error_name))]
    ErrorNamesDiffer { expected: String, actual: String },

    /// A captured failure's message differed from the expected descriptor's.
    #[error("error messages are different")]
    #[diagnostic(code(thunklet::assertion::error_message))]
    ErrorMessagesDiffer { expected: String, actual: String },

    /// A failure raised by a candidate function, hook, or callback.
    #[error("{name}: {message}")]
    #[diagnostic(code(thunklet::raised))]
    Raised { name: String, message: String },
}

impl TestFault {
    /// A candidate-raised failure with an arbitrary error name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use thunklet::fault::TestFault;
    /// let fault = TestFault::raised("TypeError", "cannot add");
    /// assert_eq!(fault.name(), "TypeError");
    /// assert_eq!(fault.message(), "cannot add");
    /// ```
    pub fn raised(name: impl Into<String>, message: impl Into<String>) -> Self {
        TestFault::Raised {
            name: name.into(),
            message: message.into(),
        }
    }

    /// The failure's name. Every assertion variant reports `AssertionError`.
    pub fn name(&self) -> &str {
        match self {
            TestFault::Raised { name, .. } => name,
            _ => "AssertionError",
        }
    }

    /// The failure's bare message, without the name prefix.
    pub fn message(&self) -> String {
        match self {
            TestFault::Raised { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Expected-error descriptor accepted by `throws`: a captured failure
/// matches when both its name and its message are exactly equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultSpec {
    pub name: String,
    pub message: String,
}

impl FaultSpec {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        FaultSpec {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FaultSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}('{}')", self.name, self.message)
    }
}
