//! Thunklet: a declarative test-case builder.
//!
//! Register argument/expected-result pairs and lifecycle hooks against one
//! or more candidate functions, then invoke the produced runnable. The run
//! executes every registered operation in order, synchronously while it can
//! and switching to deferred execution the moment any step yields a pending
//! result. Expected values are compared with a structural deep-equality
//! engine spanning lists, ordered maps, sets, buffers, and records.
//!
//! ```rust
//! use thunklet::{args, step::Step, value::Value, Test};
//!
//! let test = Test::labeled("addition", "add", |_, args| {
//!     let sum = args.iter().filter_map(Value::as_number).sum::<f64>();
//!     Step::ok(Value::Number(sum))
//! })
//! .case(args![5, 5], 10)
//! .case(args![0, 0], 0);
//!
//! assert!(!test.run().is_pending());
//! ```

pub mod builder;
pub mod context;
pub mod equal;
pub mod fault;
pub mod render;
pub mod sequence;
pub mod step;
pub mod suite;
pub mod trace;
pub mod value;

pub use builder::{Candidate, ErrorExpectation, Expectation, Test};
pub use context::Context;
pub use equal::{deep_equal, same_value_zero};
pub use fault::{FaultSpec, TestFault};
pub use sequence::Operation;
pub use step::{Disposer, Outcome, Step};
pub use suite::Suite;
pub use trace::{SharedTrace, TraceBuffer, TraceSink};
pub use value::Value;
