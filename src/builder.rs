//! The fluent test builder.
//!
//! A [`Test`] accumulates hook operations and case/throws operations into
//! ordered lists during the configuration phase, then [`Test::run`] drives
//! them through the sequencer: preprocessing, then every case wrapped in the
//! micro hooks, then postprocessing. Each phase chains into the next with
//! the deferred-aware combinator, so a run built purely from synchronous
//! pieces settles synchronously.
//!
//! Registration order is execution order, both for hooks and for cases. A
//! case registered while N candidates are attached produces N operations,
//! one per candidate, so a single builder verifies every candidate against
//! the same behavioral contract.

use std::rc::Rc;

use crate::context::Context;
use crate::equal::deep_equal;
use crate::fault::{FaultSpec, TestFault};
use crate::render::signature;
use crate::sequence::{self, Operation};
use crate::step::{Outcome, Step};
use crate::trace::SharedTrace;
use crate::value::Value;

/// A function under test: receives the shared context and the bound
/// arguments, resolves to a value or a raised fault, possibly deferred.
pub type CandidateFn = dyn Fn(&Context, &[Value]) -> Step<Value>;

/// A named function under test.
#[derive(Clone)]
pub struct Candidate {
    name: Rc<str>,
    call: Rc<CandidateFn>,
}

impl Candidate {
    pub fn new(
        name: impl Into<String>,
        call: impl Fn(&Context, &[Value]) -> Step<Value> + 'static,
    ) -> Self {
        Candidate {
            name: name.into().into(),
            call: Rc::new(call),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(&self, context: &Context, args: &[Value]) -> Step<Value> {
        (self.call)(context, args)
    }
}

/// Lifecycle hook: runs against the shared context, resolves to unit.
pub type HookFn = dyn Fn(&Context) -> Step<()>;

/// Custom comparison callback for a case: receives the candidate's raw
/// result and may schedule a disposer through its outcome.
pub type PredicateFn = dyn Fn(&Context, Value) -> Step<Outcome>;

/// Custom check for a `throws` case: receives the captured failure and the
/// bound arguments.
pub type CheckerFn = dyn Fn(&Context, TestFault, &[Value]) -> Step<()>;

/// What a case expects of its candidate's result. The shape is decided once
/// at registration time, never re-examined per invocation.
#[derive(Clone)]
pub enum Expectation {
    /// A plain value, asserted deep-equal to the actual result.
    Literal(Value),
    /// A callback judging the raw result itself. The label names it on the
    /// trace line.
    Predicate {
        label: Rc<str>,
        check: Rc<PredicateFn>,
    },
}

impl Expectation {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expectation::Literal(value.into())
    }

    pub fn predicate(
        label: impl Into<String>,
        check: impl Fn(&Context, Value) -> Step<Outcome> + 'static,
    ) -> Self {
        Expectation::Predicate {
            label: label.into().into(),
            check: Rc::new(check),
        }
    }
}

impl From<Value> for Expectation {
    fn from(value: Value) -> Self {
        Expectation::Literal(value)
    }
}

impl From<f64> for Expectation {
    fn from(n: f64) -> Self {
        Expectation::Literal(n.into())
    }
}

impl From<i64> for Expectation {
    fn from(n: i64) -> Self {
        Expectation::Literal(n.into())
    }
}

impl From<i32> for Expectation {
    fn from(n: i32) -> Self {
        Expectation::Literal(n.into())
    }
}

impl From<bool> for Expectation {
    fn from(b: bool) -> Self {
        Expectation::Literal(b.into())
    }
}

impl From<&str> for Expectation {
    fn from(s: &str) -> Self {
        Expectation::Literal(s.into())
    }
}

impl From<String> for Expectation {
    fn from(s: String) -> Self {
        Expectation::Literal(s.into())
    }
}

impl From<Vec<Value>> for Expectation {
    fn from(items: Vec<Value>) -> Self {
        Expectation::Literal(items.into())
    }
}

/// What a `throws` case expects of its candidate's failure.
#[derive(Clone)]
pub enum ErrorExpectation {
    /// An exact name/message descriptor.
    Spec(FaultSpec),
    /// A callback judging the captured failure itself.
    Checker {
        label: Rc<str>,
        check: Rc<CheckerFn>,
    },
}

impl ErrorExpectation {
    pub fn checker(
        label: impl Into<String>,
        check: impl Fn(&Context, TestFault, &[Value]) -> Step<()> + 'static,
    ) -> Self {
        ErrorExpectation::Checker {
            label: label.into().into(),
            check: Rc::new(check),
        }
    }
}

impl From<FaultSpec> for ErrorExpectation {
    fn from(spec: FaultSpec) -> Self {
        ErrorExpectation::Spec(spec)
    }
}

/// The public-facing fluent builder and runnable.
///
/// All state is reference-counted, so `Test` is cheap to clone and a built
/// runnable may be invoked repeatedly with identical behavior. The shared
/// context carries over between runs by design.
///
/// # Examples
///
/// ```rust
/// use thunklet::{args, builder::Test, step::Step, value::Value};
///
/// let add = Test::new("add", |_, args| {
///     let sum = args.iter().filter_map(Value::as_number).sum::<f64>();
///     Step::ok(Value::Number(sum))
/// })
/// .case(args![5, 5], 10)
/// .case(args![1, 2, 3], 6);
///
/// assert!(matches!(add.run(), thunklet::step::Step::Ready(Ok(()))));
/// ```
#[derive(Clone)]
pub struct Test {
    label: Option<String>,
    candidates: Vec<Candidate>,
    context: Rc<Context>,
    trace: SharedTrace,
    operations: Vec<Operation>,
    preprocessing: Vec<Operation>,
    postprocessing: Vec<Operation>,
    micro_preprocessing: Vec<Operation>,
    micro_postprocessing: Vec<Operation>,
}

impl Test {
    /// A builder over one candidate function, no label.
    pub fn new(
        name: impl Into<String>,
        call: impl Fn(&Context, &[Value]) -> Step<Value> + 'static,
    ) -> Self {
        Test::build(None, Candidate::new(name, call))
    }

    /// A builder with a leading story label, logged when the run starts.
    pub fn labeled(
        story: impl Into<String>,
        name: impl Into<String>,
        call: impl Fn(&Context, &[Value]) -> Step<Value> + 'static,
    ) -> Self {
        Test::build(Some(story.into()), Candidate::new(name, call))
    }

    fn build(label: Option<String>, candidate: Candidate) -> Self {
        Test {
            label,
            candidates: vec![candidate],
            context: Rc::new(Context::new()),
            trace: SharedTrace::stdout(),
            operations: Vec::new(),
            preprocessing: Vec::new(),
            postprocessing: Vec::new(),
            micro_preprocessing: Vec::new(),
            micro_postprocessing: Vec::new(),
        }
    }

    /// Attaches another candidate. Only cases registered afterwards apply
    /// to it; cases are expanded per candidate at registration time.
    pub fn also(
        mut self,
        name: impl Into<String>,
        call: impl Fn(&Context, &[Value]) -> Step<Value> + 'static,
    ) -> Self {
        self.candidates.push(Candidate::new(name, call));
        self
    }

    /// Replaces the shared execution context. Use this to share fixture
    /// state with the caller, or to isolate repeated runs.
    pub fn with_context(mut self, context: Rc<Context>) -> Self {
        self.context = context;
        self
    }

    /// Replaces the trace sink.
    pub fn with_trace(mut self, trace: SharedTrace) -> Self {
        self.trace = trace;
        self
    }

    /// The context every hook and case of this builder observes.
    pub fn context(&self) -> Rc<Context> {
        self.context.clone()
    }

    /// Appends a preprocessing hook, run once before the first case.
    pub fn before(mut self, hook: impl Fn(&Context) -> Step<()> + 'static) -> Self {
        self.preprocessing
            .push(hook_operation(self.context.clone(), hook));
        self
    }

    /// Appends a postprocessing hook, run once after the last case.
    pub fn after(mut self, hook: impl Fn(&Context) -> Step<()> + 'static) -> Self {
        self.postprocessing
            .push(hook_operation(self.context.clone(), hook));
        self
    }

    /// Appends a hook run before every case operation.
    pub fn before_each(mut self, hook: impl Fn(&Context) -> Step<()> + 'static) -> Self {
        self.micro_preprocessing
            .push(hook_operation(self.context.clone(), hook));
        self
    }

    /// Appends a hook run after every case operation.
    pub fn after_each(mut self, hook: impl Fn(&Context) -> Step<()> + 'static) -> Self {
        self.micro_postprocessing
            .push(hook_operation(self.context.clone(), hook));
        self
    }

    /// Registers one case per attached candidate: invoke with `args`, judge
    /// the result against `expected`, log one success line.
    pub fn case(mut self, args: Vec<Value>, expected: impl Into<Expectation>) -> Self {
        let expected = expected.into();
        for candidate in &self.candidates {
            self.operations.push(case_operation(
                self.context.clone(),
                self.trace.clone(),
                candidate.clone(),
                args.clone(),
                expected.clone(),
            ));
        }
        self
    }

    /// Registers one throws-case per attached candidate: invoke with
    /// `args`, require a failure, judge it against `expected`.
    pub fn throws(mut self, args: Vec<Value>, expected: impl Into<ErrorExpectation>) -> Self {
        let expected = expected.into();
        for candidate in &self.candidates {
            self.operations.push(throws_operation(
                self.context.clone(),
                self.trace.clone(),
                candidate.clone(),
                args.clone(),
                expected.clone(),
            ));
        }
        self
    }

    /// Runs everything registered so far, in registration order.
    ///
    /// Phases never overlap: preprocessing, then every case wrapped in the
    /// micro hooks, then postprocessing. The step is ready when every phase
    /// settled synchronously; otherwise it is pending and resolves once all
    /// phases have completed. The first fault terminates the run; later
    /// phases (including `after` hooks) do not execute, which is why
    /// guaranteed cleanup belongs in a disposer, not in `after`.
    pub fn run(&self) -> Step<()> {
        if let Some(story) = &self.label {
            self.trace.emit(&format!("-- {}", story));
        }
        let body: Vec<Operation> = self
            .operations
            .iter()
            .flat_map(|operation| {
                let mut group = self.micro_preprocessing.clone();
                group.push(operation.clone());
                group.extend(self.micro_postprocessing.iter().cloned());
                group
            })
            .collect();
        let postprocessing = self.postprocessing.clone();
        sequence::run(&self.preprocessing)
            .and_then(move |_| sequence::run(&body))
            .and_then(move |_| sequence::run(&postprocessing))
    }
}

fn hook_operation(
    context: Rc<Context>,
    hook: impl Fn(&Context) -> Step<()> + 'static,
) -> Operation {
    Rc::new(move || hook(&context).map(|_| Outcome::Done))
}

fn case_operation(
    context: Rc<Context>,
    trace: SharedTrace,
    candidate: Candidate,
    args: Vec<Value>,
    expected: Expectation,
) -> Operation {
    match expected {
        Expectation::Literal(expected) => {
            let line = format!(
                " \u{2713} {} -> {}",
                signature(candidate.name(), &args),
                expected
            );
            Rc::new(move || {
                let trace = trace.clone();
                let line = line.clone();
                let expected = expected.clone();
                candidate
                    .invoke(&context, &args)
                    .and_then(move |actual| match check_equal(&expected, &actual, &trace) {
                        Ok(()) => {
                            trace.emit(&line);
                            Step::ok(Outcome::Done)
                        }
                        Err(fault) => Step::fail(fault),
                    })
            })
        }
        Expectation::Predicate { label, check } => {
            let line = format!(
                " \u{2713} {} |> {}",
                signature(candidate.name(), &args),
                label
            );
            Rc::new(move || {
                let trace = trace.clone();
                let line = line.clone();
                let check = check.clone();
                let context_for_check = context.clone();
                candidate
                    .invoke(&context, &args)
                    .and_then(move |actual| check(&context_for_check, actual))
                    .and_then(move |outcome| {
                        // The success line lands before any disposer runs.
                        trace.emit(&line);
                        Step::ok(outcome)
                    })
            })
        }
    }
}

fn throws_operation(
    context: Rc<Context>,
    trace: SharedTrace,
    candidate: Candidate,
    args: Vec<Value>,
    expected: ErrorExpectation,
) -> Operation {
    match expected {
        ErrorExpectation::Spec(spec) => {
            let sig = signature(candidate.name(), &args);
            let line = format!(" \u{2713} {} throws {}", sig, spec);
            Rc::new(move || {
                let trace = trace.clone();
                let line = line.clone();
                let spec = spec.clone();
                let sig = sig.clone();
                candidate
                    .invoke(&context, &args)
                    .settle(move |settled| match settled {
                        Ok(_) => Step::fail(TestFault::DidNotThrow { signature: sig }),
                        Err(fault) => match check_fault(&spec, &fault, &trace) {
                            Ok(()) => {
                                trace.emit(&line);
                                Step::ok(Outcome::Done)
                            }
                            Err(fault) => Step::fail(fault),
                        },
                    })
            })
        }
        ErrorExpectation::Checker { label, check } => {
            let sig = signature(candidate.name(), &args);
            let line = format!(" \u{2713} {} throws; {}", sig, label);
            Rc::new(move || {
                let trace = trace.clone();
                let line = line.clone();
                let check = check.clone();
                let sig = sig.clone();
                let context_for_check = context.clone();
                let args_for_check = args.clone();
                candidate
                    .invoke(&context, &args)
                    .settle(move |settled| match settled {
                        Ok(_) => Step::fail(TestFault::DidNotThrow { signature: sig }),
                        Err(fault) => check(&context_for_check, fault, &args_for_check)
                            .and_then(move |_| {
                                trace.emit(&line);
                                Step::ok(Outcome::Done)
                            }),
                    })
            })
        }
    }
}

/// Deep-equality assertion: on mismatch, dumps both sides to the trace and
/// produces the `not equal` fault.
fn check_equal(expected: &Value, actual: &Value, trace: &SharedTrace) -> Result<(), TestFault> {
    if deep_equal(expected, actual) {
        return Ok(());
    }
    trace.emit(&format!("expect {}", expected));
    trace.emit(&format!("actual {}", actual));
    Err(TestFault::NotEqual {
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}

/// Descriptor assertion: name first, then message, each with its own fault
/// so the caller can tell which field differed.
fn check_fault(spec: &FaultSpec, fault: &TestFault, trace: &SharedTrace) -> Result<(), TestFault> {
    if fault.name() != spec.name {
        trace.emit("");
        trace.emit(&format!("-- expect: {}", spec.name));
        trace.emit(&format!("-- actual: {}", fault.name()));
        return Err(TestFault::ErrorNamesDiffer {
            expected: spec.name.clone(),
            actual: fault.name().to_string(),
        });
    }
    if fault.message() != spec.message {
        trace.emit("");
        trace.emit(&format!("-- expect: {}", spec.message));
        trace.emit(&format!("-- actual: {}", fault.message()));
        return Err(TestFault::ErrorMessagesDiffer {
            expected: spec.message.clone(),
            actual: fault.message(),
        });
    }
    Ok(())
}
