//! End-to-end builder behavior: cases, throws, hooks, the shared context,
//! trace output, and batch composition.

use std::cell::RefCell;
use std::rc::Rc;

use futures::executor::block_on;
use thunklet::step::{Outcome, Step};
use thunklet::{args, Context, ErrorExpectation, Expectation, FaultSpec, SharedTrace, Suite, Test, TestFault, Value};

fn add(_: &Context, args: &[Value]) -> Step<Value> {
    let sum = args.iter().filter_map(Value::as_number).sum::<f64>();
    Step::ok(Value::Number(sum))
}

fn async_add(_: &Context, args: &[Value]) -> Step<Value> {
    let sum = args.iter().filter_map(Value::as_number).sum::<f64>();
    Step::from_future(async move { Ok(Value::Number(sum)) })
}

fn always_type_error(_: &Context, _: &[Value]) -> Step<Value> {
    Step::fail(TestFault::raised("TypeError", "cannot add"))
}

#[test]
fn a_passing_case_emits_exactly_one_trace_line() {
    let (trace, captured) = SharedTrace::buffer();
    let test = Test::new("add", add)
        .with_trace(trace)
        .case(args![5, 5], 10);
    assert!(matches!(test.run(), Step::Ready(Ok(()))));
    assert_eq!(captured.borrow().lines(), [" \u{2713} add(5, 5) -> 10"]);
}

#[test]
fn a_labeled_test_announces_itself_first() {
    let (trace, captured) = SharedTrace::buffer();
    let test = Test::labeled("addition works", "add", add)
        .with_trace(trace)
        .case(args![1, 2], 3);
    test.run();
    let lines = captured.borrow();
    assert_eq!(lines.lines()[0], "-- addition works");
    assert!(lines.lines()[1].starts_with(" \u{2713} add(1, 2)"));
}

#[test]
fn every_candidate_is_verified_against_each_case() {
    let (trace, captured) = SharedTrace::buffer();
    let test = Test::new("double_loop", |_, args: &[Value]| {
        let n = args[0].as_number().unwrap_or(0.0);
        Step::ok(Value::Number(n + n))
    })
    .also("double_mul", |_, args: &[Value]| {
        let n = args[0].as_number().unwrap_or(0.0);
        Step::ok(Value::Number(n * 2.0))
    })
    .with_trace(trace)
    .case(args![2], 4);
    assert!(matches!(test.run(), Step::Ready(Ok(()))));
    assert_eq!(
        captured.borrow().lines(),
        [
            " \u{2713} double_loop(2) -> 4",
            " \u{2713} double_mul(2) -> 4",
        ]
    );
}

#[test]
fn a_failed_case_dumps_both_sides_and_stops_the_run() {
    let (trace, captured) = SharedTrace::buffer();
    let calls = Rc::new(RefCell::new(0));
    let counted = calls.clone();
    let test = Test::new("add", move |cx: &Context, args: &[Value]| {
        *counted.borrow_mut() += 1;
        add(cx, args)
    })
    .with_trace(trace)
    .case(args![5, 5], 11)
    .case(args![1, 1], 2);
    match test.run() {
        Step::Ready(Err(TestFault::NotEqual { expected, actual })) => {
            assert_eq!(expected, "11");
            assert_eq!(actual, "10");
        }
        _ => panic!("expected a not-equal fault"),
    }
    // The second case never started.
    assert_eq!(*calls.borrow(), 1);
    assert_eq!(captured.borrow().lines(), ["expect 11", "actual 10"]);
}

#[test]
fn predicate_expectations_see_the_raw_result() {
    let (trace, captured) = SharedTrace::buffer();
    let test = Test::new("add", add).with_trace(trace).case(
        args![2, 3],
        Expectation::predicate("is-five", |_, actual| {
            assert_eq!(actual, Value::Number(5.0));
            Step::ok(Outcome::Done)
        }),
    );
    assert!(matches!(test.run(), Step::Ready(Ok(()))));
    assert_eq!(captured.borrow().lines(), [" \u{2713} add(2, 3) |> is-five"]);
}

#[test]
fn a_disposer_runs_once_after_the_success_line_and_before_the_next_operation() {
    let (trace, captured) = SharedTrace::buffer();
    let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
    let predicate_log = log.clone();
    let lines_at_cleanup = captured.clone();
    let test = Test::new("add", add)
        .with_trace(trace)
        .case(
            args![1, 1],
            Expectation::predicate("checked", move |_, _| {
                predicate_log.borrow_mut().push("case");
                let log = predicate_log.clone();
                let lines = lines_at_cleanup.clone();
                Step::ok(Outcome::cleanup(move || {
                    // The success line is already on the trace.
                    assert!(lines
                        .borrow()
                        .lines()
                        .iter()
                        .any(|line| line.contains("|> checked")));
                    log.borrow_mut().push("cleanup");
                    Step::done()
                }))
            }),
        )
        .case(args![2, 2], Expectation::predicate("next", {
            let log = log.clone();
            move |_, _| {
                log.borrow_mut().push("next");
                Step::ok(Outcome::Done)
            }
        }));
    assert!(matches!(test.run(), Step::Ready(Ok(()))));
    assert_eq!(*log.borrow(), ["case", "cleanup", "next"]);
}

#[test]
fn hooks_wrap_cases_in_registration_order() {
    let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
    let push = |tag: &'static str| {
        let log = log.clone();
        move |_: &Context| {
            log.borrow_mut().push(tag);
            Step::done()
        }
    };
    let case_log = log.clone();
    let test = Test::new("noop", move |_, _| {
        case_log.borrow_mut().push("case");
        Step::ok(Value::Nil)
    })
    .with_trace(SharedTrace::new(thunklet::trace::NullTrace))
    .before(push("before"))
    .after(push("after"))
    .before_each(push("before_each"))
    .after_each(push("after_each"))
    .case(args![], Value::Nil)
    .case(args![], Value::Nil);
    assert!(matches!(test.run(), Step::Ready(Ok(()))));
    assert_eq!(
        *log.borrow(),
        [
            "before",
            "before_each",
            "case",
            "after_each",
            "before_each",
            "case",
            "after_each",
            "after",
        ]
    );
}

#[test]
fn hooks_share_fixture_state_through_the_context() {
    let test = Test::new("read_flag", |cx: &Context, _: &[Value]| {
        Step::ok(cx.get("flag").unwrap_or(Value::Nil))
    })
    .with_trace(SharedTrace::new(thunklet::trace::NullTrace))
    .before(|cx| {
        cx.set("flag", "ready");
        Step::done()
    })
    .case(args![], "ready");
    assert!(matches!(test.run(), Step::Ready(Ok(()))));
}

#[test]
fn a_hook_can_initialize_a_slot_exactly_once() {
    let test = Test::new("greet", |cx: &Context, _: &[Value]| {
        let name = cx
            .get("name")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        Step::ok(Value::from(format!("hi {}", name)))
    })
    .with_trace(SharedTrace::new(thunklet::trace::NullTrace))
    .before_each(|cx| {
        if !cx.contains("name") {
            cx.set("name", "ada");
        }
        Step::done()
    })
    .case(args![], "hi ada")
    .case(args![], "hi ada");
    assert!(matches!(test.run(), Step::Ready(Ok(()))));
}

#[test]
fn the_context_is_not_reset_between_runs() {
    let test = Test::new("noop", |_, _| Step::ok(Value::Nil))
        .with_trace(SharedTrace::new(thunklet::trace::NullTrace))
        .before(|cx| {
            cx.update("runs", |prior| {
                let n = prior.and_then(|v| v.as_number()).unwrap_or(0.0);
                Value::Number(n + 1.0)
            });
            Step::done()
        })
        .case(args![], Value::Nil);
    test.run();
    test.run();
    assert_eq!(test.context().get("runs"), Some(Value::Number(2.0)));
}

#[test]
fn a_caller_supplied_context_is_observable_from_outside() {
    let context = Rc::new(Context::new());
    context.set("seed", 41);
    let test = Test::new("bump", |cx: &Context, _: &[Value]| {
        let n = cx.get("seed").and_then(|v| v.as_number()).unwrap_or(0.0);
        cx.set("seed", n + 1.0);
        Step::ok(Value::Number(n + 1.0))
    })
    .with_context(context.clone())
    .with_trace(SharedTrace::new(thunklet::trace::NullTrace))
    .case(args![], 42);
    assert!(matches!(test.run(), Step::Ready(Ok(()))));
    assert_eq!(context.get("seed"), Some(Value::Number(42.0)));
}

#[test]
fn a_fully_synchronous_run_settles_synchronously() {
    let test = Test::new("add", add)
        .with_trace(SharedTrace::new(thunklet::trace::NullTrace))
        .before(|_| Step::done())
        .after(|_| Step::done())
        .case(args![1, 1], 2);
    assert!(!test.run().is_pending());
}

#[test]
fn one_asynchronous_hook_defers_the_whole_run() {
    let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
    let before_log = log.clone();
    let after_log = log.clone();
    let test = Test::new("add", add)
        .with_trace(SharedTrace::new(thunklet::trace::NullTrace))
        .before(move |_| {
            let log = before_log.clone();
            Step::from_future(async move {
                log.borrow_mut().push("before");
                Ok(())
            })
        })
        .after(move |_| {
            after_log.borrow_mut().push("after");
            Step::done()
        })
        .case(args![1, 2], 3);
    let step = test.run();
    assert!(step.is_pending());
    block_on(step.into_future()).unwrap();
    // Every phase completed, still in order.
    assert_eq!(*log.borrow(), ["before", "after"]);
}

#[test]
fn an_asynchronous_candidate_defers_the_case_phase() {
    let (trace, captured) = SharedTrace::buffer();
    let test = Test::new("async_add", async_add)
        .with_trace(trace)
        .case(args![5, 5], 10);
    let step = test.run();
    assert!(step.is_pending());
    block_on(step.into_future()).unwrap();
    assert_eq!(captured.borrow().lines(), [" \u{2713} async_add(5, 5) -> 10"]);
}

#[test]
fn throws_matches_an_exact_error_descriptor() {
    let (trace, captured) = SharedTrace::buffer();
    let test = Test::new("boom", always_type_error)
        .with_trace(trace)
        .throws(args![1], FaultSpec::new("TypeError", "cannot add"));
    assert!(matches!(test.run(), Step::Ready(Ok(()))));
    assert_eq!(
        captured.borrow().lines(),
        [" \u{2713} boom(1) throws TypeError('cannot add')"]
    );
}

#[test]
fn throws_fails_when_the_candidate_does_not_throw() {
    let test = Test::new("add", add)
        .with_trace(SharedTrace::new(thunklet::trace::NullTrace))
        .throws(args![1, 2], FaultSpec::new("TypeError", "cannot add"));
    match test.run() {
        Step::Ready(Err(fault)) => {
            assert!(matches!(fault, TestFault::DidNotThrow { .. }));
            assert_eq!(fault.to_string(), "did not throw");
        }
        _ => panic!("expected a did-not-throw fault"),
    }
}

#[test]
fn throws_distinguishes_name_and_message_mismatches() {
    let name_mismatch = Test::new("boom", always_type_error)
        .with_trace(SharedTrace::new(thunklet::trace::NullTrace))
        .throws(args![], FaultSpec::new("RangeError", "cannot add"));
    assert!(matches!(
        name_mismatch.run(),
        Step::Ready(Err(TestFault::ErrorNamesDiffer { .. }))
    ));

    let message_mismatch = Test::new("boom", always_type_error)
        .with_trace(SharedTrace::new(thunklet::trace::NullTrace))
        .throws(args![], FaultSpec::new("TypeError", "cannot subtract"));
    assert!(matches!(
        message_mismatch.run(),
        Step::Ready(Err(TestFault::ErrorMessagesDiffer { .. }))
    ));
}

#[test]
fn throws_checker_receives_the_failure_and_the_bound_args() {
    let (trace, captured) = SharedTrace::buffer();
    let test = Test::new("boom", always_type_error).with_trace(trace).throws(
        args![7, "x"],
        ErrorExpectation::checker("is-type-error", |_, fault, args| {
            assert_eq!(fault.name(), "TypeError");
            assert_eq!(fault.message(), "cannot add");
            assert_eq!(args[0], Value::Number(7.0));
            assert_eq!(args[1], Value::from("x"));
            Step::done()
        }),
    );
    assert!(matches!(test.run(), Step::Ready(Ok(()))));
    assert_eq!(
        captured.borrow().lines(),
        [" \u{2713} boom(7, 'x') throws; is-type-error"]
    );
}

#[test]
fn throws_works_for_deferred_failures() {
    let test = Test::new("boom_later", |_, _| {
        Step::from_future(async { Err(TestFault::raised("TypeError", "later")) })
    })
    .with_trace(SharedTrace::new(thunklet::trace::NullTrace))
    .throws(args![], FaultSpec::new("TypeError", "later"));
    let step = test.run();
    assert!(step.is_pending());
    assert!(block_on(step.into_future()).is_ok());
}

#[test]
fn a_suite_preserves_order_across_sync_and_async_members() {
    let (trace, captured) = SharedTrace::buffer();
    let first = Test::labeled("first", "async_add", async_add)
        .with_trace(trace.clone())
        .case(args![1, 1], 2);
    let second = Test::labeled("second", "add", add)
        .with_trace(trace.clone())
        .case(args![2, 2], 4);
    let third = Test::labeled("third", "add", add)
        .with_trace(trace.clone())
        .case(args![3, 3], 6);

    let suite = Suite::all(vec![first, second, third]);
    let step = suite.run();
    assert!(step.is_pending());
    block_on(step.into_future()).unwrap();

    let lines = captured.borrow();
    assert_eq!(
        lines.lines(),
        [
            "-- first",
            " \u{2713} async_add(1, 1) -> 2",
            "-- second",
            " \u{2713} add(2, 2) -> 4",
            "-- third",
            " \u{2713} add(3, 3) -> 6",
        ]
    );
}

#[test]
fn an_all_synchronous_suite_settles_synchronously() {
    let quiet = SharedTrace::new(thunklet::trace::NullTrace);
    let first = Test::new("add", add)
        .with_trace(quiet.clone())
        .case(args![1, 1], 2);
    let second = Test::new("add", add)
        .with_trace(quiet)
        .case(args![2, 2], 4);
    assert!(!Suite::all(vec![first, second]).run().is_pending());
}

#[test]
fn nil_arguments_render_as_undefined_but_nil_results_as_unit() {
    let (trace, captured) = SharedTrace::buffer();
    let test = Test::new("identity", |_, args: &[Value]| {
        Step::ok(args.first().cloned().unwrap_or(Value::Nil))
    })
    .with_trace(trace)
    .case(vec![Value::Nil], Value::Nil);
    assert!(matches!(test.run(), Step::Ready(Ok(()))));
    assert_eq!(
        captured.borrow().lines(),
        [" \u{2713} identity(undefined) -> ()"]
    );
}
