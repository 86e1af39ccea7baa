//! Integration tests for the execution lifecycle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actuate_action::prelude::*;
use actuate_action::{
    InboundValidationError, InvalidInputs, OutboundValidationError, PanicError, Profiler,
    ReportContext, RuntimeConfig, UnknownExposure,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

type Log = Arc<Mutex<Vec<String>>>;

#[derive(Debug, thiserror::Error)]
#[error("boom")]
struct Boom;

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn push(log: &Log, entry: &'static str) -> impl Fn(&mut ActionContext) -> Control + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |_: &mut ActionContext| {
        log.lock().unwrap().push(entry.to_string());
        Ok(())
    }
}

fn handler(log: &Log, entry: &'static str) -> Handler {
    let log = Arc::clone(log);
    Handler::new(Callback::plain(move |_| {
        log.lock().unwrap().push(entry.to_string());
        Ok(())
    }))
}

fn wrap(log: &Log, name: &'static str) -> Around {
    let log = Arc::clone(log);
    Around::new(move |ctx, next| {
        log.lock().unwrap().push(format!("{name} in"));
        let control = next(ctx);
        log.lock().unwrap().push(format!("{name} out"));
        control
    })
}

// ============================================================================
// ORDERING
// ============================================================================

#[test]
fn hooks_run_in_order_around_the_body() {
    let log = Log::default();
    let action = ActionBuilder::new("Ordered")
        .before(push(&log, "before 1"))
        .before(push(&log, "before 2"))
        .around_with(wrap(&log, "outer"))
        .around_with(wrap(&log, "inner"))
        .after(push(&log, "after"))
        .on_success(handler(&log, "success 1"))
        .on_success(handler(&log, "success 2"))
        .on_error(handler(&log, "error"))
        .body(push(&log, "body"))
        .build()
        .unwrap();

    let result = action.call(json!({}));

    assert!(result.is_ok());
    assert_eq!(
        entries(&log),
        vec![
            "before 1",
            "before 2",
            "outer in",
            "inner in",
            "body",
            "inner out",
            "outer out",
            "after",
            "success 2",
            "success 1",
        ]
    );
}

#[test]
fn inherited_hooks_run_ancestor_first() {
    let log = Log::default();
    let parent = ActionBuilder::new("Parent")
        .before(push(&log, "parent before"))
        .on_success(handler(&log, "parent success"))
        .on_error(handler(&log, "parent error"))
        .body(push(&log, "body"))
        .build()
        .unwrap();
    let child = ActionBuilder::extend(&parent, "Child")
        .before(push(&log, "child before"))
        .on_success(handler(&log, "child success"))
        .on_error(handler(&log, "child error"))
        .build()
        .unwrap();

    child.call(json!({}));
    assert_eq!(
        entries(&log),
        vec![
            "parent before",
            "child before",
            "body",
            "child success",
            "parent success",
        ]
    );

    log.lock().unwrap().clear();
    let failing = ActionBuilder::extend(&child, "Failing")
        .body(|_| Err(fail("no")))
        .build()
        .unwrap();
    failing.call(json!({}));
    assert_eq!(
        entries(&log),
        vec!["parent before", "child before", "parent error", "child error"]
    );
}

// ============================================================================
// EARLY EXITS
// ============================================================================

#[test]
fn done_skips_the_rest_and_succeeds() {
    let log = Log::default();
    let action = ActionBuilder::new("Early")
        .exposes("note", Field::new())
        .before(|ctx| Err(ctx.done_with("Nothing to do", [("note", json!("skipped"))])))
        .after(push(&log, "after"))
        .on_success(handler(&log, "success"))
        .body(push(&log, "body"))
        .success("Did the work")
        .build()
        .unwrap();

    let result = action.call(json!({}));

    assert!(result.is_ok());
    assert_eq!(result.success(), Some("Nothing to do"));
    assert_eq!(result.get("note").unwrap(), "skipped");
    assert_eq!(entries(&log), vec!["success"]);
}

#[test]
fn fail_skips_after_hooks_and_runs_failure_handlers() {
    let log = Log::default();
    let action = ActionBuilder::new("Failing")
        .body(|_| Err(fail("bad")))
        .after(push(&log, "after"))
        .on_success(handler(&log, "success"))
        .on_error(handler(&log, "error"))
        .on_failure(handler(&log, "failure"))
        .on_exception(handler(&log, "exception"))
        .error("generic")
        .build()
        .unwrap();

    let result = action.call(json!({}));

    assert!(result.is_failure());
    assert_eq!(result.error(), Some("bad"));
    assert!(result.exception().is_none());
    assert_eq!(entries(&log), vec!["error", "failure"]);
}

#[test]
fn done_in_the_body_skips_after_hooks() {
    let log = Log::default();
    let action = ActionBuilder::new("Shortcut")
        .body(|_| Err(done("Already there")))
        .after(push(&log, "after"))
        .on_success(handler(&log, "success"))
        .success("Did the work")
        .build()
        .unwrap();

    let result = action.call(json!({}));

    assert!(result.is_ok());
    assert_eq!(result.success(), Some("Already there"));
    assert_eq!(entries(&log), vec!["success"]);
}

#[test]
fn after_hook_errors_except_the_run() {
    let log = Log::default();
    let action = ActionBuilder::new("Unlucky")
        .body(push(&log, "body"))
        .after(|_| Err(Boom.into()))
        .after(push(&log, "second after"))
        .on_success(handler(&log, "success"))
        .on_exception(handler(&log, "exception"))
        .build()
        .unwrap();

    let result = action.call(json!({}));

    assert!(result.is_exception());
    assert!(result.exception().unwrap().is::<Boom>());
    assert_eq!(entries(&log), vec!["body", "exception"]);
}

#[test]
fn guarded_failure_handler_sees_the_message() {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    let action = ActionBuilder::new("Guarded")
        .body(|_| Err(fail("bad")))
        .on_failure(
            Handler::new(Callback::plain(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .when(Condition::exception(|_, e| Ok(e.message() == Some("bad")))),
        )
        .on_failure(
            Handler::new(Callback::plain(|_| anyhow::bail!("never runs")))
                .when(Condition::exception(|_, e| Ok(e.message() == Some("other")))),
        )
        .build()
        .unwrap();

    let result = action.call(json!({}));

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(result.error(), Some("bad"));
}

#[test]
fn raised_errors_run_exception_handlers() {
    let log = Log::default();
    let action = ActionBuilder::new("Raising")
        .body(|_| Err(Boom.into()))
        .on_error(handler(&log, "error"))
        .on_failure(handler(&log, "failure"))
        .on_exception(handler(&log, "exception"))
        .build()
        .unwrap();

    let result = action.call(json!({}));

    assert!(result.is_exception());
    assert!(result.exception().unwrap().is::<Boom>());
    assert_eq!(result.error(), Some("Something went wrong"));
    assert_eq!(entries(&log), vec!["error", "exception"]);
}

#[test]
fn before_hook_errors_skip_the_body() {
    let log = Log::default();
    let action = ActionBuilder::new("Blocked")
        .before(|_| Err(Interrupt::raise(Boom)))
        .body(push(&log, "body"))
        .after(push(&log, "after"))
        .build()
        .unwrap();

    assert!(action.call(json!({})).is_exception());
    assert!(entries(&log).is_empty());
}

#[test]
fn panics_become_exceptions() {
    let action = ActionBuilder::new("Panicky")
        .body(|_| panic!("kaboom"))
        .build()
        .unwrap();

    let result = action.call(json!({}));

    assert!(result.is_exception());
    let exception = result.exception().unwrap();
    assert_eq!(
        exception.downcast_ref::<PanicError>().unwrap().message,
        "kaboom"
    );
}

#[rstest]
#[case::completes(Outcome::Success)]
#[case::fails(Outcome::Failure)]
#[case::raises(Outcome::Exception)]
fn exactly_one_outcome(#[case] expected: Outcome) {
    let action = ActionBuilder::new("Outcomes")
        .body(move |_| match expected {
            Outcome::Success => Ok(()),
            Outcome::Failure => Err(fail("")),
            Outcome::Exception => Err(Boom.into()),
        })
        .build()
        .unwrap();

    let result = action.call(json!({}));
    let flags = [result.is_ok(), result.is_failure(), result.is_exception()];

    assert_eq!(result.outcome(), expected);
    assert_eq!(flags.iter().filter(|f| **f).count(), 1);
}

// ============================================================================
// HANDLER ISOLATION
// ============================================================================

#[test]
fn handler_errors_never_change_the_outcome() {
    let log = Log::default();
    let action = ActionBuilder::new("Isolated")
        .on_success(handler(&log, "first"))
        .on_success(Handler::new(Callback::plain(|_| panic!("handler panic"))))
        .on_success(Handler::new(Callback::plain(|_| anyhow::bail!("handler error"))))
        .on_success(
            handler(&log, "guarded")
                .when(Condition::callable(|_| anyhow::bail!("guard error"))),
        )
        .success("Still fine")
        .body(|_| Ok(()))
        .build()
        .unwrap();

    let result = action.call(json!({}));

    assert!(result.is_ok());
    assert_eq!(result.success(), Some("Still fine"));
    assert_eq!(entries(&log), vec!["first"]);
}

#[test]
#[should_panic(expected = "error raised while running an on_success handler")]
fn handler_errors_are_loud_when_opted_in() {
    let runtime = Runtime::new(RuntimeConfig {
        environment: actuate_log::Environment::Test,
        raise_piping_errors_outside_production: true,
        ..RuntimeConfig::default()
    });
    let action = ActionBuilder::new("Loud")
        .on_success(Handler::new(Callback::plain(|_| anyhow::bail!("handler error"))))
        .body(|_| Ok(()))
        .build()
        .unwrap();

    action.call_in(&runtime, json!({}));
}

// ============================================================================
// CONTRACTS
// ============================================================================

#[test]
fn inbound_violation_is_an_exception_with_readable_message() {
    let log = Log::default();
    let action = ActionBuilder::new("Threshold")
        .expects(
            "foo",
            Field::of(FieldType::Numeric).numericality(Numericality::new().greater_than(10)),
        )
        .before(push(&log, "before"))
        .body(push(&log, "body"))
        .build()
        .unwrap();

    let result = action.call(json!({ "foo": 9 }));

    assert!(!result.is_ok());
    assert!(result.exception().unwrap().is::<InboundValidationError>());
    assert_eq!(result.error(), Some("Foo must be greater than 10"));
    assert!(entries(&log).is_empty());

    assert!(action.call(json!({ "foo": 11 })).is_ok());
}

#[test]
fn inputs_must_be_an_object() {
    let action = ActionBuilder::new("Shape").body(|_| Ok(())).build().unwrap();

    let result = action.call(json!([1, 2]));
    assert!(result.exception().unwrap().is::<InvalidInputs>());
    assert!(action.call(Value::Null).is_ok());
}

#[test]
fn outbound_violation_is_an_exception() {
    let action = ActionBuilder::new("Totals")
        .exposes("total", Field::of(FieldType::Integer))
        .body(|ctx| ctx.expose("total", "many"))
        .build()
        .unwrap();

    let result = action.call(json!({}));

    assert!(result.is_exception());
    assert!(result.exception().unwrap().is::<OutboundValidationError>());
    assert_eq!(result.error(), Some("Total is not an Integer"));
}

#[test]
fn missing_output_is_an_exception() {
    let action = ActionBuilder::new("Forgetful")
        .exposes("total", Field::new())
        .body(|_| Ok(()))
        .build()
        .unwrap();

    let result = action.call(json!({}));
    assert_eq!(result.error(), Some("Total can't be blank"));
}

#[test]
fn exposing_undeclared_fields_raises() {
    let action = ActionBuilder::new("Leaky")
        .body(|ctx| ctx.expose("secret", 42))
        .build()
        .unwrap();

    let result = action.call(json!({}));
    assert!(result.exception().unwrap().is::<UnknownExposure>());
}

#[test]
fn output_defaults_apply_on_failure_too() {
    let action = ActionBuilder::new("Pending")
        .exposes("status", Field::new().default("pending"))
        .exposes("count", Field::of(FieldType::Integer))
        .body(|ctx| Err(ctx.fail_with("stopped", [("count", json!(3))])))
        .build()
        .unwrap();

    let result = action.call(json!({}));

    assert!(result.is_failure());
    assert_eq!(result.get("status").unwrap(), "pending");
    assert_eq!(result.output::<u32>("count").unwrap(), 3);
    assert!(result.get("other").is_err());
}

#[test]
fn inputs_are_validated_and_defaulted_before_the_body() {
    let action = ActionBuilder::new("Defaults")
        .expects("name", Field::of(FieldType::String))
        .expects("greeting", Field::new().default("Hello"))
        .expects("loud", Field::of(FieldType::Boolean).default(true))
        .exposes("text", Field::of(FieldType::String))
        .body(|ctx| {
            let greeting: String = ctx.input_as("greeting")?;
            let name: String = ctx.input_as("name")?;
            let loud: bool = ctx.input_as("loud")?;
            let text = format!("{greeting}, {name}");
            ctx.expose("text", if loud { text.to_uppercase() } else { text })
        })
        .build()
        .unwrap();

    let result = action.call(json!({ "name": "Ada", "loud": false }));
    assert_eq!(result.get("text").unwrap(), "Hello, Ada");

    let result = action.call(json!({ "name": "Ada" }));
    assert_eq!(result.get("text").unwrap(), "HELLO, ADA");
}

// ============================================================================
// RUNTIME COLLABORATORS
// ============================================================================

#[test]
fn reporter_sees_redacted_context_for_exceptions_only() {
    let reports: Arc<Mutex<Vec<ReportContext>>> = Arc::default();
    let sink = Arc::clone(&reports);
    let runtime = Runtime::default().with_reporter(
        move |e: &Exception, _ctx: &ActionContext, report: &ReportContext| {
            assert!(e.is::<Boom>());
            sink.lock().unwrap().push(report.clone());
            Ok(())
        },
    );

    let action = ActionBuilder::new("Charge")
        .expects("id", Field::of(FieldType::Integer))
        .expects("token", Field::of(FieldType::String).sensitive())
        .additional_context(|_| {
            let mut fields = serde_json::Map::new();
            fields.insert("region".into(), json!("eu"));
            Ok(fields)
        })
        .body(|ctx| {
            ctx.set_context("attempt", 2);
            if ctx.input_as::<u32>("id")? == 1 {
                return Err(Boom.into());
            }
            Err(fail("declined"))
        })
        .build()
        .unwrap();

    action.call_in(&runtime, json!({ "id": 1, "token": "s3cr3t" }));
    action.call_in(&runtime, json!({ "id": 2, "token": "s3cr3t" }));

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.action, "Charge");
    assert_eq!(report.inputs["token"], "[FILTERED]");
    assert_eq!(
        report.retry_command,
        r#"Charge.call({"id":1,"token":"[FILTERED]"})"#
    );
    assert_eq!(report.extra["attempt"], 2);
    assert_eq!(report.extra["region"], "eu");
}

#[test]
fn reporter_failures_are_contained() {
    let runtime = Runtime::default().with_reporter(
        |_: &Exception, _: &ActionContext, _: &ReportContext| -> anyhow::Result<()> {
            anyhow::bail!("reporter down")
        },
    );
    let action = ActionBuilder::new("Raising")
        .body(|_| Err(Boom.into()))
        .error("Could not finish")
        .build()
        .unwrap();

    let result = action.call_in(&runtime, json!({}));
    assert_eq!(result.error(), Some("Could not finish"));
}

fn recording(reports: &Arc<Mutex<Vec<ReportContext>>>) -> Runtime {
    let sink = Arc::clone(reports);
    Runtime::default().with_reporter(
        move |_: &Exception, _: &ActionContext, report: &ReportContext| -> anyhow::Result<()> {
            sink.lock().unwrap().push(report.clone());
            Ok(())
        },
    )
}

#[test]
fn reports_filter_sensitive_subfields_inside_their_parent() {
    let reports: Arc<Mutex<Vec<ReportContext>>> = Arc::default();
    let runtime = recording(&reports);
    let action = ActionBuilder::new("Leak")
        .expects("creds", Field::of(FieldType::Params))
        .expects("token", Field::new().on("creds").sensitive())
        .body(|_| Err(Boom.into()))
        .build()
        .unwrap();

    action.call_in(&runtime, json!({ "creds": { "token": "s3cr3t" } }));

    let reports = reports.lock().unwrap();
    let report = &reports[0];
    assert!(!report.retry_command.contains("s3cr3t"));
    assert_eq!(
        report.retry_command,
        r#"Leak.call({"creds":{"token":"[FILTERED]"},"token":"[FILTERED]"})"#
    );
    assert_eq!(report.inputs["creds"]["token"], "[FILTERED]");
}

#[test]
fn reports_carry_ambient_attributes_and_the_host() {
    let reports: Arc<Mutex<Vec<ReportContext>>> = Arc::default();
    let runtime = recording(&reports);
    let action = ActionBuilder::new("Sync")
        .attach(Arc::new(Account))
        .body(|_| Err(Boom.into()))
        .build()
        .unwrap();
    let bare = ActionBuilder::new("Bare")
        .body(|_| Err(Boom.into()))
        .build()
        .unwrap();

    actuate_log::Context::new()
        .with_request_id("req-42")
        .with_field("tenant", "acme")
        .scope_sync(|| action.call_in(&runtime, json!({})));
    bare.call_in(&runtime, json!({}));

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(
        reports[0].ambient,
        Some(json!({ "request_id": "req-42", "tenant": "acme" }))
    );
    assert_eq!(reports[0].host.as_deref(), Some("Account"));
    assert_eq!(reports[1].ambient, None);
    assert_eq!(reports[1].host, None);
}

#[derive(Clone, Default)]
struct CountingProfiler {
    started: Arc<AtomicUsize>,
    stopped: Arc<AtomicUsize>,
}

impl Profiler for CountingProfiler {
    fn start(&self, _action: &str) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self, _action: &str, _elapsed: Duration) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn profiler_runs_only_when_condition_holds() {
    let profiler = CountingProfiler::default();
    let runtime = Runtime::default().with_profiler(profiler.clone());

    let profiled = ActionBuilder::new("Profiled")
        .expects("slow", Field::of(FieldType::Boolean).default(false))
        .profile_if(Condition::callable(|ctx| Ok(ctx.input_as::<bool>("slow")?)))
        .body(|_| Ok(()))
        .build()
        .unwrap();

    profiled.call_in(&runtime, json!({ "slow": true }));
    profiled.call_in(&runtime, json!({}));

    assert_eq!(profiler.started.load(Ordering::SeqCst), 1);
    assert_eq!(profiler.stopped.load(Ordering::SeqCst), 1);
}

// ============================================================================
// CONTEXT FEATURES
// ============================================================================

#[test]
fn memoize_computes_once_per_run() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let action = ActionBuilder::new("Memo")
        .exposes("total", Field::of(FieldType::Integer))
        .body(move |ctx| {
            let expensive = |_: &ActionContext| {
                counter.fetch_add(1, Ordering::SeqCst);
                21_u32
            };
            let a = ctx.memoize("answer", expensive);
            let b = ctx.memoize("answer", expensive);
            ctx.expose("total", a + b)
        })
        .build()
        .unwrap();

    assert_eq!(action.call(json!({})).output::<u32>("total").unwrap(), 42);
    assert_eq!(action.call(json!({})).output::<u32>("total").unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

struct Account;

impl actuate_action::Host for Account {
    fn name(&self) -> &str {
        "Account"
    }

    fn get(&self, key: &str) -> Option<Value> {
        (key == "plan").then(|| json!("pro"))
    }
}

#[test]
fn attached_host_is_reachable() {
    let action = ActionBuilder::new("Upgrade")
        .attach(Arc::new(Account))
        .exposes("plan", Field::new())
        .body(|ctx| {
            let plan = ctx.host().and_then(|host| host.get("plan"));
            ctx.expose("plan", plan)
        })
        .build()
        .unwrap();

    assert_eq!(action.call(json!({})).get("plan").unwrap(), "pro");
}

#[test]
fn bang_call_surfaces_failure_as_error() {
    let action = ActionBuilder::new("Strict")
        .body(|_| Err(fail("not today")))
        .build()
        .unwrap();

    let failure = action.call_bang(json!({})).unwrap_err();
    assert_eq!(failure.to_string(), "not today");
    assert_eq!(failure.action(), "Strict");
    assert_eq!(failure.outcome(), Outcome::Failure);

    let ok = ActionBuilder::new("Fine").body(|_| Ok(())).build().unwrap();
    assert!(ok.call_bang(json!({})).is_ok());
}

#[test]
fn success_message_from_static_rule() {
    let action = ActionBuilder::new("Cheerful")
        .success("Great!")
        .body(|_| Ok(()))
        .build()
        .unwrap();

    let result = action.call(json!({}));
    assert_eq!(result.success(), Some("Great!"));
    assert!(result.elapsed_time() >= 0.0);
    assert_eq!(result.action_name(), "Cheerful");
}
