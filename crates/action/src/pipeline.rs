//! The execution pipeline
//!
//! One call moves through a fixed sequence of stages:
//!
//! ```text
//! Pending -> Validating -> Running -> Succeeded | Failed | Excepted -> Finalized
//! ```
//!
//! Validation, hooks and the body decide the outcome. Everything after that
//! point (outbound checks aside) is bookkeeping that may log but never
//! changes what the caller sees.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use actuate_log::Level;
use serde_json::{Map, Value};
use tracing::{info_span, trace, trace_span};

use crate::action::Definition;
use crate::context::{ActionContext, Frame};
use crate::error::{InboundValidationError, InvalidInputs, OutboundValidationError, PanicError};
use crate::exception::{Control, Exception, Interrupt};
use crate::field::Direction;
use crate::handler::{Around, Event, Lifecycle, dispatch};
use crate::message::{self, MessageKind};
use crate::piping::PipingSink;
use crate::result::{ActionResult, Outcome};
use crate::runtime::{ReportContext, Runtime};

/// Emit an event at a level chosen at run time.
macro_rules! log_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            Level::Trace => tracing::trace!($($arg)+),
            Level::Debug => tracing::debug!($($arg)+),
            Level::Info => tracing::info!($($arg)+),
            Level::Warn => tracing::warn!($($arg)+),
            Level::Error => tracing::error!($($arg)+),
        }
    };
}

/// Where a run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Created, nothing run yet.
    Pending,
    /// Checking inbound fields.
    Validating,
    /// Hooks and body.
    Running,
    /// The body completed or called `done`.
    Succeeded,
    /// The run called `fail`.
    Failed,
    /// Something raised.
    Excepted,
    /// Result built.
    Finalized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Validating => "validating",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Excepted => "excepted",
            Self::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

/// The outcome of validation, hooks and body.
enum Flow {
    Succeeded { message: Option<String> },
    Failed(Exception),
    Excepted(Exception),
}

impl Flow {
    fn stage(&self) -> Stage {
        match self {
            Self::Succeeded { .. } => Stage::Succeeded,
            Self::Failed(_) => Stage::Failed,
            Self::Excepted(_) => Stage::Excepted,
        }
    }

    fn outcome(&self) -> Outcome {
        match self {
            Self::Succeeded { .. } => Outcome::Success,
            Self::Failed(_) => Outcome::Failure,
            Self::Excepted(_) => Outcome::Exception,
        }
    }
}

impl From<Control> for Flow {
    fn from(control: Control) -> Self {
        match control {
            Ok(()) => Self::Succeeded { message: None },
            Err(Interrupt::Done { message }) => Self::Succeeded { message },
            Err(Interrupt::Fail(exception)) => Self::Failed(exception),
            Err(Interrupt::Raise(exception)) => Self::Excepted(exception),
        }
    }
}

/// The before/after execution log lines of one run.
struct CallLog {
    level: Option<Level>,
    prefix: String,
    separator: bool,
}

impl CallLog {
    fn new(def: &Definition, runtime: &Runtime, frame: &Frame) -> Self {
        let config = runtime.config();
        let enabled = def.log_calls.unwrap_or(config.log_calls);
        Self {
            level: enabled.then(|| def.log_level.unwrap_or(config.log_level)),
            prefix: format!("[{}]", frame.breadcrumb()),
            separator: enabled
                && config.log_separators
                && frame.depth() == 0
                && !config.environment.is_production(),
        }
    }

    fn start(&self, inputs: &Map<String, Value>) {
        let Some(level) = self.level else { return };
        if self.separator {
            log_at!(level, "{}", "-".repeat(40));
        }
        let inputs = Value::Object(inputs.clone());
        log_at!(level, "{} About to execute with: {inputs}", self.prefix);
    }

    fn finish(&self, outcome: Outcome, elapsed_ms: f64) {
        let Some(level) = self.level else { return };
        log_at!(
            level,
            "{} Execution completed (with outcome: {outcome}) in {elapsed_ms:.3} milliseconds",
            self.prefix
        );
    }
}

/// Run `def` once.
pub(crate) fn run(def: &Arc<Definition>, runtime: &Runtime, frame: Frame, inputs: Value) -> ActionResult {
    let started = runtime.clock.now();
    let span = info_span!("action", action = %def.name, depth = frame.depth());
    let _entered = span.enter();

    let sink = PipingSink::new(&def.name, runtime.config());
    let log = CallLog::new(def, runtime, &frame);
    let mut ctx = ActionContext::new(Arc::clone(def), runtime.clone(), frame);
    trace!(stage = %Stage::Pending);

    let mut flow = match into_object(inputs) {
        Ok(raw) => {
            log.start(&def.contract.redact(&raw));
            trace!(stage = %Stage::Validating);
            match def.contract.validate_with(&raw, Direction::Inbound, &sink) {
                Ok(validated) => {
                    ctx.inputs = validated;
                    trace!(stage = %Stage::Running);
                    Flow::from(execute(&mut ctx, &sink))
                }
                Err(errors) => {
                    let message = errors.to_string();
                    Flow::Excepted(Exception::new(InboundValidationError(errors)).with_message(message))
                }
            }
        }
        Err(invalid) => {
            log.start(&Map::new());
            Flow::Excepted(Exception::new(invalid))
        }
    };

    let raw_outputs = std::mem::take(&mut ctx.outputs);
    let checked = if matches!(flow, Flow::Succeeded { .. }) {
        def.contract
            .validate_with(&raw_outputs, Direction::Outbound, &sink)
            .map_err(|errors| {
                let message = errors.to_string();
                Exception::new(OutboundValidationError(errors)).with_message(message)
            })
    } else {
        Ok(def.contract.fill_defaults(&raw_outputs, Direction::Outbound, &sink))
    };
    ctx.outputs = match checked {
        Ok(outputs) => outputs,
        Err(exception) => {
            flow = Flow::Excepted(exception);
            def.contract.fill_defaults(&raw_outputs, Direction::Outbound, &sink)
        }
    };
    trace!(stage = %flow.stage());

    let (message, exception) = match &flow {
        Flow::Succeeded { message } => {
            dispatch(Event::Success, &def.hooks, &ctx, None, &sink);
            let text = message::resolve(MessageKind::Success, &ctx, None, message.as_deref(), &sink);
            (text, None)
        }
        Flow::Failed(exception) => {
            dispatch(Event::Error, &def.hooks, &ctx, Some(exception), &sink);
            dispatch(Event::Failure, &def.hooks, &ctx, Some(exception), &sink);
            let explicit = exception
                .message()
                .filter(|_| exception.origin().is_none() || exception.hoist_prefix().is_some());
            let text = message::resolve(MessageKind::Error, &ctx, Some(exception), explicit, &sink);
            (text, Some(exception.clone()))
        }
        Flow::Excepted(exception) => {
            dispatch(Event::Error, &def.hooks, &ctx, Some(exception), &sink);
            dispatch(Event::Exception, &def.hooks, &ctx, Some(exception), &sink);
            report(&ctx, exception, &sink);
            let text = message::resolve(MessageKind::Error, &ctx, Some(exception), None, &sink);
            (text, Some(exception.clone()))
        }
    };

    let elapsed = runtime.clock.now().saturating_sub(started);
    let outcome = flow.outcome();
    trace!(stage = %Stage::Finalized);
    log.finish(outcome, elapsed.as_secs_f64() * 1000.0);

    ActionResult::new(
        &def.name,
        outcome,
        message,
        exception,
        ctx.outputs,
        def.contract.outbound_names(),
        elapsed,
    )
}

fn into_object(inputs: Value) -> Result<Map<String, Value>, InvalidInputs> {
    match inputs {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        Value::Bool(_) => Err(InvalidInputs { kind: "a boolean" }),
        Value::Number(_) => Err(InvalidInputs { kind: "a number" }),
        Value::String(_) => Err(InvalidInputs { kind: "a string" }),
        Value::Array(_) => Err(InvalidInputs { kind: "an array" }),
    }
}

/// Before hooks, the around chain with the body at its centre, after hooks.
fn execute(ctx: &mut ActionContext, sink: &PipingSink<'_>) -> Control {
    let def = Arc::clone(&ctx.def);
    run_lifecycle(&def.hooks.before, ctx, sink, "before")?;
    run_around(&def.hooks.around, ctx, sink)?;
    run_lifecycle(&def.hooks.after, ctx, sink, "after")
}

/// Call `f`, turning a panic into a raised [`PanicError`].
fn invoke<F>(ctx: &mut ActionContext, f: F) -> Control
where
    F: FnOnce(&mut ActionContext) -> Control,
{
    match catch_unwind(AssertUnwindSafe(|| f(ctx))) {
        Ok(control) => control,
        Err(payload) => Err(Interrupt::raise(PanicError::from_payload(payload.as_ref()))),
    }
}

fn run_lifecycle(
    hooks: &[Lifecycle],
    ctx: &mut ActionContext,
    sink: &PipingSink<'_>,
    kind: &str,
) -> Control {
    let what = format!("checking a {kind} hook condition");
    for hook in hooks {
        if !hook.guard.allows(ctx, None, sink, &what) {
            continue;
        }
        invoke(ctx, |ctx| (hook.callback)(ctx))?;
    }
    Ok(())
}

fn run_around(hooks: &[Around], ctx: &mut ActionContext, sink: &PipingSink<'_>) -> Control {
    let Some((hook, inner)) = hooks.split_first() else {
        return run_body(ctx, sink);
    };
    if !hook
        .guard
        .allows(ctx, None, sink, "checking an around hook condition")
    {
        return run_around(inner, ctx, sink);
    }
    invoke(ctx, |ctx| {
        (hook.callback)(ctx, &mut |ctx: &mut ActionContext| run_around(inner, ctx, sink))
    })
}

fn run_body(ctx: &mut ActionContext, sink: &PipingSink<'_>) -> Control {
    let def = Arc::clone(&ctx.def);
    let Some(body) = &def.body else {
        return Ok(());
    };

    let profiler = ctx.runtime.profiler.clone().filter(|_| {
        def.profile_if.as_ref().is_some_and(|condition| {
            sink.guard("checking the profile_if condition", || {
                condition.evaluate(ctx, None)
            })
            .unwrap_or(false)
        })
    });

    let _span = trace_span!("body", action = %def.name).entered();
    if let Some(profiler) = &profiler {
        sink.guard("starting the profiler", || {
            profiler.start(&def.name);
            Ok(())
        });
    }
    let clock = Arc::clone(&ctx.runtime.clock);
    let started = clock.now();

    let control = invoke(ctx, |ctx| body(ctx));

    if let Some(profiler) = &profiler {
        let elapsed = clock.now().saturating_sub(started);
        sink.guard("stopping the profiler", || {
            profiler.stop(&def.name, elapsed);
            Ok(())
        });
    }
    control
}

/// Hand an escaped exception to the runtime's reporter.
fn report(ctx: &ActionContext, exception: &Exception, sink: &PipingSink<'_>) {
    let Some(reporter) = ctx.runtime.reporter.clone() else {
        return;
    };
    let inputs = ctx.def.contract.redact(&ctx.inputs);
    let mut extra = ctx.extra.clone();
    if let Some(additional) = &ctx.def.additional_context
        && let Some(fields) = sink.guard("building additional context", || additional(ctx))
    {
        extra.extend(fields);
    }
    let ambient = actuate_log::Context::current();
    let report = ReportContext {
        action: ctx.name().to_string(),
        host: ctx.host().map(|host| host.name().to_string()),
        retry_command: format!("{}.call({})", ctx.name(), Value::Object(inputs.clone())),
        inputs,
        outputs: ctx.def.contract.redact(&ctx.outputs),
        ambient: (!ambient.is_empty()).then(|| ambient.to_value()),
        extra,
    };
    sink.guard("reporting the exception", || {
        reporter.report(exception, ctx, &report)
    });
}
