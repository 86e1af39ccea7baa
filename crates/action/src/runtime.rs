//! The runtime every action executes against
//!
//! A [`Runtime`] bundles configuration with the process-level collaborators
//! an action may need: an exception reporter, a profiler, a clock. It is
//! cheap to clone and is passed down to nested calls unchanged.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::action::Action;
use crate::config::RuntimeConfig;
use crate::context::ActionContext;
use crate::exception::Exception;
use crate::result::ActionResult;

/// Receives every exception that escapes a run.
///
/// Errors and panics raised while reporting are logged and never change
/// the run's outcome.
pub trait ExceptionReporter: Send + Sync {
    /// Report `exception` raised while running `ctx`'s action.
    ///
    /// # Errors
    ///
    /// Any error is treated as a piping error.
    fn report(
        &self,
        exception: &Exception,
        ctx: &ActionContext,
        report: &ReportContext,
    ) -> anyhow::Result<()>;
}

impl<F> ExceptionReporter for F
where
    F: Fn(&Exception, &ActionContext, &ReportContext) -> anyhow::Result<()> + Send + Sync,
{
    fn report(
        &self,
        exception: &Exception,
        ctx: &ActionContext,
        report: &ReportContext,
    ) -> anyhow::Result<()> {
        self(exception, ctx, report)
    }
}

/// Wraps body execution when an action's `profile_if` condition holds.
pub trait Profiler: Send + Sync {
    /// Called right before the body runs.
    fn start(&self, action: &str);
    /// Called right after the body returns.
    fn stop(&self, action: &str, elapsed: Duration);
}

/// Source of monotonic time for elapsed measurements.
pub trait Clock: Send + Sync {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

/// [`Clock`] backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// An object an action is attached to, reachable from the body through
/// [`ActionContext::host`].
pub trait Host: Send + Sync {
    /// Display name, carried in exception reports.
    fn name(&self) -> &str;

    /// Look up a named attribute on the host.
    fn get(&self, _key: &str) -> Option<Value> {
        None
    }
}

/// Context handed to the [`ExceptionReporter`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportContext {
    /// Name of the action that raised.
    pub action: String,
    /// Name of the attached [`Host`], if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Validated inputs, sensitive values filtered.
    pub inputs: Map<String, Value>,
    /// Outputs at the time of failure, sensitive values filtered.
    pub outputs: Map<String, Value>,
    /// Text that reruns the action with the same (filtered) inputs.
    pub retry_command: String,
    /// Request-scoped attributes from [`actuate_log::Context`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambient: Option<Value>,
    /// Diagnostic fields from `set_context` and `additional_context`.
    pub extra: Map<String, Value>,
}

/// Configuration plus collaborators, threaded through every call.
///
/// ```rust
/// use actuate_action::{ActionContext, Exception, ReportContext, Runtime, RuntimeConfig};
///
/// let runtime = Runtime::new(RuntimeConfig {
///     default_error: Some("Please try again".into()),
///     ..RuntimeConfig::default()
/// })
/// .with_reporter(|e: &Exception, _ctx: &ActionContext, report: &ReportContext| {
///     tracing::error!(action = %report.action, "{e}");
///     Ok(())
/// });
/// # let _ = runtime;
/// ```
#[derive(Clone)]
pub struct Runtime {
    config: Arc<RuntimeConfig>,
    pub(crate) reporter: Option<Arc<dyn ExceptionReporter>>,
    pub(crate) profiler: Option<Arc<dyn Profiler>>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl Runtime {
    /// A runtime with `config` and no collaborators.
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config: Arc::new(config),
            reporter: None,
            profiler: None,
            clock: Arc::new(MonotonicClock::default()),
        }
    }

    /// A runtime configured from the process environment.
    pub fn from_env() -> Self {
        Self::new(RuntimeConfig::from_env())
    }

    /// Install the exception reporter.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_reporter(mut self, reporter: impl ExceptionReporter + 'static) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    /// Install the profiler.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_profiler(mut self, profiler: impl Profiler + 'static) -> Self {
        self.profiler = Some(Arc::new(profiler));
        self
    }

    /// Replace the clock.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// The configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Run `action` against this runtime.
    pub fn call(&self, action: &Action, inputs: Value) -> ActionResult {
        action.call_in(self, inputs)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("reporter", &self.reporter.is_some())
            .field("profiler", &self.profiler.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_advances() {
        let clock = MonotonicClock::default();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }

    #[test]
    fn default_runtime_is_inert() {
        let runtime = Runtime::default();
        assert!(runtime.reporter.is_none());
        assert!(runtime.profiler.is_none());
        assert!(runtime.config().log_calls);
    }

    #[test]
    fn report_context_nests_extra_fields() {
        let mut extra = Map::new();
        extra.insert("attempt".into(), Value::from(2));
        let report = ReportContext {
            action: "Demo".into(),
            host: None,
            inputs: Map::new(),
            outputs: Map::new(),
            retry_command: "Demo.call({})".into(),
            ambient: None,
            extra,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["extra"]["attempt"], 2);
        assert!(value.get("attempt").is_none());
        assert!(value.get("ambient").is_none());
        assert!(value.get("host").is_none());
    }
}
