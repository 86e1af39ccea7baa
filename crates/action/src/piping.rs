//! The sink for errors raised by ancillary callables
//!
//! Message sources, predicates, handlers, custom validators, defaults and the
//! exception reporter may all fail. None of those failures may change a run's
//! outcome: they are logged here and the pipeline carries on. Developers can
//! opt into a loud panic outside production with
//! [`RuntimeConfig::raise_piping_errors_outside_production`](crate::RuntimeConfig).

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::warn;

use crate::config::RuntimeConfig;
use crate::error::PanicError;

#[derive(Debug, Clone, Copy)]
pub(crate) struct PipingSink<'a> {
    action: &'a str,
    raise_loudly: bool,
}

impl<'a> PipingSink<'a> {
    pub(crate) fn new(action: &'a str, config: &RuntimeConfig) -> Self {
        Self {
            action,
            raise_loudly: config.raise_piping_errors_outside_production
                && !config.environment.is_production(),
        }
    }

    /// A sink that only logs, for contract checks run outside a pipeline.
    pub(crate) fn detached() -> Self {
        Self {
            action: "(detached)",
            raise_loudly: false,
        }
    }

    pub(crate) fn report(&self, what: &str, error: &anyhow::Error) {
        warn!(
            action = self.action,
            what,
            error = %error,
            "Ignoring error raised while {what}: {error:#}"
        );
        if self.raise_loudly {
            panic!("[{}] error raised while {what}: {error:#}", self.action);
        }
    }

    /// Run a fallible callable, routing both its error and any panic to the
    /// sink.
    pub(crate) fn guard<T>(&self, what: &str, f: impl FnOnce() -> anyhow::Result<T>) -> Option<T> {
        let outcome = match catch_unwind(AssertUnwindSafe(f)) {
            Ok(outcome) => outcome,
            Err(payload) => Err(anyhow::Error::new(PanicError::from_payload(payload.as_ref()))),
        };
        match outcome {
            Ok(value) => Some(value),
            Err(error) => {
                self.report(what, &error);
                None
            }
        }
    }
}
