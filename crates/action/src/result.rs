//! The value every call returns

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ActionFailure, ResultError};
use crate::exception::Exception;
use crate::message::{DEFAULT_ERROR, DEFAULT_SUCCESS};

static NULL: Value = Value::Null;

/// How a run ended. Exactly one per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Completed normally or through `done`.
    Success,
    /// Stopped through `fail`, or a nested failure propagated.
    Failure,
    /// Raised, including contract violations.
    Exception,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failure => f.write_str("failure"),
            Self::Exception => f.write_str("exception"),
        }
    }
}

/// The outcome, message and outputs of one run.
///
/// Immutable once built. Only declared outputs can be read.
#[derive(Debug, Clone)]
pub struct ActionResult {
    action: String,
    outcome: Outcome,
    message: String,
    exception: Option<Exception>,
    outputs: Map<String, Value>,
    declared: Vec<String>,
    elapsed: Duration,
}

impl ActionResult {
    pub(crate) fn new(
        action: &str,
        outcome: Outcome,
        message: String,
        exception: Option<Exception>,
        outputs: Map<String, Value>,
        declared: Vec<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            action: action.to_string(),
            outcome,
            message,
            exception: exception.filter(|e| !e.is_bare_failure()),
            outputs,
            declared,
            elapsed,
        }
    }

    /// A successful result, for stubbing collaborators in tests.
    ///
    /// Every key of `outputs` (an object) counts as declared.
    pub fn ok(message: impl Into<String>, outputs: Value) -> Self {
        let outputs = match outputs {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let message = non_blank(message.into()).unwrap_or_else(|| DEFAULT_SUCCESS.to_string());
        Self {
            action: "ActionResult".to_string(),
            outcome: Outcome::Success,
            message,
            exception: None,
            declared: outputs.keys().cloned().collect(),
            outputs,
            elapsed: Duration::ZERO,
        }
    }

    /// A failed result, or an excepted one when `exception` is given.
    pub fn err(message: impl Into<String>, exception: Option<Exception>) -> Self {
        let message = non_blank(message.into()).unwrap_or_else(|| DEFAULT_ERROR.to_string());
        let exception = exception.filter(|e| !e.is_bare_failure());
        Self {
            action: "ActionResult".to_string(),
            outcome: if exception.is_some() {
                Outcome::Exception
            } else {
                Outcome::Failure
            },
            message,
            exception,
            outputs: Map::new(),
            declared: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// How the run ended.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Whether the run succeeded.
    pub fn is_ok(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Whether the run failed explicitly.
    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Failure
    }

    /// Whether the run raised.
    pub fn is_exception(&self) -> bool {
        self.outcome == Outcome::Exception
    }

    /// The success message, on success.
    pub fn success(&self) -> Option<&str> {
        self.is_ok().then_some(self.message.as_str())
    }

    /// The error message, on failure or exception.
    pub fn error(&self) -> Option<&str> {
        (!self.is_ok()).then_some(self.message.as_str())
    }

    /// Whichever message applies.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The raised exception. `None` on success and for explicit failures.
    pub fn exception(&self) -> Option<&Exception> {
        self.exception.as_ref()
    }

    /// Wall time of the run.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Wall time of the run in seconds.
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Name of the action that produced this result.
    pub fn action_name(&self) -> &str {
        &self.action
    }

    /// The declared outputs that were set or defaulted.
    pub fn outputs(&self) -> &Map<String, Value> {
        &self.outputs
    }

    /// A declared output; `null` when it was never set.
    ///
    /// # Errors
    ///
    /// [`ResultError::MethodNotAllowed`] when `field` was not declared.
    pub fn get(&self, field: &str) -> Result<&Value, ResultError> {
        if !self.declared.iter().any(|name| name == field) {
            return Err(ResultError::MethodNotAllowed {
                action: self.action.clone(),
                field: field.to_string(),
            });
        }
        Ok(self.outputs.get(field).unwrap_or(&NULL))
    }

    /// A declared output deserialized as `T`.
    ///
    /// # Errors
    ///
    /// [`ResultError::MethodNotAllowed`] for undeclared fields,
    /// [`ResultError::Deserialize`] when the value does not fit `T`.
    pub fn output<T: DeserializeOwned>(&self, field: &str) -> Result<T, ResultError> {
        let value = self.get(field)?;
        T::deserialize(value).map_err(|error| ResultError::Deserialize {
            field: field.to_string(),
            reason: error.to_string(),
        })
    }

    pub(crate) fn to_action_failure(&self) -> ActionFailure {
        ActionFailure {
            action: self.action.clone(),
            outcome: self.outcome,
            message: self.message.clone(),
            exception: self.exception.clone(),
        }
    }
}

fn non_blank(text: String) -> Option<String> {
    (!text.trim().is_empty()).then_some(text)
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.action, self.outcome, self.message)
    }
}
