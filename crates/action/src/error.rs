use actuate_validator::foundation::ValidationErrors;

use crate::exception::Exception;
use crate::result::Outcome;

/// Declaration-time errors.
///
/// Raised by [`ActionBuilder::build`](crate::ActionBuilder::build) and never
/// wrapped into a result: an action with an invalid declaration cannot be
/// constructed at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The same field name was declared twice (inbound and outbound share
    /// one namespace).
    #[error("field `{field}` is already declared")]
    DuplicateField {
        /// The repeated name.
        field: String,
    },

    /// The field name collides with a result accessor or context primitive.
    #[error("field `{field}` uses a reserved name")]
    ReservedName {
        /// The offending name.
        field: String,
    },

    /// A model lookup was configured on a field that does not follow the
    /// `<record>_id` naming convention.
    #[error("model lookup on `{field}` requires a name ending in `_id`")]
    InvalidModelField {
        /// The offending name.
        field: String,
    },

    /// Both `when` and `unless` were supplied for one entry.
    #[error("{what}: `when` and `unless` cannot be combined")]
    ConflictingConditions {
        /// Which declaration carried both.
        what: String,
    },

    /// An origin filter (`from`) was combined with a `when`/`unless` guard.
    #[error("{what}: `from` cannot be combined with `when` or `unless`")]
    FromWithCondition {
        /// Which declaration carried both.
        what: String,
    },

    /// An exception-shaped callable, exception type check or derived message
    /// was registered where no exception is ever available.
    #[error("{what}: no exception is available here")]
    ExceptionUnavailable {
        /// Which declaration is affected.
        what: String,
    },

    /// A named method was registered as an alias of another named method.
    #[error("method `{name}` cannot refer to another method")]
    MethodAlias {
        /// The method name.
        name: String,
    },

    /// No body was supplied and none was inherited.
    #[error("action `{action}` has no body")]
    MissingBody {
        /// The action name.
        action: String,
    },
}

/// Errors raised when reading a [`ActionResult`](crate::ActionResult).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ResultError {
    /// The field is not declared as an output of the action.
    #[error("`{field}` is not an exposed field of {action}")]
    MethodNotAllowed {
        /// The action whose result was read.
        action: String,
        /// The requested field.
        field: String,
    },

    /// The stored output could not be deserialized into the requested type.
    #[error("output `{field}` has an unexpected shape: {reason}")]
    Deserialize {
        /// The requested field.
        field: String,
        /// The serde error text.
        reason: String,
    },
}

/// The inbound contract rejected the call's inputs.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct InboundValidationError(pub ValidationErrors);

/// The body's exposed outputs violate the outbound contract.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct OutboundValidationError(pub ValidationErrors);

/// The body exposed a field that is not declared outbound.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{field}` is not declared as an output")]
pub struct UnknownExposure {
    /// The rejected field.
    pub field: String,
}

/// Inputs were not a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("inputs must be a JSON object, got {kind}")]
pub struct InvalidInputs {
    /// The JSON kind that was supplied.
    pub kind: &'static str,
}

/// A body or lifecycle hook panicked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("panicked: {message}")]
pub struct PanicError {
    /// The panic payload, when it was a string.
    pub message: String,
}

impl PanicError {
    pub(crate) fn from_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self { message }
    }
}

/// An explicit failure signalled with [`fail`](crate::fail).
///
/// Carries no backtrace significance; results never expose it as their
/// exception.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .message.as_deref().unwrap_or("Execution was halted"))]
pub struct Failure {
    /// The message given to `fail`, if any.
    pub message: Option<String>,
}

/// A failed or excepted run surfaced as an error.
///
/// Produced by bang-mode calls. Its message is the run's resolved error
/// message; the underlying exception, when there was one, stays reachable.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ActionFailure {
    pub(crate) action: String,
    pub(crate) outcome: Outcome,
    pub(crate) message: String,
    pub(crate) exception: Option<Exception>,
}

impl ActionFailure {
    /// Name of the action that did not succeed.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Whether the run failed explicitly or raised.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// The resolved error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The exception that caused the outcome, if any.
    pub fn exception(&self) -> Option<&Exception> {
        self.exception.as_ref()
    }
}
