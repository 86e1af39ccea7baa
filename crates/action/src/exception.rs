//! Raised errors and the control-flow signals a run can end with
//!
//! A body or hook returns [`Control`]; the `Err` side is an [`Interrupt`]
//! telling the pipeline how the run stops early:
//!
//! - [`Interrupt::Done`] completes successfully (see [`done`])
//! - [`Interrupt::Fail`] is an explicit failure (see [`fail`])
//! - [`Interrupt::Raise`] carries an unexpected error
//!
//! Any `std::error::Error` converts into `Interrupt::Raise` through `?`.

use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::error::{ActionFailure, Failure};

/// What a body or hook returns.
pub type Control<T = ()> = Result<T, Interrupt>;

/// A cloneable, type-erased error captured during a run.
///
/// Besides the error itself it records the concrete type name (for
/// late-bound matching), an optional user-facing message set when raising,
/// the nested action it came from and the backtrace at capture time.
///
/// `Exception` deliberately does not implement [`std::error::Error`], so that
/// every error type can convert into [`Interrupt`] without overlap.
#[derive(Clone)]
pub struct Exception {
    error: Arc<dyn StdError + Send + Sync + 'static>,
    type_name: &'static str,
    message: Option<String>,
    origin: Option<String>,
    hoist_prefix: Option<String>,
    backtrace: Arc<Backtrace>,
}

impl Exception {
    /// Capture an error.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            error: Arc::new(error),
            type_name: std::any::type_name::<E>(),
            message: None,
            origin: None,
            hoist_prefix: None,
            backtrace: Arc::new(Backtrace::capture()),
        }
    }

    /// Capture an `anyhow` error.
    pub fn from_anyhow(error: anyhow::Error) -> Self {
        let boxed: Box<dyn StdError + Send + Sync + 'static> = error.into();
        Self {
            error: Arc::from(boxed),
            type_name: "anyhow::Error",
            message: None,
            origin: None,
            hoist_prefix: None,
            backtrace: Arc::new(Backtrace::capture()),
        }
    }

    /// Attach the user-facing message for this error.
    ///
    /// An explicit message takes part in error message resolution; a plain
    /// error's own `Display` text never does.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.message = (!message.trim().is_empty()).then_some(message);
        self
    }

    pub(crate) fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub(crate) fn with_hoist_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.hoist_prefix = Some(prefix.into());
        self
    }

    /// Whether the error, or the error behind a nested action's failure,
    /// is of type `E`.
    pub fn is<E>(&self) -> bool
    where
        E: StdError + 'static,
    {
        self.error.is::<E>() || self.nested().is_some_and(Exception::is::<E>)
    }

    /// Match by type name, for types the caller cannot name statically.
    ///
    /// `"ParseIntError"` and `"core::num::error::ParseIntError"` both match.
    pub fn is_named(&self, name: &str) -> bool {
        let full = self.type_name;
        let short = full.rsplit("::").next().unwrap_or(full);
        full == name || short == name || self.nested().is_some_and(|e| e.is_named(name))
    }

    /// Borrow the error as `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.error.downcast_ref::<E>()
    }

    /// The underlying error.
    pub fn error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.error.as_ref()
    }

    /// Fully qualified type name of the captured error.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The explicit user-facing message, if one was attached.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Name of the nested action this error propagated out of.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Prefix applied when the error was hoisted out of a nested call.
    pub fn hoist_prefix(&self) -> Option<&str> {
        self.hoist_prefix.as_deref()
    }

    /// Backtrace captured with the error.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// The nested action's failure, when this error came out of a bang call.
    pub fn action_failure(&self) -> Option<&ActionFailure> {
        self.error.downcast_ref::<ActionFailure>()
    }

    fn nested(&self) -> Option<&Exception> {
        self.action_failure().and_then(ActionFailure::exception)
    }

    /// Whether this is a bare explicit failure with nothing underneath.
    pub(crate) fn is_bare_failure(&self) -> bool {
        self.error.is::<Failure>()
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exception")
            .field("type", &self.type_name)
            .field("error", &self.error.to_string())
            .field("message", &self.message)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Why a body or hook stopped early.
#[derive(Debug, Clone)]
pub enum Interrupt {
    /// Early completion. Routes to the success path.
    Done {
        /// Success message that replaces message resolution.
        message: Option<String>,
    },
    /// Explicit failure.
    Fail(Exception),
    /// Unexpected error.
    Raise(Exception),
}

impl Interrupt {
    /// Explicit failure without a message.
    pub fn halt() -> Self {
        Self::Fail(Exception::new(Failure { message: None }))
    }

    /// Early completion without a message.
    pub fn complete() -> Self {
        Self::Done { message: None }
    }

    /// Raise an arbitrary error.
    pub fn raise<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Raise(Exception::new(error))
    }
}

impl<E> From<E> for Interrupt
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::Raise(Exception::new(error))
    }
}

/// Fail the run with a message.
///
/// ```rust
/// use actuate_action::prelude::*;
///
/// let action = ActionBuilder::new("Charge")
///     .body(|_ctx| Err(fail("card declined")))
///     .build()
///     .unwrap();
///
/// let result = action.call(serde_json::json!({}));
/// assert!(result.is_failure());
/// assert_eq!(result.error(), Some("card declined"));
/// ```
pub fn fail(message: impl Into<String>) -> Interrupt {
    let message = message.into();
    let message = (!message.trim().is_empty()).then_some(message);
    let exception = Exception::new(Failure {
        message: message.clone(),
    });
    Interrupt::Fail(match message {
        Some(m) => exception.with_message(m),
        None => exception,
    })
}

/// Complete the run early with a success message.
pub fn done(message: impl Into<String>) -> Interrupt {
    let message = message.into();
    Interrupt::Done {
        message: (!message.trim().is_empty()).then_some(message),
    }
}
