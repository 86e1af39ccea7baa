//! # actuate-action
//!
//! Command objects with a declared contract and a fixed execution lifecycle.
//!
//! An action declares the inputs it expects, the outputs it exposes, the
//! messages it reports and the hooks that run around it. Calling it always
//! yields an [`ActionResult`] with exactly one [`Outcome`]: success, explicit
//! failure, or exception. Nothing a caller passes in, and nothing the body
//! raises, escapes as a panic or an `Err`.
//!
//! ## Core Types
//!
//! - [`ActionBuilder`]: declares fields, messages, hooks and the body
//! - [`Action`]: a built, immutable, runnable definition
//! - [`ActionContext`]: what the body sees (inputs, outputs, nested calls)
//! - [`ActionResult`]: outcome, resolved message, outputs and timing
//! - [`Interrupt`] / [`Control`]: how a body stops early ([`fail`], [`done`])
//! - [`Exception`]: a captured, cloneable error with its backtrace
//! - [`Runtime`]: configuration plus reporter, profiler and clock
//!
//! ## Quick Start
//!
//! ```rust
//! use actuate_action::prelude::*;
//! use serde_json::json;
//!
//! let divide = ActionBuilder::new("Divide")
//!     .expects("numerator", Field::of(FieldType::Numeric))
//!     .expects("denominator", Field::of(FieldType::Numeric))
//!     .exposes("quotient", Field::of(FieldType::Numeric))
//!     .success("Divided")
//!     .error("Could not divide")
//!     .body(|ctx| {
//!         let n: f64 = ctx.input_as("numerator")?;
//!         let d: f64 = ctx.input_as("denominator")?;
//!         if d == 0.0 {
//!             return Err(fail("Cannot divide by zero"));
//!         }
//!         ctx.expose("quotient", n / d)
//!     })
//!     .build()
//!     .unwrap();
//!
//! let result = divide.call(json!({ "numerator": 6, "denominator": 3 }));
//! assert_eq!(result.success(), Some("Divided"));
//! assert_eq!(result.output::<f64>("quotient").unwrap(), 2.0);
//!
//! let result = divide.call(json!({ "numerator": 6, "denominator": 0 }));
//! assert_eq!(result.error(), Some("Cannot divide by zero"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Action definitions and the declaring builder.
pub mod action;
/// Shape-tagged callables, conditions and guards.
pub mod callback;
/// Runtime configuration.
pub mod config;
/// Per-run execution context.
pub mod context;
/// The field contract of an action.
pub mod contract;
/// Declaration-time and run-time error types.
pub mod error;
/// Captured exceptions and control-flow interrupts.
pub mod exception;
/// Field declarations.
pub mod field;
/// Lifecycle hooks and outcome handlers.
pub mod handler;
/// Success and error message rules.
pub mod message;
mod nested;
/// The execution pipeline.
pub mod pipeline;
mod piping;
/// Convenience re-exports for action authors.
pub mod prelude;
/// Action registry for lookup by name.
pub mod registry;
/// The value every call returns.
pub mod result;
/// Runtime and its pluggable collaborators.
pub mod runtime;

// ── Public re-exports ───────────────────────────────────────────────────────

pub use action::{Action, ActionBuilder};
pub use callback::{CallArgs, Callback, Condition, Guard, MethodOutput};
pub use config::RuntimeConfig;
pub use context::ActionContext;
pub use contract::{Contract, FILTERED, RESERVED_NAMES};
pub use error::{
    ActionFailure, ConfigError, Failure, InboundValidationError, InvalidInputs,
    OutboundValidationError, PanicError, ResultError, UnknownExposure,
};
pub use exception::{Control, Exception, Interrupt, done, fail};
pub use field::{Direction, Field, FieldDefault, FieldSpec, ModelFinder};
pub use handler::{Around, AroundFn, Event, Handler, Hook, Lifecycle, LifecycleFn, Next};
pub use message::{DEFAULT_ERROR, DEFAULT_SUCCESS, MessageKind, MessageRule, MessageSource};
pub use pipeline::Stage;
pub use registry::ActionRegistry;
pub use result::{ActionResult, Outcome};
pub use runtime::{
    Clock, ExceptionReporter, Host, MonotonicClock, Profiler, ReportContext, Runtime,
};

// Re-export the validator crate so action authors can attach validators
// without depending on it directly.
pub use actuate_validator as validator;
pub use actuate_validator::validators::{FieldType, Format, Length, Numericality};
