//! Calling one action from inside another
//!
//! A nested call gets its own context and result; only the runtime and the
//! position in the call tree are shared with the caller. The bang variant
//! turns an unsuccessful result into an interrupt, tagged with the inner
//! action's name so the outer action can address it with
//! [`MessageRule::from`](crate::MessageRule::from).

use serde_json::Value;
use tracing::info;

use crate::action::Action;
use crate::context::ActionContext;
use crate::exception::{Control, Exception, Interrupt};
use crate::message::join_prefix;
use crate::result::{ActionResult, Outcome};

impl ActionContext {
    /// Run `action` as a child of this run and return its result, whatever
    /// it is.
    pub fn call(&self, action: &Action, inputs: Value) -> ActionResult {
        action.run(&self.runtime, self.frame.child(action.name()), inputs)
    }

    /// Run `action` as a child of this run; an unsuccessful result stops
    /// this run too.
    ///
    /// An inner failure becomes a failure of this run carrying the inner
    /// message. An inner exception becomes an exception of this run whose
    /// message is resolved by this action's own rules.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupt::Fail`] or [`Interrupt::Raise`] wrapping the inner
    /// [`ActionFailure`](crate::ActionFailure).
    pub fn call_bang(&self, action: &Action, inputs: Value) -> Control<ActionResult> {
        let result = self.call(action, inputs);
        match result.outcome() {
            Outcome::Success => Ok(result),
            Outcome::Failure => {
                let exception = Exception::new(result.to_action_failure())
                    .with_message(result.message())
                    .with_origin(action.name());
                Err(Interrupt::Fail(exception))
            }
            Outcome::Exception => {
                let exception =
                    Exception::new(result.to_action_failure()).with_origin(action.name());
                Err(Interrupt::Raise(exception))
            }
        }
    }

    /// Run `f`, prefixing whatever a nested call inside it fails with.
    ///
    /// A nested failure with message `X` becomes a failure with message
    /// `"{prefix} X"`. A nested exception becomes an exception whose message
    /// is this action's own error message, prefixed. Interrupts that did not
    /// come out of a nested call pass through untouched.
    ///
    /// # Errors
    ///
    /// Returns the (possibly prefixed) interrupt from `f`.
    pub fn hoist<F>(&mut self, prefix: impl Into<String>, f: F) -> Control<ActionResult>
    where
        F: FnOnce(&mut Self) -> Control<ActionResult>,
    {
        let prefix = prefix.into();
        match f(self) {
            Err(Interrupt::Fail(exception)) if exception.origin().is_some() => {
                let inner = exception
                    .message()
                    .map_or_else(|| exception.to_string(), str::to_string);
                let message = join_prefix(&prefix, &inner);
                Err(Interrupt::Fail(
                    exception.with_message(message).with_hoist_prefix(prefix),
                ))
            }
            Err(Interrupt::Raise(exception)) if exception.origin().is_some() => {
                info!(
                    action = %self.name(),
                    origin = exception.origin().unwrap_or_default(),
                    "hoisted exception from {}: using {}'s own error message",
                    exception.origin().unwrap_or_default(),
                    self.name(),
                );
                Err(Interrupt::Raise(exception.with_hoist_prefix(prefix)))
            }
            other => other,
        }
    }
}
