//! Per-run execution context
//!
//! One [`ActionContext`] exists per run. The body and every hook receive it;
//! it owns the validated inputs, the outputs exposed so far and any
//! diagnostic context, and is discarded once the result is built.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::action::Definition;
use crate::error::UnknownExposure;
use crate::exception::{Control, Exception, Interrupt, done, fail};
use crate::field::Direction;
use crate::runtime::{Host, Runtime};

/// Position of a run in the call tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    trail: Vec<String>,
}

impl Frame {
    pub(crate) fn root(action: &str) -> Self {
        Self {
            trail: vec![action.to_string()],
        }
    }

    pub(crate) fn child(&self, action: &str) -> Self {
        let mut trail = self.trail.clone();
        trail.push(action.to_string());
        Self { trail }
    }

    pub(crate) fn depth(&self) -> usize {
        self.trail.len().saturating_sub(1)
    }

    pub(crate) fn breadcrumb(&self) -> String {
        self.trail.join(" > ")
    }
}

/// What the body and hooks see.
pub struct ActionContext {
    pub(crate) def: Arc<Definition>,
    pub(crate) runtime: Runtime,
    pub(crate) frame: Frame,
    pub(crate) inputs: Map<String, Value>,
    pub(crate) outputs: Map<String, Value>,
    pub(crate) extra: Map<String, Value>,
    memo: RefCell<HashMap<String, Box<dyn Any>>>,
}

impl ActionContext {
    pub(crate) fn new(def: Arc<Definition>, runtime: Runtime, frame: Frame) -> Self {
        Self {
            def,
            runtime,
            frame,
            inputs: Map::new(),
            outputs: Map::new(),
            extra: Map::new(),
            memo: RefCell::new(HashMap::new()),
        }
    }

    /// Name of the running action.
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Nesting depth; 0 for a top-level call.
    pub fn depth(&self) -> usize {
        self.frame.depth()
    }

    /// Names from the top-level action down to this one, `"Outer > Inner"`.
    pub fn breadcrumb(&self) -> String {
        self.frame.breadcrumb()
    }

    /// The runtime this run executes against.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// A validated input, or `None` when it was not supplied.
    pub fn input(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name)
    }

    /// All validated inputs, defaults applied.
    pub fn inputs(&self) -> &Map<String, Value> {
        &self.inputs
    }

    /// A validated input deserialized as `T`; a missing input reads as
    /// `null`.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error when the value does not fit `T`.
    pub fn input_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, serde_json::Error> {
        T::deserialize(self.inputs.get(name).unwrap_or(&Value::Null))
    }

    /// An output exposed so far.
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name)
    }

    /// Outputs exposed so far.
    pub fn outputs(&self) -> &Map<String, Value> {
        &self.outputs
    }

    /// Set a declared output.
    ///
    /// # Errors
    ///
    /// Raises [`UnknownExposure`] when `name` was not declared with
    /// `exposes`, or the serialization error when `value` cannot become
    /// JSON.
    pub fn expose(&mut self, name: &str, value: impl Serialize) -> Control {
        if !self.def.contract.declares(name, Direction::Outbound) {
            return Err(Interrupt::raise(UnknownExposure {
                field: name.to_string(),
            }));
        }
        let value = serde_json::to_value(value)?;
        self.outputs.insert(name.to_string(), value);
        Ok(())
    }

    /// Expose `exposures`, then fail with `message`.
    ///
    /// An invalid exposure wins over the failure.
    pub fn fail_with<I, K>(&mut self, message: impl Into<String>, exposures: I) -> Interrupt
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        match self.expose_all(exposures) {
            Ok(()) => fail(message),
            Err(interrupt) => interrupt,
        }
    }

    /// Expose `exposures`, then complete early with `message`.
    pub fn done_with<I, K>(&mut self, message: impl Into<String>, exposures: I) -> Interrupt
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        match self.expose_all(exposures) {
            Ok(()) => done(message),
            Err(interrupt) => interrupt,
        }
    }

    fn expose_all<I, K>(&mut self, exposures: I) -> Control
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        for (name, value) in exposures {
            self.expose(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Attach a diagnostic field to exception reports for this run.
    pub fn set_context(&mut self, key: impl Into<String>, value: impl Serialize) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.extra.insert(key.into(), value);
            }
            Err(error) => tracing::warn!(action = %self.name(), %error, "dropping unserializable context"),
        }
    }

    /// Diagnostic fields set so far.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Compute `f` once per run and cache it under `key`.
    ///
    /// A cached value of a different type is recomputed and replaced.
    pub fn memoize<T, F>(&self, key: &str, f: F) -> T
    where
        T: Clone + 'static,
        F: FnOnce(&Self) -> T,
    {
        if let Some(hit) = self
            .memo
            .borrow()
            .get(key)
            .and_then(|cached| cached.downcast_ref::<T>())
        {
            return hit.clone();
        }
        let value = f(self);
        self.memo
            .borrow_mut()
            .insert(key.to_string(), Box::new(value.clone()));
        value
    }

    /// The object this action is attached to.
    pub fn host(&self) -> Option<&dyn Host> {
        self.def.host.as_deref()
    }

    pub(crate) fn has_method(&self, name: &str) -> bool {
        self.def.methods.contains_key(name)
    }

    /// Invoke a method registered with
    /// [`ActionBuilder::method`](crate::ActionBuilder::method).
    pub(crate) fn call_method(
        &self,
        name: &str,
        exception: Option<&Exception>,
    ) -> anyhow::Result<Value> {
        let Some(method) = self.def.methods.get(name) else {
            anyhow::bail!("no method named `{name}` on {}", self.name());
        };
        method.invoke(self, exception)
    }
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("action", &self.def.name)
            .field("depth", &self.frame.depth())
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_track_depth_and_breadcrumb() {
        let root = Frame::root("Outer");
        assert_eq!(root.depth(), 0);
        let child = root.child("Inner");
        assert_eq!(child.depth(), 1);
        assert_eq!(child.breadcrumb(), "Outer > Inner");
        assert_eq!(root.breadcrumb(), "Outer");
    }
}
