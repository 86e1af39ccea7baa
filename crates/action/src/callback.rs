//! Shape-tagged callables, conditions and guards
//!
//! A callable declares up front whether it wants the triggering exception:
//! [`Callback::Plain`] never sees it, [`Callback::Exception`] always does and
//! [`Callback::Keyword`] receives it as an optional argument. Whether a shape
//! fits where it is registered is checked when the action is built.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::context::ActionContext;
use crate::exception::Exception;
use crate::piping::PipingSink;

type PlainFn<T> = dyn Fn(&ActionContext) -> anyhow::Result<T> + Send + Sync;
type ExceptionFn<T> = dyn Fn(&ActionContext, &Exception) -> anyhow::Result<T> + Send + Sync;
type KeywordFn<T> = dyn Fn(&ActionContext, &CallArgs<'_>) -> anyhow::Result<T> + Send + Sync;

/// Optional arguments passed to [`Callback::Keyword`] callables.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallArgs<'a> {
    /// The triggering exception, if the run raised or failed.
    pub exception: Option<&'a Exception>,
}

/// A user-supplied callable producing `T`.
pub enum Callback<T> {
    /// Takes only the execution context.
    Plain(Arc<PlainFn<T>>),
    /// Takes the context and the triggering exception.
    Exception(Arc<ExceptionFn<T>>),
    /// Takes the context and [`CallArgs`].
    Keyword(Arc<KeywordFn<T>>),
    /// Calls the named method registered with
    /// [`ActionBuilder::method`](crate::ActionBuilder::method).
    Method(String),
}

impl<T> Callback<T> {
    /// A callable that ignores the exception.
    pub fn plain<F>(f: F) -> Self
    where
        F: Fn(&ActionContext) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self::Plain(Arc::new(f))
    }

    /// A callable that requires the exception.
    pub fn exception<F>(f: F) -> Self
    where
        F: Fn(&ActionContext, &Exception) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self::Exception(Arc::new(f))
    }

    /// A callable taking optional keyword arguments.
    pub fn keyword<F>(f: F) -> Self
    where
        F: Fn(&ActionContext, &CallArgs<'_>) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self::Keyword(Arc::new(f))
    }

    /// A reference to a named method.
    pub fn method(name: impl Into<String>) -> Self {
        Self::Method(name.into())
    }

    pub(crate) fn requires_exception(&self) -> bool {
        matches!(self, Self::Exception(_))
    }

    pub(crate) fn method_name(&self) -> Option<&str> {
        match self {
            Self::Method(name) => Some(name),
            _ => None,
        }
    }
}

impl<T: MethodOutput> Callback<T> {
    /// Invoke with whatever exception is at hand.
    pub(crate) fn invoke(
        &self,
        ctx: &ActionContext,
        exception: Option<&Exception>,
    ) -> anyhow::Result<T> {
        match self {
            Self::Plain(f) => f(ctx),
            Self::Exception(f) => match exception {
                Some(e) => f(ctx, e),
                None => anyhow::bail!("callable requires an exception but none is available"),
            },
            Self::Keyword(f) => f(ctx, &CallArgs { exception }),
            Self::Method(name) => ctx.call_method(name, exception).map(T::from_method),
        }
    }
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Plain(f) => Self::Plain(Arc::clone(f)),
            Self::Exception(f) => Self::Exception(Arc::clone(f)),
            Self::Keyword(f) => Self::Keyword(Arc::clone(f)),
            Self::Method(name) => Self::Method(name.clone()),
        }
    }
}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("Callback::Plain"),
            Self::Exception(_) => f.write_str("Callback::Exception"),
            Self::Keyword(_) => f.write_str("Callback::Keyword"),
            Self::Method(name) => write!(f, "Callback::Method({name})"),
        }
    }
}

/// Conversion from a named method's JSON return value.
pub trait MethodOutput: Sized {
    /// Convert the method's return value.
    fn from_method(value: Value) -> Self;
}

impl MethodOutput for Value {
    fn from_method(value: Value) -> Self {
        value
    }
}

impl MethodOutput for String {
    fn from_method(value: Value) -> Self {
        match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Truthiness: `null` and `false` are false, everything else is true.
impl MethodOutput for bool {
    fn from_method(value: Value) -> Self {
        !matches!(value, Value::Null | Value::Bool(false))
    }
}

impl MethodOutput for () {
    fn from_method(_: Value) -> Self {}
}

// ============================================================================
// CONDITIONS
// ============================================================================

/// A predicate deciding whether a rule or handler applies.
#[derive(Clone)]
pub enum Condition {
    /// Always matches.
    Always,
    /// Matches when the exception (or the error behind a nested failure) is
    /// of a given type.
    Type {
        /// Type name, for diagnostics.
        name: &'static str,
        /// The type check.
        check: fn(&Exception) -> bool,
    },
    /// Late-bound type match by name, see [`Exception::is_named`].
    Named(String),
    /// A user predicate.
    Callable(Callback<bool>),
}

impl Condition {
    /// Matches exceptions of type `E`.
    pub fn is<E>() -> Self
    where
        E: StdError + 'static,
    {
        Self::Type {
            name: std::any::type_name::<E>(),
            check: Exception::is::<E>,
        }
    }

    /// Matches exceptions whose type is named `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Predicate over the context.
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&ActionContext) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self::Callable(Callback::plain(f))
    }

    /// Predicate over the context and the exception.
    pub fn exception<F>(f: F) -> Self
    where
        F: Fn(&ActionContext, &Exception) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self::Callable(Callback::exception(f))
    }

    /// Predicate with keyword arguments.
    pub fn keyword<F>(f: F) -> Self
    where
        F: Fn(&ActionContext, &CallArgs<'_>) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self::Callable(Callback::keyword(f))
    }

    /// Predicate implemented by a named method; its value is read as truthy.
    pub fn method(name: impl Into<String>) -> Self {
        Self::Callable(Callback::method(name))
    }

    pub(crate) fn requires_exception(&self) -> bool {
        match self {
            Self::Always => false,
            Self::Type { .. } | Self::Named(_) => true,
            Self::Callable(cb) => cb.requires_exception(),
        }
    }

    pub(crate) fn callback(&self) -> Option<&Callback<bool>> {
        match self {
            Self::Callable(cb) => Some(cb),
            _ => None,
        }
    }

    pub(crate) fn evaluate(
        &self,
        ctx: &ActionContext,
        exception: Option<&Exception>,
    ) -> anyhow::Result<bool> {
        match self {
            Self::Always => Ok(true),
            Self::Type { check, .. } => Ok(exception.is_some_and(|e| check(e))),
            Self::Named(name) => Ok(exception.is_some_and(|e| e.is_named(name))),
            Self::Callable(cb) => cb.invoke(ctx, exception),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Type { name, .. } => write!(f, "Type({name})"),
            Self::Named(name) => write!(f, "Named({name})"),
            Self::Callable(cb) => write!(f, "Callable({cb:?})"),
        }
    }
}

// ============================================================================
// GUARDS
// ============================================================================

/// A `when`/`unless` wrapper around a [`Condition`].
#[derive(Debug, Clone)]
pub struct Guard {
    condition: Condition,
    negate: bool,
}

impl Guard {
    /// Applies when `condition` holds.
    pub fn when(condition: Condition) -> Self {
        Self {
            condition,
            negate: false,
        }
    }

    /// Applies when `condition` does not hold.
    pub fn unless(condition: Condition) -> Self {
        Self {
            condition,
            negate: true,
        }
    }

    /// The wrapped condition.
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Whether this is an `unless` guard.
    pub fn is_negated(&self) -> bool {
        self.negate
    }

    pub(crate) fn evaluate(
        &self,
        ctx: &ActionContext,
        exception: Option<&Exception>,
    ) -> anyhow::Result<bool> {
        self.condition
            .evaluate(ctx, exception)
            .map(|hit| hit != self.negate)
    }
}

/// Slot for an optional guard that remembers whether both `when` and
/// `unless` were supplied.
#[derive(Debug, Clone, Default)]
pub(crate) struct GuardSlot {
    guard: Option<Guard>,
    conflicting: bool,
}

impl GuardSlot {
    pub(crate) fn set(&mut self, guard: Guard) {
        if self.guard.is_some() {
            self.conflicting = true;
        }
        self.guard = Some(guard);
    }

    pub(crate) fn get(&self) -> Option<&Guard> {
        self.guard.as_ref()
    }

    pub(crate) fn is_conflicting(&self) -> bool {
        self.conflicting
    }

    /// Whether the guarded item applies. A guard that errors counts as a
    /// non-match.
    pub(crate) fn allows(
        &self,
        ctx: &ActionContext,
        exception: Option<&Exception>,
        sink: &PipingSink<'_>,
        what: &str,
    ) -> bool {
        match &self.guard {
            None => true,
            Some(guard) => sink
                .guard(what, || guard.evaluate(ctx, exception))
                .unwrap_or(false),
        }
    }
}
