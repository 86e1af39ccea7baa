//! Lifecycle hooks and outcome handlers
//!
//! `before`, `after` and `around` hooks take part in the run: an error they
//! return stops it like an error from the body would. Outcome handlers
//! (`on_success`, `on_error`, `on_failure`, `on_exception`) run after the
//! outcome is fixed and can never change it.

use std::fmt;
use std::sync::Arc;

use crate::callback::{Callback, Condition, Guard, GuardSlot};
use crate::context::ActionContext;
use crate::exception::{Control, Exception};
use crate::piping::PipingSink;

/// Signature of `before`/`after` hooks.
pub type LifecycleFn = dyn Fn(&mut ActionContext) -> Control + Send + Sync;

/// The continuation handed to an `around` hook.
pub type Next<'a> = dyn FnMut(&mut ActionContext) -> Control + 'a;

/// Signature of `around` hooks: call `next` to run the inner layers.
pub type AroundFn = dyn Fn(&mut ActionContext, &mut Next<'_>) -> Control + Send + Sync;

/// A callable with an optional `when`/`unless` guard.
#[derive(Clone)]
pub struct Hook<C> {
    pub(crate) callback: C,
    pub(crate) guard: GuardSlot,
}

impl<C> Hook<C> {
    fn wrap(callback: C) -> Self {
        Self {
            callback,
            guard: GuardSlot::default(),
        }
    }

    /// Run only when `condition` holds.
    #[must_use = "builder methods must be chained or built"]
    pub fn when(mut self, condition: Condition) -> Self {
        self.guard.set(Guard::when(condition));
        self
    }

    /// Run only when `condition` does not hold.
    #[must_use = "builder methods must be chained or built"]
    pub fn unless(mut self, condition: Condition) -> Self {
        self.guard.set(Guard::unless(condition));
        self
    }
}

impl<C> fmt::Debug for Hook<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("guard", &self.guard.get())
            .finish_non_exhaustive()
    }
}

/// An outcome handler.
pub type Handler = Hook<Callback<()>>;

/// A `before` or `after` hook.
pub type Lifecycle = Hook<Arc<LifecycleFn>>;

/// An `around` hook.
pub type Around = Hook<Arc<AroundFn>>;

impl Handler {
    /// Handler invoking `callback`.
    pub fn new(callback: Callback<()>) -> Self {
        Self::wrap(callback)
    }
}

impl From<Callback<()>> for Handler {
    fn from(callback: Callback<()>) -> Self {
        Self::new(callback)
    }
}

impl Lifecycle {
    /// `before`/`after` hook running `f`.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut ActionContext) -> Control + Send + Sync + 'static,
    {
        Self::wrap(Arc::new(f))
    }
}

impl Around {
    /// `around` hook running `f`.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut ActionContext, &mut Next<'_>) -> Control + Send + Sync + 'static,
    {
        Self::wrap(Arc::new(f))
    }
}

/// Which outcome handlers are being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// The run succeeded.
    Success,
    /// The run failed or raised.
    Error,
    /// The run failed explicitly.
    Failure,
    /// The run raised.
    Exception,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("on_success"),
            Self::Error => f.write_str("on_error"),
            Self::Failure => f.write_str("on_failure"),
            Self::Exception => f.write_str("on_exception"),
        }
    }
}

/// Every hook declared on an action, inherited ones first.
#[derive(Debug, Clone, Default)]
pub(crate) struct Hooks {
    pub(crate) before: Vec<Lifecycle>,
    pub(crate) after: Vec<Lifecycle>,
    pub(crate) around: Vec<Around>,
    pub(crate) on_success: Vec<Handler>,
    pub(crate) on_error: Vec<Handler>,
    pub(crate) on_failure: Vec<Handler>,
    pub(crate) on_exception: Vec<Handler>,
}

impl Hooks {
    pub(crate) fn handlers(&self, event: Event) -> &[Handler] {
        match event {
            Event::Success => &self.on_success,
            Event::Error => &self.on_error,
            Event::Failure => &self.on_failure,
            Event::Exception => &self.on_exception,
        }
    }

    pub(crate) fn handlers_mut(&mut self, event: Event) -> &mut Vec<Handler> {
        match event {
            Event::Success => &mut self.on_success,
            Event::Error => &mut self.on_error,
            Event::Failure => &mut self.on_failure,
            Event::Exception => &mut self.on_exception,
        }
    }
}

/// Run every matching handler for `event`.
///
/// Success handlers run newest first; the others in declaration order. A
/// handler that errors or panics is reported and the rest still run.
pub(crate) fn dispatch(
    event: Event,
    hooks: &Hooks,
    ctx: &ActionContext,
    exception: Option<&Exception>,
    sink: &PipingSink<'_>,
) {
    let handlers = hooks.handlers(event);
    let ordered: Box<dyn Iterator<Item = &Handler>> = match event {
        Event::Success => Box::new(handlers.iter().rev()),
        _ => Box::new(handlers.iter()),
    };
    for handler in ordered {
        if !handler
            .guard
            .allows(ctx, exception, sink, &format!("checking an {event} condition"))
        {
            continue;
        }
        sink.guard(&format!("running an {event} handler"), || {
            handler.callback.invoke(ctx, exception)
        });
    }
}
