//! Action definitions and the builder that declares them
//!
//! An [`Action`] is an immutable, cheaply cloneable definition: its field
//! contract, message rules, hooks, named methods and body. Every call
//! creates a fresh [`ActionContext`], so one `Action` can be run any number
//! of times, from any number of threads.
//!
//! Declarations are checked when the action is built. A declaration that
//! could only ever fail at run time (say, an exception-shaped callable on a
//! success message) is rejected with a [`ConfigError`] instead.
//!
//! ```rust
//! use actuate_action::prelude::*;
//! use serde_json::json;
//!
//! let greet = ActionBuilder::new("Greet")
//!     .expects("name", Field::of(FieldType::String))
//!     .exposes("greeting", Field::of(FieldType::String))
//!     .success("Greeted")
//!     .body(|ctx| {
//!         let name: String = ctx.input_as("name")?;
//!         ctx.expose("greeting", format!("Hello, {name}!"))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let result = greet.call(json!({ "name": "Ada" }));
//! assert!(result.is_ok());
//! assert_eq!(result.success(), Some("Greeted"));
//! assert_eq!(result.get("greeting").unwrap(), "Hello, Ada!");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use actuate_log::Level;
use serde_json::{Map, Value};

use crate::callback::{Callback, Condition, GuardSlot};
use crate::context::{ActionContext, Frame};
use crate::contract::Contract;
use crate::error::{ActionFailure, ConfigError};
use crate::exception::Control;
use crate::field::{Direction, Field};
use crate::handler::{Around, Event, Handler, Hooks, Lifecycle, Next};
use crate::message::{MessageKind, MessageRule};
use crate::pipeline;
use crate::result::ActionResult;
use crate::runtime::{Host, Runtime};

pub(crate) type Body = Arc<dyn Fn(&mut ActionContext) -> Control + Send + Sync>;

pub(crate) type ContextFn =
    Arc<dyn Fn(&ActionContext) -> anyhow::Result<Map<String, Value>> + Send + Sync>;

/// Everything declared for one action.
#[derive(Clone)]
pub(crate) struct Definition {
    pub(crate) name: String,
    pub(crate) contract: Contract,
    pub(crate) success_rules: Vec<MessageRule>,
    pub(crate) error_rules: Vec<MessageRule>,
    pub(crate) hooks: Hooks,
    pub(crate) methods: HashMap<String, Callback<Value>>,
    pub(crate) body: Option<Body>,
    pub(crate) default_error: Option<String>,
    pub(crate) default_success: Option<String>,
    pub(crate) log_level: Option<Level>,
    pub(crate) log_calls: Option<bool>,
    pub(crate) profile_if: Option<Condition>,
    pub(crate) additional_context: Option<ContextFn>,
    pub(crate) host: Option<Arc<dyn Host>>,
}

impl Definition {
    fn new(name: String) -> Self {
        Self {
            name,
            contract: Contract::new(),
            success_rules: Vec::new(),
            error_rules: Vec::new(),
            hooks: Hooks::default(),
            methods: HashMap::new(),
            body: None,
            default_error: None,
            default_success: None,
            log_level: None,
            log_calls: None,
            profile_if: None,
            additional_context: None,
            host: None,
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.body.is_none() {
            return Err(ConfigError::MissingBody {
                action: self.name.clone(),
            });
        }
        if let Some(name) = self
            .methods
            .iter()
            .find_map(|(name, method)| method.method_name().map(|_| name))
        {
            return Err(ConfigError::MethodAlias { name: name.clone() });
        }

        for rule in &self.success_rules {
            self.check_rule(rule, MessageKind::Success)?;
        }
        for rule in &self.error_rules {
            self.check_rule(rule, MessageKind::Error)?;
        }

        for hook in &self.hooks.before {
            self.check_guard(&hook.guard, "before hook", false)?;
        }
        for hook in &self.hooks.after {
            self.check_guard(&hook.guard, "after hook", false)?;
        }
        for hook in &self.hooks.around {
            self.check_guard(&hook.guard, "around hook", false)?;
        }
        for event in [Event::Success, Event::Error, Event::Failure, Event::Exception] {
            let available = event != Event::Success;
            let what = format!("{event} handler");
            for handler in self.hooks.handlers(event) {
                self.check_guard(&handler.guard, &what, available)?;
                self.check_callback(&handler.callback, &what, available)?;
            }
        }

        if let Some(condition) = &self.profile_if {
            self.check_condition(condition, "profile_if", false)?;
        }
        Ok(())
    }

    fn check_rule(&self, rule: &MessageRule, kind: MessageKind) -> Result<(), ConfigError> {
        let what = format!("{kind} message");
        let available = kind == MessageKind::Error;
        if rule.origin.is_some() && rule.guard.get().is_some() {
            return Err(ConfigError::FromWithCondition { what });
        }
        if rule.origin.is_some() && !available {
            return Err(ConfigError::ExceptionUnavailable { what });
        }
        if !available
            && rule.source.iter().chain(rule.prefix.iter()).any(|source| {
                source.requires_exception() || self.method_requires_exception(source.method_name())
            })
        {
            return Err(ConfigError::ExceptionUnavailable { what });
        }
        self.check_guard(&rule.guard, &what, available)
    }

    fn check_guard(&self, slot: &GuardSlot, what: &str, available: bool) -> Result<(), ConfigError> {
        if slot.is_conflicting() {
            return Err(ConfigError::ConflictingConditions {
                what: what.to_string(),
            });
        }
        match slot.get() {
            Some(guard) => self.check_condition(guard.condition(), what, available),
            None => Ok(()),
        }
    }

    fn check_condition(
        &self,
        condition: &Condition,
        what: &str,
        available: bool,
    ) -> Result<(), ConfigError> {
        let needs = condition.requires_exception()
            || condition
                .callback()
                .is_some_and(|cb| self.method_requires_exception(cb.method_name()));
        if needs && !available {
            return Err(ConfigError::ExceptionUnavailable {
                what: what.to_string(),
            });
        }
        Ok(())
    }

    fn check_callback<T>(
        &self,
        callback: &Callback<T>,
        what: &str,
        available: bool,
    ) -> Result<(), ConfigError> {
        let needs = callback.requires_exception()
            || self.method_requires_exception(callback.method_name());
        if needs && !available {
            return Err(ConfigError::ExceptionUnavailable {
                what: what.to_string(),
            });
        }
        Ok(())
    }

    fn method_requires_exception(&self, name: Option<&str>) -> bool {
        name.and_then(|name| self.methods.get(name))
            .is_some_and(Callback::requires_exception)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("name", &self.name)
            .field("contract", &self.contract)
            .field("success_rules", &self.success_rules.len())
            .field("error_rules", &self.error_rules.len())
            .field("hooks", &self.hooks)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// A built, runnable action.
#[derive(Debug, Clone)]
pub struct Action {
    def: Arc<Definition>,
}

impl Action {
    /// The action's name, used in logs, breadcrumbs and `from` filters.
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// The declared fields.
    pub fn contract(&self) -> &Contract {
        &self.def.contract
    }

    /// Run with a default [`Runtime`]. Never panics and never returns an
    /// error: every outcome is reported through the result.
    pub fn call(&self, inputs: Value) -> ActionResult {
        self.call_in(&Runtime::default(), inputs)
    }

    /// Run against `runtime`.
    pub fn call_in(&self, runtime: &Runtime, inputs: Value) -> ActionResult {
        self.run(runtime, Frame::root(self.name()), inputs)
    }

    /// Run with a default [`Runtime`], surfacing failure as an error.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionFailure`] carrying the resolved message when the
    /// run does not succeed.
    pub fn call_bang(&self, inputs: Value) -> Result<ActionResult, ActionFailure> {
        self.call_bang_in(&Runtime::default(), inputs)
    }

    /// Run against `runtime`, surfacing failure as an error.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionFailure`] when the run does not succeed.
    pub fn call_bang_in(
        &self,
        runtime: &Runtime,
        inputs: Value,
    ) -> Result<ActionResult, ActionFailure> {
        let result = self.call_in(runtime, inputs);
        if result.is_ok() {
            Ok(result)
        } else {
            Err(result.to_action_failure())
        }
    }

    pub(crate) fn run(&self, runtime: &Runtime, frame: Frame, inputs: Value) -> ActionResult {
        pipeline::run(&self.def, runtime, frame, inputs)
    }
}

/// Declares an [`Action`].
///
/// Errors in field declarations are remembered and returned by
/// [`build`](Self::build); the builder keeps accepting calls so that
/// declarations read as one chain.
pub struct ActionBuilder {
    def: Definition,
    error: Option<ConfigError>,
}

impl ActionBuilder {
    /// Start declaring an action called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            def: Definition::new(name.into()),
            error: None,
        }
    }

    /// Start from a copy of `parent`'s declarations.
    ///
    /// Everything is inherited, body included. Declarations added here
    /// belong to the new action only; the parent is unaffected.
    pub fn extend(parent: &Action, name: impl Into<String>) -> Self {
        let mut def = Definition::clone(&parent.def);
        def.name = name.into();
        Self { def, error: None }
    }

    fn declare(mut self, name: impl Into<String>, direction: Direction, field: Field) -> Self {
        if let Err(error) = self.def.contract.declare(name, direction, field)
            && self.error.is_none()
        {
            self.error = Some(error);
        }
        self
    }

    /// Declare an input.
    #[must_use = "builder methods must be chained or built"]
    pub fn expects(self, name: impl Into<String>, field: Field) -> Self {
        self.declare(name, Direction::Inbound, field)
    }

    /// Declare an output.
    #[must_use = "builder methods must be chained or built"]
    pub fn exposes(self, name: impl Into<String>, field: Field) -> Self {
        self.declare(name, Direction::Outbound, field)
    }

    /// Add a success message rule. Later rules take precedence.
    #[must_use = "builder methods must be chained or built"]
    pub fn success(mut self, rule: impl Into<MessageRule>) -> Self {
        self.def.success_rules.push(rule.into());
        self
    }

    /// Add an error message rule. Later rules take precedence.
    #[must_use = "builder methods must be chained or built"]
    pub fn error(mut self, rule: impl Into<MessageRule>) -> Self {
        self.def.error_rules.push(rule.into());
        self
    }

    /// Run `f` before the body.
    #[must_use = "builder methods must be chained or built"]
    pub fn before<F>(self, f: F) -> Self
    where
        F: Fn(&mut ActionContext) -> Control + Send + Sync + 'static,
    {
        self.before_with(Lifecycle::new(f))
    }

    /// Add a (possibly guarded) `before` hook.
    #[must_use = "builder methods must be chained or built"]
    pub fn before_with(mut self, hook: Lifecycle) -> Self {
        self.def.hooks.before.push(hook);
        self
    }

    /// Run `f` after the body.
    #[must_use = "builder methods must be chained or built"]
    pub fn after<F>(self, f: F) -> Self
    where
        F: Fn(&mut ActionContext) -> Control + Send + Sync + 'static,
    {
        self.after_with(Lifecycle::new(f))
    }

    /// Add a (possibly guarded) `after` hook.
    #[must_use = "builder methods must be chained or built"]
    pub fn after_with(mut self, hook: Lifecycle) -> Self {
        self.def.hooks.after.push(hook);
        self
    }

    /// Wrap the body. Earlier `around` hooks wrap later ones.
    #[must_use = "builder methods must be chained or built"]
    pub fn around<F>(self, f: F) -> Self
    where
        F: Fn(&mut ActionContext, &mut Next<'_>) -> Control + Send + Sync + 'static,
    {
        self.around_with(Around::new(f))
    }

    /// Add a (possibly guarded) `around` hook.
    #[must_use = "builder methods must be chained or built"]
    pub fn around_with(mut self, hook: Around) -> Self {
        self.def.hooks.around.push(hook);
        self
    }

    fn handler(mut self, event: Event, handler: Handler) -> Self {
        self.def.hooks.handlers_mut(event).push(handler);
        self
    }

    /// Run after a successful run.
    #[must_use = "builder methods must be chained or built"]
    pub fn on_success(self, handler: impl Into<Handler>) -> Self {
        self.handler(Event::Success, handler.into())
    }

    /// Run after a failed or excepted run.
    #[must_use = "builder methods must be chained or built"]
    pub fn on_error(self, handler: impl Into<Handler>) -> Self {
        self.handler(Event::Error, handler.into())
    }

    /// Run after an explicit failure.
    #[must_use = "builder methods must be chained or built"]
    pub fn on_failure(self, handler: impl Into<Handler>) -> Self {
        self.handler(Event::Failure, handler.into())
    }

    /// Run after an excepted run.
    #[must_use = "builder methods must be chained or built"]
    pub fn on_exception(self, handler: impl Into<Handler>) -> Self {
        self.handler(Event::Exception, handler.into())
    }

    /// Register a named method, callable from messages, conditions and
    /// handlers through [`Callback::method`].
    #[must_use = "builder methods must be chained or built"]
    pub fn method(mut self, name: impl Into<String>, method: Callback<Value>) -> Self {
        self.def.methods.insert(name.into(), method);
        self
    }

    /// The body.
    #[must_use = "builder methods must be chained or built"]
    pub fn body<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ActionContext) -> Control + Send + Sync + 'static,
    {
        self.def.body = Some(Arc::new(f));
        self
    }

    /// Error message used when no error rule matches.
    #[must_use = "builder methods must be chained or built"]
    pub fn default_error(mut self, message: impl Into<String>) -> Self {
        self.def.default_error = Some(message.into());
        self
    }

    /// Success message used when no success rule matches.
    #[must_use = "builder methods must be chained or built"]
    pub fn default_success(mut self, message: impl Into<String>) -> Self {
        self.def.default_success = Some(message.into());
        self
    }

    /// Level of this action's execution log lines.
    #[must_use = "builder methods must be chained or built"]
    pub fn log_level(mut self, level: Level) -> Self {
        self.def.log_level = Some(level);
        self
    }

    /// Enable or suppress this action's execution log lines.
    #[must_use = "builder methods must be chained or built"]
    pub fn log_calls(mut self, enabled: bool) -> Self {
        self.def.log_calls = Some(enabled);
        self
    }

    /// Profile the body with the runtime's [`Profiler`](crate::Profiler)
    /// when `condition` holds.
    #[must_use = "builder methods must be chained or built"]
    pub fn profile_if(mut self, condition: Condition) -> Self {
        self.def.profile_if = Some(condition);
        self
    }

    /// Extra diagnostic fields for exception reports, computed when a report
    /// is made.
    #[must_use = "builder methods must be chained or built"]
    pub fn additional_context<F>(mut self, f: F) -> Self
    where
        F: Fn(&ActionContext) -> anyhow::Result<Map<String, Value>> + Send + Sync + 'static,
    {
        self.def.additional_context = Some(Arc::new(f));
        self
    }

    /// Attach the action to `host`.
    #[must_use = "builder methods must be chained or built"]
    pub fn attach(mut self, host: Arc<dyn Host>) -> Self {
        self.def.host = Some(host);
        self
    }

    /// Finish the declaration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found in the declarations.
    pub fn build(self) -> Result<Action, ConfigError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.def.check()?;
        Ok(Action {
            def: Arc::new(self.def),
        })
    }
}

impl fmt::Debug for ActionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionBuilder")
            .field("def", &self.def)
            .field("error", &self.error)
            .finish()
    }
}
