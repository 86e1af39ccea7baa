//! Success and error message rules
//!
//! Rules are kept in declaration order (inherited rules first) and evaluated
//! newest first, so a later or more specific declaration shadows an earlier
//! one. The first rule whose guard holds and whose content is non-blank
//! wins. A rule with only a prefix lends that prefix to whatever content is
//! found next.

use std::fmt;

use crate::callback::{CallArgs, Callback, Condition, Guard, GuardSlot, MethodOutput};
use crate::context::ActionContext;
use crate::exception::Exception;
use crate::piping::PipingSink;

/// Final fallback for error messages.
pub const DEFAULT_ERROR: &str = "Something went wrong";

/// Final fallback for success messages.
pub const DEFAULT_SUCCESS: &str = "Action completed successfully";

/// Which message is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// The message of a successful run.
    Success,
    /// The message of a failed or excepted run.
    Error,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Where a rule's text comes from.
#[derive(Debug, Clone)]
pub enum MessageSource {
    /// Used verbatim.
    Static(String),
    /// Computed by a callable.
    Callable(Callback<String>),
    /// A named method; when no such method is registered the name itself is
    /// the text.
    Method(String),
    /// The resolved message of the nested action the exception came from.
    Derived,
}

impl MessageSource {
    pub(crate) fn requires_exception(&self) -> bool {
        match self {
            Self::Static(_) | Self::Method(_) => false,
            Self::Callable(cb) => cb.requires_exception(),
            Self::Derived => true,
        }
    }

    pub(crate) fn method_name(&self) -> Option<&str> {
        match self {
            Self::Method(name) => Some(name),
            Self::Callable(cb) => cb.method_name(),
            _ => None,
        }
    }

    fn produce(
        &self,
        ctx: &ActionContext,
        exception: Option<&Exception>,
        sink: &PipingSink<'_>,
        what: &str,
    ) -> Option<String> {
        let text = match self {
            Self::Static(text) => Some(text.clone()),
            Self::Callable(cb) => sink.guard(what, || cb.invoke(ctx, exception)),
            Self::Method(name) if ctx.has_method(name) => sink.guard(what, || {
                ctx.call_method(name, exception).map(String::from_method)
            }),
            Self::Method(name) => Some(name.clone()),
            Self::Derived => exception
                .and_then(Exception::action_failure)
                .map(|failure| failure.message().to_string()),
        };
        text.filter(|t| !t.trim().is_empty())
    }
}

impl From<&str> for MessageSource {
    fn from(text: &str) -> Self {
        Self::Static(text.to_string())
    }
}

impl From<String> for MessageSource {
    fn from(text: String) -> Self {
        Self::Static(text)
    }
}

impl From<Callback<String>> for MessageSource {
    fn from(cb: Callback<String>) -> Self {
        match cb {
            Callback::Method(name) => Self::Method(name),
            other => Self::Callable(other),
        }
    }
}

/// One `success`/`error` declaration.
///
/// ```rust
/// use actuate_action::{Callback, Condition, MessageRule};
///
/// let rule = MessageRule::exception(|_ctx, e| Ok(format!("wasn't nice ({e})")))
///     .when(Condition::named("ParseIntError"))
///     .prefix("Import: ");
/// # let _ = rule;
/// ```
#[derive(Debug, Clone)]
pub struct MessageRule {
    pub(crate) source: Option<MessageSource>,
    pub(crate) prefix: Option<MessageSource>,
    pub(crate) guard: GuardSlot,
    pub(crate) origin: Option<String>,
}

impl MessageRule {
    /// A rule producing text from `source`.
    pub fn new(source: impl Into<MessageSource>) -> Self {
        Self {
            source: Some(source.into()),
            prefix: None,
            guard: GuardSlot::default(),
            origin: None,
        }
    }

    /// Text computed from the context.
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&ActionContext) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Self::new(MessageSource::Callable(Callback::plain(f)))
    }

    /// Text computed from the context and the exception.
    pub fn exception<F>(f: F) -> Self
    where
        F: Fn(&ActionContext, &Exception) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Self::new(MessageSource::Callable(Callback::exception(f)))
    }

    /// Text computed with keyword arguments.
    pub fn keyword<F>(f: F) -> Self
    where
        F: Fn(&ActionContext, &CallArgs<'_>) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Self::new(MessageSource::Callable(Callback::keyword(f)))
    }

    /// Text produced by a named method.
    pub fn method(name: impl Into<String>) -> Self {
        Self::new(MessageSource::Method(name.into()))
    }

    /// The nested action's own resolved message.
    pub fn derived() -> Self {
        Self::new(MessageSource::Derived)
    }

    /// A rule contributing only a prefix; the content comes from the next
    /// matching rule or the exception.
    pub fn prefix_only(prefix: impl Into<MessageSource>) -> Self {
        Self {
            source: None,
            prefix: Some(prefix.into()),
            guard: GuardSlot::default(),
            origin: None,
        }
    }

    /// Prepend `prefix` to this rule's content.
    #[must_use = "builder methods must be chained or built"]
    pub fn prefix(mut self, prefix: impl Into<MessageSource>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Apply only when `condition` holds.
    #[must_use = "builder methods must be chained or built"]
    pub fn when(mut self, condition: Condition) -> Self {
        self.guard.set(Guard::when(condition));
        self
    }

    /// Apply only when `condition` does not hold.
    #[must_use = "builder methods must be chained or built"]
    pub fn unless(mut self, condition: Condition) -> Self {
        self.guard.set(Guard::unless(condition));
        self
    }

    /// Apply only to exceptions propagated out of the nested action named
    /// `action`.
    #[must_use = "builder methods must be chained or built"]
    pub fn from(mut self, action: impl Into<String>) -> Self {
        self.origin = Some(action.into());
        self
    }

    fn applies(
        &self,
        ctx: &ActionContext,
        exception: Option<&Exception>,
        sink: &PipingSink<'_>,
        kind: MessageKind,
    ) -> bool {
        if let Some(origin) = &self.origin
            && exception.and_then(Exception::origin) != Some(origin.as_str())
        {
            return false;
        }
        self.guard
            .allows(ctx, exception, sink, &format!("evaluating a {kind} message condition"))
    }
}

impl From<&str> for MessageRule {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for MessageRule {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Join a hoist prefix and a message, adding a space unless the prefix
/// already ends in whitespace.
pub(crate) fn join_prefix(prefix: &str, message: &str) -> String {
    if prefix.is_empty() || prefix.ends_with(char::is_whitespace) {
        format!("{prefix}{message}")
    } else {
        format!("{prefix} {message}")
    }
}

/// Resolve the message for one run.
///
/// `explicit` is a message given directly to `fail`/`done` or produced by
/// hoisting; it wins over every rule.
pub(crate) fn resolve(
    kind: MessageKind,
    ctx: &ActionContext,
    exception: Option<&Exception>,
    explicit: Option<&str>,
    sink: &PipingSink<'_>,
) -> String {
    if let Some(text) = explicit.filter(|t| !t.trim().is_empty()) {
        return text.to_string();
    }

    let rules = match kind {
        MessageKind::Success => &ctx.def.success_rules,
        MessageKind::Error => &ctx.def.error_rules,
    };
    let what = format!("resolving the {kind} message");

    let mut prefix: Option<String> = None;
    let mut content: Option<String> = None;
    for rule in rules.iter().rev() {
        if !rule.applies(ctx, exception, sink, kind) {
            continue;
        }
        let Some(source) = &rule.source else {
            if prefix.is_none() {
                prefix = rule
                    .prefix
                    .as_ref()
                    .and_then(|p| p.produce(ctx, exception, sink, &what));
            }
            continue;
        };
        let Some(text) = source.produce(ctx, exception, sink, &what) else {
            continue;
        };
        if prefix.is_none() {
            prefix = rule
                .prefix
                .as_ref()
                .and_then(|p| p.produce(ctx, exception, sink, &what));
        }
        content = Some(text);
        break;
    }

    let content = content
        .or_else(|| prefix.as_ref().and(exception).and_then(exception_text))
        .unwrap_or_else(|| fallback(kind, ctx, exception));
    let message = match prefix {
        Some(prefix) => format!("{prefix}{content}"),
        None => content,
    };

    match exception.and_then(Exception::hoist_prefix) {
        Some(hoist) if kind == MessageKind::Error => join_prefix(hoist, &message),
        _ => message,
    }
}

/// Content a prefix-only rule falls back to.
fn exception_text(exception: &Exception) -> Option<String> {
    exception
        .message()
        .map(str::to_string)
        .or_else(|| (!exception.is_bare_failure()).then(|| exception.to_string()))
        .filter(|t| !t.trim().is_empty())
}

fn fallback(kind: MessageKind, ctx: &ActionContext, exception: Option<&Exception>) -> String {
    let config = ctx.runtime.config();
    match kind {
        MessageKind::Error => exception
            .and_then(Exception::message)
            .or(ctx.def.default_error.as_deref())
            .or(config.default_error.as_deref())
            .unwrap_or(DEFAULT_ERROR)
            .to_string(),
        MessageKind::Success => ctx
            .def
            .default_success
            .as_deref()
            .or(config.default_success.as_deref())
            .unwrap_or(DEFAULT_SUCCESS)
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("P:", "X", "P: X")]
    #[case("P: ", "X", "P: X")]
    #[case("", "X", "X")]
    fn hoist_prefix_joining(#[case] prefix: &str, #[case] message: &str, #[case] expected: &str) {
        assert_eq!(join_prefix(prefix, message), expected);
    }

    #[test]
    fn callback_method_becomes_method_source() {
        let source = MessageSource::from(Callback::<String>::method("greeting"));
        assert!(matches!(source, MessageSource::Method(name) if name == "greeting"));
    }

    #[test]
    fn when_then_unless_is_recorded_as_conflict() {
        let rule = MessageRule::new("x")
            .when(Condition::Always)
            .unless(Condition::Always);
        assert!(rule.guard.is_conflicting());
    }
}
