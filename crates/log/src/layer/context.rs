//! Request-scoped context for structured logging
//!
//! The context lives in thread-local storage: execution in this workspace is
//! synchronous, so a scope opened on the calling thread covers the whole run,
//! nested runs included.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

thread_local! {
    static CTX: RefCell<Arc<Context>> = RefCell::new(Arc::new(Context::default()));
}

/// Context for structured logging
///
/// Contains request-scoped fields like request ID and user ID that
/// exception reports attach as ambient attributes.
/// Activate via [`scope_sync`](Self::scope_sync).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Request ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// User ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Additional fields
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Context {
    /// Create a new empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set request ID
    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Set user ID
    #[must_use]
    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    /// Add a field. Values that fail to serialize are dropped.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
        self
    }

    /// Returns `true` when no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.request_id.is_none() && self.user_id.is_none() && self.fields.is_empty()
    }

    /// Get current context (cheap `Arc::clone`, no deep copy)
    #[inline]
    #[must_use]
    pub fn current() -> Arc<Self> {
        CTX.with(|c| c.borrow().clone())
    }

    /// Run a closure with this context active.
    ///
    /// Nesting is supported: inner scopes shadow outer ones and the outer
    /// context is restored on return, including on unwind.
    pub fn scope_sync<R>(self, f: impl FnOnce() -> R) -> R {
        struct Restore(Option<Arc<Context>>);

        impl Drop for Restore {
            fn drop(&mut self) {
                if let Some(prev) = self.0.take() {
                    CTX.with(|cell| *cell.borrow_mut() = prev);
                }
            }
        }

        let prev = CTX.with(|cell| cell.replace(Arc::new(self)));
        let _restore = Restore(Some(prev));
        f()
    }

    /// The context as a JSON object.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_context_is_empty() {
        assert!(Context::current().is_empty());
    }

    #[test]
    fn scope_shadows_and_restores() {
        Context::new().with_request_id("outer").scope_sync(|| {
            assert_eq!(Context::current().request_id.as_deref(), Some("outer"));

            Context::new().with_request_id("inner").scope_sync(|| {
                assert_eq!(Context::current().request_id.as_deref(), Some("inner"));
            });

            assert_eq!(Context::current().request_id.as_deref(), Some("outer"));
        });
        assert!(Context::current().request_id.is_none());
    }

    #[test]
    fn to_value_flattens_fields() {
        let ctx = Context::new()
            .with_user_id("u-1")
            .with_field("tenant", "acme");
        assert_eq!(
            ctx.to_value(),
            serde_json::json!({"user_id": "u-1", "tenant": "acme"})
        );
    }
}
