use std::collections::HashMap;

use serde_json::Value;

use crate::action::Action;
use crate::result::ActionResult;
use crate::runtime::Runtime;

/// Actions looked up by name.
///
/// Lets a caller run an action it only knows by name (from a job queue,
/// a console, a config file) against a shared [`Runtime`].
///
/// # Example
///
/// ```rust
/// use actuate_action::{ActionBuilder, ActionRegistry};
///
/// let mut registry = ActionRegistry::new();
/// registry.register(ActionBuilder::new("Noop").body(|_| Ok(())).build().unwrap());
///
/// assert!(registry.get("Noop").is_some());
/// assert!(registry.get("Unknown").is_none());
/// assert!(registry.call("Noop", serde_json::json!({})).unwrap().is_ok());
/// ```
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Action>,
    runtime: Runtime,
}

impl ActionRegistry {
    /// Create an empty registry with a default runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry whose calls run against `runtime`.
    pub fn with_runtime(runtime: Runtime) -> Self {
        Self {
            actions: HashMap::new(),
            runtime,
        }
    }

    /// Register an action. Overwrites any existing action with the same name.
    pub fn register(&mut self, action: Action) {
        self.actions.insert(action.name().to_string(), action);
    }

    /// Look up an action by name.
    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    /// Check whether an action with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Names of all registered actions, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if no actions are registered.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Remove an action by name. Returns the removed action, if any.
    pub fn unregister(&mut self, name: &str) -> Option<Action> {
        self.actions.remove(name)
    }

    /// Iterate over all registered `(name, action)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Action)> {
        self.actions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Run the action registered under `name`, or `None` if there is none.
    pub fn call(&self, name: &str, inputs: Value) -> Option<ActionResult> {
        self.get(name).map(|action| action.call_in(&self.runtime, inputs))
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("count", &self.actions.len())
            .field("names", &self.list())
            .finish()
    }
}
