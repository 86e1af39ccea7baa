//! Field declarations
//!
//! A [`Field`] describes one input or output: its type, validators, default
//! and redaction flag. It becomes a [`FieldSpec`] once declared under a name
//! and direction on a [`Contract`](crate::Contract).

use std::fmt;
use std::sync::Arc;

use actuate_validator::foundation::Validate;
use actuate_validator::validators::{
    Exclusion, FieldType, Format, Inclusion, Length, Numericality,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which side of the contract a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Declared with `expects`: read from the caller's inputs.
    Inbound,
    /// Declared with `exposes`: written by the body.
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inbound => f.write_str("inbound"),
            Self::Outbound => f.write_str("outbound"),
        }
    }
}

/// How a missing value is filled in.
#[derive(Clone)]
pub enum FieldDefault {
    /// A fixed value.
    Value(Value),
    /// Computed on demand, only when the default is actually needed.
    Callable(Arc<dyn Fn() -> anyhow::Result<Value> + Send + Sync>),
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "Value({v})"),
            Self::Callable(_) => f.write_str("Callable"),
        }
    }
}

type Rule = Arc<dyn Validate<Input = Value> + Send + Sync>;
type Predicate = Arc<dyn Fn(&Value) -> anyhow::Result<bool> + Send + Sync>;

/// Looks a record up by id; `Ok(None)` means "not found".
pub type ModelFinder = Arc<dyn Fn(&Value) -> anyhow::Result<Option<Value>> + Send + Sync>;

/// One validator attached to a field, run in declaration order.
#[derive(Clone)]
pub(crate) enum FieldCheck {
    Rule(Rule),
    Predicate { message: String, check: Predicate },
}

/// A field declaration before it is given a name.
///
/// ```rust
/// use actuate_action::Field;
/// use actuate_validator::prelude::*;
///
/// let amount = Field::of(FieldType::Numeric).validate(Numericality::new().greater_than(0));
/// let note = Field::new().allow_blank().default("");
/// # let _ = (amount, note);
/// ```
#[derive(Clone, Default)]
pub struct Field {
    pub(crate) kind: Option<FieldType>,
    pub(crate) checks: Vec<FieldCheck>,
    pub(crate) default: Option<FieldDefault>,
    pub(crate) allow_blank: bool,
    pub(crate) allow_nil: bool,
    pub(crate) sensitive: bool,
    pub(crate) on: Option<String>,
    pub(crate) model: Option<ModelFinder>,
}

impl Field {
    /// An untyped, required field.
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    /// A required field of the given type.
    pub fn of(kind: FieldType) -> Self {
        Self::new().kind(kind)
    }

    /// Restrict the value's type.
    #[must_use = "builder methods must be chained or built"]
    pub fn kind(mut self, kind: FieldType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Attach any validator over JSON values.
    #[must_use = "builder methods must be chained or built"]
    pub fn validate<V>(mut self, validator: V) -> Self
    where
        V: Validate<Input = Value> + Send + Sync + 'static,
    {
        self.checks.push(FieldCheck::Rule(Arc::new(validator)));
        self
    }

    /// Numeric bounds.
    #[must_use = "builder methods must be chained or built"]
    pub fn numericality(self, validator: Numericality) -> Self {
        self.validate(validator)
    }

    /// Value must be one of `values`.
    #[must_use = "builder methods must be chained or built"]
    pub fn inclusion(self, values: impl IntoIterator<Item = Value>) -> Self {
        self.validate(Inclusion::new(values))
    }

    /// Value must not be one of `values`.
    #[must_use = "builder methods must be chained or built"]
    pub fn exclusion(self, values: impl IntoIterator<Item = Value>) -> Self {
        self.validate(Exclusion::new(values))
    }

    /// String or array length bounds.
    #[must_use = "builder methods must be chained or built"]
    pub fn length(self, validator: Length) -> Self {
        self.validate(validator)
    }

    /// Value must match a regular expression.
    #[must_use = "builder methods must be chained or built"]
    pub fn format(self, validator: Format) -> Self {
        self.validate(validator)
    }

    /// Custom predicate. `Ok(false)` records `message`; an `Err` is reported
    /// as a piping error and records `"is invalid"`.
    #[must_use = "builder methods must be chained or built"]
    pub fn check<F>(mut self, message: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        self.checks.push(FieldCheck::Predicate {
            message: message.into(),
            check: Arc::new(check),
        });
        self
    }

    /// Fixed default, used when the value is missing, null, or blank on a
    /// field that does not allow blank.
    #[must_use = "builder methods must be chained or built"]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    /// Lazily computed default.
    #[must_use = "builder methods must be chained or built"]
    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.default = Some(FieldDefault::Callable(Arc::new(f)));
        self
    }

    /// Accept blank values (`""`, `[]`, `{}`, `null`).
    #[must_use = "builder methods must be chained or built"]
    pub fn allow_blank(mut self) -> Self {
        self.allow_blank = true;
        self
    }

    /// Accept a missing or `null` value.
    #[must_use = "builder methods must be chained or built"]
    pub fn allow_nil(mut self) -> Self {
        self.allow_nil = true;
        self
    }

    /// Redact the value in logs and exception reports.
    #[must_use = "builder methods must be chained or built"]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Read the value from inside another field: `on("settings")` reads
    /// `settings.<name>`. Paths may be dotted.
    #[must_use = "builder methods must be chained or built"]
    pub fn on(mut self, path: impl Into<String>) -> Self {
        self.on = Some(path.into());
        self
    }

    /// Resolve the id to a record. The field name must end in `_id`; the
    /// record is stored under the name without it.
    #[must_use = "builder methods must be chained or built"]
    pub fn model<F>(mut self, finder: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        self.model = Some(Arc::new(finder));
        self
    }

    pub(crate) fn is_boolean(&self) -> bool {
        self.kind.as_ref().is_some_and(FieldType::is_boolean)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("kind", &self.kind)
            .field("checks", &self.checks.len())
            .field("default", &self.default)
            .field("allow_blank", &self.allow_blank)
            .field("allow_nil", &self.allow_nil)
            .field("sensitive", &self.sensitive)
            .field("on", &self.on)
            .field("model", &self.model.is_some())
            .finish()
    }
}

/// A declared field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub(crate) name: String,
    pub(crate) direction: Direction,
    pub(crate) field: Field,
}

impl FieldSpec {
    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inbound or outbound.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Declared type, if any.
    pub fn kind(&self) -> Option<&FieldType> {
        self.field.kind.as_ref()
    }

    /// Whether the value is redacted in logs and reports.
    pub fn is_sensitive(&self) -> bool {
        self.field.sensitive
    }

    /// Name the looked-up record is stored under, for model fields.
    pub fn record_name(&self) -> Option<&str> {
        self.field
            .model
            .as_ref()
            .and_then(|_| self.name.strip_suffix("_id"))
    }
}
