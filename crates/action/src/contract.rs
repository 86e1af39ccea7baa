//! Inbound and outbound field contracts
//!
//! [`Contract::validate`] checks a raw JSON map against the fields declared
//! for one direction and returns the coerced map: declared fields only, with
//! defaults filled in and model ids resolved to records. Every failing check
//! is collected; nothing stops at the first error.

use actuate_validator::foundation::{Validate, ValidationError, ValidationErrors, is_blank};
use actuate_validator::validators::{BooleanPresence, Presence, TypeOf};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::field::{Direction, Field, FieldCheck, FieldDefault, FieldSpec};
use crate::piping::PipingSink;

/// Names no field may use, in either direction.
pub const RESERVED_NAMES: &[&str] = &[
    "success",
    "error",
    "result",
    "exception",
    "outcome",
    "default_error",
    "default_success",
    "action_name",
    "ok",
    "message",
    "elapsed_time",
    "context",
    "fail",
    "done",
    "call",
];

/// Value used in place of sensitive fields in logs and reports.
pub const FILTERED: &str = "[FILTERED]";

/// The ordered field declarations of one action.
#[derive(Debug, Clone, Default)]
pub struct Contract {
    fields: Vec<FieldSpec>,
}

impl Contract {
    /// An empty contract.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ReservedName`] for a name in [`RESERVED_NAMES`]
    /// - [`ConfigError::DuplicateField`] if the name is taken in either
    ///   direction, or collides with a model field's record name
    /// - [`ConfigError::InvalidModelField`] for a model lookup on a name not
    ///   ending in `_id`
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        direction: Direction,
        field: Field,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if RESERVED_NAMES.contains(&name.as_str()) {
            return Err(ConfigError::ReservedName { field: name });
        }
        if field.model.is_some()
            && name
                .strip_suffix("_id")
                .is_none_or(|record| record.is_empty())
        {
            return Err(ConfigError::InvalidModelField { field: name });
        }
        if self.is_taken(&name) {
            return Err(ConfigError::DuplicateField { field: name });
        }
        let spec = FieldSpec {
            name,
            direction,
            field,
        };
        if let Some(record) = spec.record_name()
            && self.is_taken(record)
        {
            return Err(ConfigError::DuplicateField {
                field: record.to_string(),
            });
        }
        self.fields.push(spec);
        Ok(())
    }

    fn is_taken(&self, name: &str) -> bool {
        self.fields
            .iter()
            .any(|spec| spec.name == name || spec.record_name() == Some(name))
    }

    /// Declared fields for one direction, in declaration order.
    pub fn fields(&self, direction: Direction) -> impl Iterator<Item = &FieldSpec> {
        self.fields
            .iter()
            .filter(move |spec| spec.direction == direction)
    }

    /// Look a declared field up by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// Whether `name` is declared in `direction`.
    pub fn declares(&self, name: &str, direction: Direction) -> bool {
        self.field(name).is_some_and(|spec| spec.direction == direction)
    }

    /// Names of the outbound fields.
    pub fn outbound_names(&self) -> Vec<String> {
        self.fields(Direction::Outbound)
            .map(|spec| spec.name.clone())
            .collect()
    }

    /// Validate `raw` against the fields of one direction.
    ///
    /// # Errors
    ///
    /// Returns every failed check. Calling twice with the same input yields
    /// the same outcome.
    pub fn validate(
        &self,
        raw: &Map<String, Value>,
        direction: Direction,
    ) -> Result<Map<String, Value>, ValidationErrors> {
        self.validate_with(raw, direction, &PipingSink::detached())
    }

    pub(crate) fn validate_with(
        &self,
        raw: &Map<String, Value>,
        direction: Direction,
        sink: &PipingSink<'_>,
    ) -> Result<Map<String, Value>, ValidationErrors> {
        let mut out = Map::new();
        let mut errors = ValidationErrors::new();

        for spec in self.fields(direction) {
            let value = self.resolve(spec, raw, &out, sink);
            if let Some(value) = check_field(spec, value, sink, &mut errors) {
                if let Some(record) = spec.record_name() {
                    lookup_record(spec, record, &value, sink, &mut out, &mut errors);
                }
                out.insert(spec.name.clone(), value);
            }
        }

        errors.into_result(out)
    }

    /// Fill defaults without validating. Used for outputs of runs that did
    /// not succeed, where validation is not enforced.
    pub(crate) fn fill_defaults(
        &self,
        raw: &Map<String, Value>,
        direction: Direction,
        sink: &PipingSink<'_>,
    ) -> Map<String, Value> {
        let mut out = Map::new();
        for spec in self.fields(direction) {
            if let Some(value) = self.resolve(spec, raw, &out, sink) {
                out.insert(spec.name.clone(), value);
            }
        }
        out
    }

    /// Replace sensitive values with [`FILTERED`].
    ///
    /// Covers the field's own key, the looked-up record of a model field,
    /// and the copy nested inside the parent of an `on` subfield.
    pub fn redact(&self, map: &Map<String, Value>) -> Map<String, Value> {
        let mut out = map.clone();
        for spec in self.fields.iter().filter(|spec| spec.is_sensitive()) {
            filter_key(&mut out, &spec.name);
            if let Some(record) = spec.record_name() {
                filter_key(&mut out, record);
            }
            if let Some(path) = &spec.field.on {
                let mut segments = path.split('.');
                let root = segments.next().unwrap_or_default();
                let parent = segments.fold(out.get_mut(root), |node, key| node?.get_mut(key));
                if let Some(Value::Object(parent)) = parent {
                    filter_key(parent, &spec.name);
                }
            }
        }
        out
    }

    /// The raw value with the default applied.
    fn resolve(
        &self,
        spec: &FieldSpec,
        raw: &Map<String, Value>,
        resolved: &Map<String, Value>,
        sink: &PipingSink<'_>,
    ) -> Option<Value> {
        let value = match &spec.field.on {
            None => raw.get(&spec.name).cloned(),
            Some(path) => {
                let mut segments = path.split('.');
                let root = segments.next().unwrap_or_default();
                let parent = resolved.get(root).or_else(|| raw.get(root));
                segments
                    .try_fold(parent, |node, key| Some(node?.get(key)))
                    .flatten()
                    .and_then(|node| node.get(&spec.name))
                    .cloned()
            }
        };

        let needs_default = match &value {
            None | Some(Value::Null) => true,
            Some(v) => !spec.field.allow_blank && is_blank_for(&spec.field, v),
        };
        if !needs_default {
            return value;
        }
        match &spec.field.default {
            None => value,
            Some(FieldDefault::Value(default)) => Some(default.clone()),
            Some(FieldDefault::Callable(f)) => {
                let what = format!("computing the default for `{}`", spec.name);
                sink.guard(&what, || f()).or(value)
            }
        }
    }
}

/// Run presence, type and declared validators. Returns the value to store,
/// or `None` when nothing should be stored.
fn check_field(
    spec: &FieldSpec,
    value: Option<Value>,
    sink: &PipingSink<'_>,
    errors: &mut ValidationErrors,
) -> Option<Value> {
    let field: &Field = &spec.field;
    let name = spec.name.clone();

    let Some(value) = value.filter(|v| !v.is_null()) else {
        if field.allow_nil || field.allow_blank {
            return None;
        }
        if field.is_boolean() {
            push(errors, &name, BooleanPresence.validate(&Value::Null));
        } else {
            errors.add(ValidationError::blank().with_field(name));
        }
        return None;
    };

    if is_blank_for(field, &value) {
        if field.allow_blank {
            return Some(value);
        }
        push(errors, &name, Presence.validate(&value));
        return None;
    }

    if let Some(kind) = &field.kind
        && let Err(e) = TypeOf::new(kind.clone()).validate(&value)
    {
        errors.add(e.with_field(name));
        return None;
    }

    let before = errors.len();
    for check in &field.checks {
        match check {
            FieldCheck::Rule(rule) => push(errors, &name, rule.validate(&value)),
            FieldCheck::Predicate { message, check } => {
                let what = format!("validating `{name}`");
                match sink.guard(&what, || check(&value)) {
                    Some(true) => {}
                    Some(false) => errors.add(
                        ValidationError::new("custom", message.clone()).with_field(name.clone()),
                    ),
                    None => errors.add(
                        ValidationError::new("invalid", "is invalid").with_field(name.clone()),
                    ),
                }
            }
        }
    }

    (errors.len() == before).then_some(value)
}

/// Blankness as seen by `field`: an explicit `false` is a value for boolean
/// fields and blank for every other field.
fn is_blank_for(field: &Field, value: &Value) -> bool {
    is_blank(value) && !(field.is_boolean() && value == &Value::Bool(false))
}

fn filter_key(map: &mut Map<String, Value>, key: &str) {
    if let Some(value) = map.get_mut(key) {
        *value = Value::String(FILTERED.to_string());
    }
}

fn lookup_record(
    spec: &FieldSpec,
    record: &str,
    id: &Value,
    sink: &PipingSink<'_>,
    out: &mut Map<String, Value>,
    errors: &mut ValidationErrors,
) {
    let Some(finder) = &spec.field.model else {
        return;
    };
    let what = format!("looking up `{record}`");
    match sink.guard(&what, || finder(id)) {
        Some(Some(found)) => {
            out.insert(record.to_string(), found);
        }
        Some(None) => errors.add(
            ValidationError::new("not_found", "not found").with_field(spec.name.clone()),
        ),
        None => errors.add(
            ValidationError::new("invalid", "is invalid").with_field(spec.name.clone()),
        ),
    }
}

fn push(errors: &mut ValidationErrors, field: &str, outcome: Result<(), ValidationError>) {
    if let Err(e) = outcome {
        errors.add(e.with_field(field.to_string()));
    }
}
