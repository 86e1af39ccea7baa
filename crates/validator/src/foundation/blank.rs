use serde_json::Value;

/// Whether a value counts as blank: `null`, `false`, an all-whitespace
/// string, an empty array or an empty object.
///
/// Boolean fields treat `false` as a value; check them with
/// [`BooleanPresence`](crate::validators::BooleanPresence) instead.
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(true) | Value::Number(_) => false,
    }
}
