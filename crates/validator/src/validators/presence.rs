//! Presence validators

use serde_json::Value;

use crate::foundation::{ValidationError, is_blank};

crate::validator! {
    /// Validates that a value is not blank (see [`is_blank`]).
    pub Presence for Value;
    rule(input) { !is_blank(input) }
    error(input) { ValidationError::blank() }
    fn presence();
}

crate::validator! {
    /// Presence for boolean fields: `false` is a value, only `null` is missing.
    pub BooleanPresence for Value;
    rule(input) { !input.is_null() }
    error(input) { ValidationError::new("inclusion", "must be true or false") }
    fn boolean_presence();
}
