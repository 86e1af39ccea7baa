//! Regular-expression format validator

use regex::Regex;
use serde_json::Value;

use crate::foundation::ValidationError;

crate::validator! {
    /// Validates that a string value matches a regular expression.
    ///
    /// Non-string values never match.
    pub Format { pattern: Regex } for Value;
    rule(self, input) { input.as_str().is_some_and(|s| self.pattern.is_match(s)) }
    error(self, input) {
        ValidationError::new("invalid", "is invalid").with_param("pattern", self.pattern.to_string())
    }
    new(pattern: &str) -> regex::Error { Ok(Self { pattern: Regex::new(pattern)? }) }
    fn format(pattern: &str) -> regex::Error;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::Validate;
    use serde_json::json;

    #[test]
    fn format_matches_strings_only() {
        let v = format(r"^\d{3}$").unwrap();
        assert!(v.validate(&json!("123")).is_ok());
        assert!(v.validate(&json!("12a")).is_err());
        assert!(v.validate(&json!(123)).is_err());
    }

    #[test]
    fn invalid_pattern_is_a_construction_error() {
        assert!(format("(unclosed").is_err());
    }
}
