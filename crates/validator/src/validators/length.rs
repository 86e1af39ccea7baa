//! Length validation for strings and arrays
//!
//! Strings are measured in Unicode scalar values, arrays by element count.
//! Other value types are not measured and fail with `"has the wrong length"`
//! only when a bound is set.

use serde_json::Value;

use crate::foundation::{Validate, ValidationError};

fn measure(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn characters(count: usize) -> String {
    if count == 1 {
        "1 character".to_string()
    } else {
        format!("{count} characters")
    }
}

/// Validates string or array length.
///
/// # Examples
///
/// ```rust
/// use actuate_validator::prelude::*;
/// use serde_json::json;
///
/// let v = Length::new().minimum(2).maximum(4);
/// assert!(v.validate(&json!("abc")).is_ok());
/// assert_eq!(
///     v.validate(&json!("a")).unwrap_err().message,
///     "is too short (minimum is 2 characters)"
/// );
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Length {
    minimum: Option<usize>,
    maximum: Option<usize>,
    is: Option<usize>,
}

impl Length {
    /// No bounds.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            minimum: None,
            maximum: None,
            is: None,
        }
    }

    /// At least `n`.
    #[must_use = "builder methods must be chained or built"]
    pub const fn minimum(mut self, n: usize) -> Self {
        self.minimum = Some(n);
        self
    }

    /// At most `n`.
    #[must_use = "builder methods must be chained or built"]
    pub const fn maximum(mut self, n: usize) -> Self {
        self.maximum = Some(n);
        self
    }

    /// Exactly `n`.
    #[must_use = "builder methods must be chained or built"]
    pub const fn is(mut self, n: usize) -> Self {
        self.is = Some(n);
        self
    }
}

impl Validate for Length {
    type Input = Value;

    fn validate(&self, input: &Value) -> Result<(), ValidationError> {
        if self.minimum.is_none() && self.maximum.is_none() && self.is.is_none() {
            return Ok(());
        }
        let Some(len) = measure(input) else {
            return Err(ValidationError::new("wrong_length", "has the wrong length"));
        };

        if let Some(n) = self.is
            && len != n
        {
            return Err(ValidationError::new(
                "wrong_length",
                format!("is the wrong length (should be {})", characters(n)),
            )
            .with_param("count", n.to_string()));
        }
        if let Some(n) = self.minimum
            && len < n
        {
            return Err(ValidationError::new(
                "too_short",
                format!("is too short (minimum is {})", characters(n)),
            )
            .with_param("count", n.to_string()));
        }
        if let Some(n) = self.maximum
            && len > n
        {
            return Err(ValidationError::new(
                "too_long",
                format!("is too long (maximum is {})", characters(n)),
            )
            .with_param("count", n.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!("ab"), true)]
    #[case(json!("a"), false)]
    #[case(json!("abcde"), false)]
    #[case(json!(["x", "y", "z"]), true)]
    #[case(json!("héé"), true)]
    fn bounds(#[case] value: Value, #[case] ok: bool) {
        assert_eq!(Length::new().minimum(2).maximum(4).validate(&value).is_ok(), ok);
    }

    #[test]
    fn messages() {
        assert_eq!(
            Length::new().maximum(1).validate(&json!("ab")).unwrap_err().message,
            "is too long (maximum is 1 character)"
        );
        assert_eq!(
            Length::new().is(3).validate(&json!([])).unwrap_err().message,
            "is the wrong length (should be 3 characters)"
        );
    }

    #[test]
    fn unmeasurable_value() {
        assert!(Length::new().validate(&json!(5)).is_ok());
        assert_eq!(
            Length::new().minimum(1).validate(&json!(5)).unwrap_err().code,
            "wrong_length"
        );
    }
}
