//! Numeric validation with comparison bounds
//!
//! Bounds are stored as `f64`; whole bounds render without a fraction so
//! messages read `"must be greater than 10"`.

use serde_json::Value;

use crate::foundation::{Validate, ValidationError};

/// Reads a number out of a JSON value.
///
/// Numeric strings (`"42"`, `" 3.5 "`) are accepted; anything else is `None`.
#[must_use]
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn render(bound: f64) -> String {
    if bound.fract() == 0.0 && bound.abs() < 1e15 {
        format!("{}", bound as i64)
    } else {
        bound.to_string()
    }
}

/// Validates that a value is numeric and satisfies every configured bound.
///
/// # Examples
///
/// ```rust
/// use actuate_validator::prelude::*;
/// use serde_json::json;
///
/// let v = Numericality::new().greater_than(0).less_than_or_equal_to(100);
/// assert!(v.validate(&json!(50)).is_ok());
/// assert_eq!(v.validate(&json!(0)).unwrap_err().message, "must be greater than 0");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Numericality {
    greater_than: Option<f64>,
    greater_than_or_equal_to: Option<f64>,
    less_than: Option<f64>,
    less_than_or_equal_to: Option<f64>,
    equal_to: Option<f64>,
    other_than: Option<f64>,
    only_integer: bool,
    odd: bool,
    even: bool,
}

impl Numericality {
    /// Accepts any number.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value must be strictly greater than `bound`.
    #[must_use = "builder methods must be chained or built"]
    pub fn greater_than(mut self, bound: impl Into<f64>) -> Self {
        self.greater_than = Some(bound.into());
        self
    }

    /// Value must be at least `bound`.
    #[must_use = "builder methods must be chained or built"]
    pub fn greater_than_or_equal_to(mut self, bound: impl Into<f64>) -> Self {
        self.greater_than_or_equal_to = Some(bound.into());
        self
    }

    /// Value must be strictly less than `bound`.
    #[must_use = "builder methods must be chained or built"]
    pub fn less_than(mut self, bound: impl Into<f64>) -> Self {
        self.less_than = Some(bound.into());
        self
    }

    /// Value must be at most `bound`.
    #[must_use = "builder methods must be chained or built"]
    pub fn less_than_or_equal_to(mut self, bound: impl Into<f64>) -> Self {
        self.less_than_or_equal_to = Some(bound.into());
        self
    }

    /// Value must equal `bound`.
    #[must_use = "builder methods must be chained or built"]
    pub fn equal_to(mut self, bound: impl Into<f64>) -> Self {
        self.equal_to = Some(bound.into());
        self
    }

    /// Value must differ from `bound`.
    #[must_use = "builder methods must be chained or built"]
    pub fn other_than(mut self, bound: impl Into<f64>) -> Self {
        self.other_than = Some(bound.into());
        self
    }

    /// Value must be a whole number.
    #[must_use = "builder methods must be chained or built"]
    pub fn only_integer(mut self) -> Self {
        self.only_integer = true;
        self
    }

    /// Value must be odd.
    #[must_use = "builder methods must be chained or built"]
    pub fn odd(mut self) -> Self {
        self.odd = true;
        self
    }

    /// Value must be even.
    #[must_use = "builder methods must be chained or built"]
    pub fn even(mut self) -> Self {
        self.even = true;
        self
    }

    fn bound_error(code: &'static str, phrase: &str, bound: f64) -> ValidationError {
        let count = render(bound);
        ValidationError::new(code, format!("{phrase} {count}")).with_param("count", count)
    }
}

impl Validate for Numericality {
    type Input = Value;

    #[allow(clippy::float_cmp)]
    fn validate(&self, input: &Value) -> Result<(), ValidationError> {
        let Some(n) = as_number(input) else {
            return Err(ValidationError::new("not_a_number", "is not a number"));
        };

        if (self.only_integer || self.odd || self.even) && n.fract() != 0.0 {
            return Err(ValidationError::new("not_an_integer", "must be an integer"));
        }
        if let Some(b) = self.greater_than
            && n <= b
        {
            return Err(Self::bound_error("greater_than", "must be greater than", b));
        }
        if let Some(b) = self.greater_than_or_equal_to
            && n < b
        {
            return Err(Self::bound_error(
                "greater_than_or_equal_to",
                "must be greater than or equal to",
                b,
            ));
        }
        if let Some(b) = self.less_than
            && n >= b
        {
            return Err(Self::bound_error("less_than", "must be less than", b));
        }
        if let Some(b) = self.less_than_or_equal_to
            && n > b
        {
            return Err(Self::bound_error(
                "less_than_or_equal_to",
                "must be less than or equal to",
                b,
            ));
        }
        if let Some(b) = self.equal_to
            && n != b
        {
            return Err(Self::bound_error("equal_to", "must be equal to", b));
        }
        if let Some(b) = self.other_than
            && n == b
        {
            return Err(Self::bound_error("other_than", "must be other than", b));
        }
        if self.odd && n.rem_euclid(2.0) != 1.0 {
            return Err(ValidationError::new("odd", "must be odd"));
        }
        if self.even && n.rem_euclid(2.0) != 0.0 {
            return Err(ValidationError::new("even", "must be even"));
        }
        Ok(())
    }
}
