//! Type constraints for JSON values

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::foundation::{Validate, ValidationError};

/// The type a field value must have.
///
/// `OneOf` accepts a value matching any of the listed types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Any JSON string.
    String,
    /// A number without a fractional part.
    Integer,
    /// A number with a fractional part or any float representation.
    Float,
    /// Any JSON number.
    Numeric,
    /// `true` or `false`.
    Boolean,
    /// A string holding a valid UUID.
    Uuid,
    /// A JSON object (keyword-style parameters).
    Params,
    /// A JSON array.
    Array,
    /// No constraint.
    Any,
    /// Any of the listed types.
    OneOf(Vec<FieldType>),
}

impl FieldType {
    /// Whether `value` satisfies this type.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_f64(),
            Self::Numeric => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Uuid => value
                .as_str()
                .is_some_and(|s| uuid::Uuid::parse_str(s).is_ok()),
            Self::Params => value.is_object(),
            Self::Array => value.is_array(),
            Self::Any => true,
            Self::OneOf(types) => types.iter().any(|t| t.matches(value)),
        }
    }

    /// Whether this type is exactly [`FieldType::Boolean`].
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean)
    }

    fn mismatch_message(&self) -> String {
        match self {
            Self::Uuid => "is not a uuid".to_string(),
            Self::Boolean => "is not a boolean".to_string(),
            Self::OneOf(types) => {
                let names: Vec<String> = types.iter().map(ToString::to_string).collect();
                format!("is not one of {}", names.join(", "))
            }
            other => {
                let name = other.to_string();
                let article = if name.starts_with(['A', 'E', 'I', 'O', 'U']) {
                    "an"
                } else {
                    "a"
                };
                format!("is not {article} {name}")
            }
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("String"),
            Self::Integer => f.write_str("Integer"),
            Self::Float => f.write_str("Float"),
            Self::Numeric => f.write_str("Numeric"),
            Self::Boolean => f.write_str("Boolean"),
            Self::Uuid => f.write_str("Uuid"),
            Self::Params => f.write_str("Params"),
            Self::Array => f.write_str("Array"),
            Self::Any => f.write_str("Any"),
            Self::OneOf(types) => {
                let names: Vec<String> = types.iter().map(ToString::to_string).collect();
                write!(f, "OneOf({})", names.join(", "))
            }
        }
    }
}

/// Validates that a value has a given [`FieldType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeOf {
    /// The required type.
    pub kind: FieldType,
}

impl TypeOf {
    /// Creates a type validator.
    #[must_use]
    pub fn new(kind: FieldType) -> Self {
        Self { kind }
    }
}

impl Validate for TypeOf {
    type Input = Value;

    fn validate(&self, input: &Value) -> Result<(), ValidationError> {
        if self.kind.matches(input) {
            Ok(())
        } else {
            Err(ValidationError::new("type", self.kind.mismatch_message())
                .with_param("expected", self.kind.to_string()))
        }
    }
}
