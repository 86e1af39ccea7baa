//! Inclusion and exclusion lists

use serde_json::Value;

use crate::foundation::ValidationError;

crate::validator! {
    /// Validates that a value is one of an allowed list.
    pub Inclusion { values: Vec<Value> } for Value;
    rule(self, input) { self.values.contains(input) }
    error(self, input) { ValidationError::new("inclusion", "is not included in the list") }
    new(values: impl IntoIterator<Item = Value>) { Self { values: values.into_iter().collect() } }
    fn inclusion(values: impl IntoIterator<Item = Value>);
}

crate::validator! {
    /// Validates that a value is not one of a reserved list.
    pub Exclusion { values: Vec<Value> } for Value;
    rule(self, input) { !self.values.contains(input) }
    error(self, input) { ValidationError::new("exclusion", "is reserved") }
    new(values: impl IntoIterator<Item = Value>) { Self { values: values.into_iter().collect() } }
    fn exclusion(values: impl IntoIterator<Item = Value>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::Validate;
    use serde_json::json;

    #[test]
    fn inclusion_checks_membership() {
        let v = inclusion([json!("red"), json!("green")]);
        assert!(v.validate(&json!("red")).is_ok());
        assert_eq!(
            v.validate(&json!("blue")).unwrap_err().message,
            "is not included in the list"
        );
    }

    #[test]
    fn exclusion_checks_membership() {
        let v = exclusion([json!("admin")]);
        assert!(v.validate(&json!("guest")).is_ok());
        assert_eq!(v.validate(&json!("admin")).unwrap_err().code, "exclusion");
    }
}
