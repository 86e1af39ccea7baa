//! Property-based tests for actuate-validator.

use actuate_validator::foundation::humanize;
use actuate_validator::prelude::*;
use proptest::prelude::*;
use serde_json::{Value, json};

// ============================================================================
// IDEMPOTENCY: validate(x) == validate(x)
// ============================================================================

proptest! {
    #[test]
    fn presence_idempotent(s in ".*") {
        let v = presence();
        let value = json!(s);
        prop_assert_eq!(v.validate(&value).is_ok(), v.validate(&value).is_ok());
    }

    #[test]
    fn numericality_idempotent(n in any::<i32>()) {
        let v = Numericality::new().greater_than(0).less_than(100);
        let value = json!(n);
        prop_assert_eq!(v.validate(&value).is_ok(), v.validate(&value).is_ok());
    }

    #[test]
    fn length_idempotent(s in ".*") {
        let v = Length::new().minimum(2).maximum(8);
        let value = json!(s);
        prop_assert_eq!(v.validate(&value).is_ok(), v.validate(&value).is_ok());
    }
}

// ============================================================================
// AGREEMENT WITH PLAIN COMPARISONS
// ============================================================================

proptest! {
    #[test]
    fn greater_than_matches_comparison(n in any::<i32>(), bound in any::<i32>()) {
        let v = Numericality::new().greater_than(bound);
        prop_assert_eq!(v.validate(&json!(n)).is_ok(), n > bound);
    }

    #[test]
    fn numeric_strings_agree_with_numbers(n in any::<i32>()) {
        let v = Numericality::new().greater_than_or_equal_to(0);
        prop_assert_eq!(
            v.validate(&json!(n)).is_ok(),
            v.validate(&Value::String(n.to_string())).is_ok()
        );
    }

    #[test]
    fn length_matches_char_count(s in "\\PC{0,12}") {
        let v = Length::new().maximum(6);
        prop_assert_eq!(v.validate(&json!(s)).is_ok(), s.chars().count() <= 6);
    }

    #[test]
    fn blank_strings_are_whitespace(s in "[ \\t\\n]{0,8}") {
        prop_assert!(is_blank(&json!(s)));
    }

    #[test]
    fn humanize_never_keeps_underscores(s in "[a-z]{1,6}(_[a-z]{1,6}){0,3}") {
        prop_assert!(!humanize(&s).contains('_'));
    }
}
