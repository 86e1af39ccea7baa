//! Prelude module for convenient imports.
//!
//! ```rust
//! use actuate_validator::prelude::*;
//! use serde_json::json;
//!
//! assert!(presence().validate(&json!("x")).is_ok());
//! ```

pub use crate::foundation::{Validate, ValidationError, ValidationErrors, is_blank};

pub use crate::validators::{
    BooleanPresence, Exclusion, FieldType, Format, Inclusion, Length, Numericality, Presence,
    TypeOf, as_number, boolean_presence, exclusion, format, inclusion, presence,
};
