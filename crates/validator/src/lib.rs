//! # actuate-validator
//!
//! Field-level validation for action contracts.
//!
//! Every validator checks a single `serde_json::Value` and reports at most one
//! [`ValidationError`](foundation::ValidationError). Contracts run several of
//! them per field and collect the failures into
//! [`ValidationErrors`](foundation::ValidationErrors), whose message reads as
//! an English sentence (`"Foo must be greater than 10"`).
//!
//! ## Quick Start
//!
//! ```rust
//! use actuate_validator::prelude::*;
//! use serde_json::json;
//!
//! let positive = Numericality::new().greater_than(0);
//! assert!(positive.validate(&json!(3)).is_ok());
//! assert_eq!(
//!     positive.validate(&json!(-1)).unwrap_err().message,
//!     "must be greater than 0"
//! );
//! ```
//!
//! ## Built-in Validators
//!
//! - **Presence**: [`Presence`](validators::Presence),
//!   [`BooleanPresence`](validators::BooleanPresence)
//! - **Type**: [`TypeOf`](validators::TypeOf) over [`FieldType`](validators::FieldType)
//! - **Numeric**: [`Numericality`](validators::Numericality)
//! - **Membership**: [`Inclusion`](validators::Inclusion), [`Exclusion`](validators::Exclusion)
//! - **Size**: [`Length`](validators::Length)
//! - **Pattern**: [`Format`](validators::Format)

#![forbid(unsafe_code)]
#![warn(missing_docs)]
// ValidationError is returned by value from every check; boxing it buys nothing.
#![allow(clippy::result_large_err)]

pub mod foundation;
mod macros;
pub mod prelude;
pub mod validators;
