//! Core validation types and traits
//!
//! - **Traits**: [`Validate`]
//! - **Errors**: [`ValidationError`], [`ValidationErrors`]
//! - **Helpers**: [`is_blank`], [`humanize`], [`to_sentence`]

mod blank;
mod error;
mod traits;

pub use blank::is_blank;
pub use error::{ValidationError, ValidationErrors, humanize, to_sentence};
pub use traits::Validate;
