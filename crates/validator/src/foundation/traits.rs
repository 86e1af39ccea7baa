//! Core traits for the validation system

use crate::foundation::ValidationError;

/// The core trait that all validators implement.
///
/// Generic over the input type so that validators over plain Rust values and
/// over `serde_json::Value` share one vocabulary. The built-in validators all
/// use `Input = serde_json::Value`.
///
/// # Examples
///
/// ```rust
/// use actuate_validator::foundation::{Validate, ValidationError};
///
/// struct MinLength {
///     min: usize,
/// }
///
/// impl Validate for MinLength {
///     type Input = str;
///
///     fn validate(&self, input: &Self::Input) -> Result<(), ValidationError> {
///         if input.len() >= self.min {
///             Ok(())
///         } else {
///             Err(ValidationError::new("too_short", "is too short"))
///         }
///     }
/// }
///
/// assert!(MinLength { min: 2 }.validate("ok").is_ok());
/// ```
pub trait Validate {
    /// The type of input being validated.
    type Input: ?Sized;

    /// Validates the input value.
    ///
    /// # Errors
    ///
    /// Returns the first rule the input breaks.
    fn validate(&self, input: &Self::Input) -> Result<(), ValidationError>;

    /// Returns the name of this validator.
    ///
    /// Used for debugging and error messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
