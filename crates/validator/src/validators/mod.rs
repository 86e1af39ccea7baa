//! Built-in validators
//!
//! Every validator here checks a `serde_json::Value`.
//!
//! # Categories
//!
//! - **Presence**: blank / boolean-null checks
//! - **Type**: [`FieldType`] membership
//! - **Numeric**: comparisons, integrality, parity
//! - **Membership**: inclusion / exclusion lists
//! - **Size**: string and array length
//! - **Pattern**: regular expressions

mod format;
mod kind;
mod length;
mod membership;
mod numericality;
mod presence;

pub use format::{Format, format};
pub use kind::{FieldType, TypeOf};
pub use length::Length;
pub use membership::{Exclusion, Inclusion, exclusion, inclusion};
pub use numericality::{Numericality, as_number};
pub use presence::{BooleanPresence, Presence, boolean_presence, presence};
