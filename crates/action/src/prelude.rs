//! Convenience re-exports for action authors.
//!
//! ```rust
//! use actuate_action::prelude::*;
//! ```

pub use crate::action::{Action, ActionBuilder};
pub use crate::callback::{CallArgs, Callback, Condition};
pub use crate::context::ActionContext;
pub use crate::exception::{Control, Exception, Interrupt, done, fail};
pub use crate::field::Field;
pub use crate::handler::{Around, Handler, Lifecycle};
pub use crate::message::MessageRule;
pub use crate::result::{ActionResult, Outcome};
pub use crate::runtime::Runtime;

pub use actuate_validator::validators::{
    Exclusion, FieldType, Format, Inclusion, Length, Numericality,
};
