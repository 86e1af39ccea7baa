//! Ambient logging context.

pub mod context;
