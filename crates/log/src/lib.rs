//! # actuate-log
//!
//! Logging bootstrap shared by the actuate crates.
//!
//! The execution engine only ever talks to `tracing`; this crate decides how
//! those events are rendered (pretty in development, JSON in production) and
//! carries the ambient request-scoped [`Context`] that exception reports pick
//! up.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! fn main() -> actuate_log::LogResult<()> {
//!     let _guard = actuate_log::auto_init()?;
//!     tracing::info!(port = 8080, "Server starting");
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod layer;

pub use builder::{LoggerBuilder, LoggerGuard};
pub use config::{Config, DisplayConfig, Environment, Format, Level};
pub use error::{LogError, LogResult};
pub use layer::context::Context;

/// Auto-detect and initialize the best logging configuration.
///
/// An explicit `ACTUATE_LOG` / `RUST_LOG` wins; otherwise the preset follows
/// the detected [`Environment`].
///
/// # Errors
///
/// Returns [`LogError::Filter`] if the configured filter cannot be parsed.
pub fn auto_init() -> LogResult<LoggerGuard> {
    if std::env::var("ACTUATE_LOG").is_ok() || std::env::var("RUST_LOG").is_ok() {
        return init_with(Config::from_env());
    }
    match Environment::detect() {
        Environment::Production => init_with(Config::production()),
        Environment::Test => init_with(Config::test()),
        Environment::Development => init_with(Config::development()),
    }
}

/// Initialize with the default configuration.
///
/// # Errors
///
/// Returns [`LogError::Filter`] if the default filter cannot be parsed.
pub fn init() -> LogResult<LoggerGuard> {
    init_with(Config::default())
}

/// Initialize with a custom configuration.
///
/// # Errors
///
/// Returns [`LogError::Filter`] if `config.level` is not a valid filter.
pub fn init_with(config: Config) -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}

/// Initialize for tests. Safe to call from every test; only the first call
/// installs a subscriber.
///
/// # Errors
///
/// Returns [`LogError::Filter`] if the test filter cannot be parsed.
pub fn init_test() -> LogResult<LoggerGuard> {
    if tracing::dispatcher::has_been_set() {
        return Ok(LoggerGuard::noop());
    }
    init_with(Config::test())
}
