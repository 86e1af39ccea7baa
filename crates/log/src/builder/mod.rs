//! Logger builder implementation

use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, Format};
use crate::error::{LogError, LogResult};

/// Logger builder
#[derive(Debug)]
pub struct LoggerBuilder {
    config: Config,
}

/// Guard returned by [`LoggerBuilder::build`].
///
/// Reports whether this call installed the global subscriber or found one
/// already in place.
#[derive(Debug)]
pub struct LoggerGuard {
    installed: bool,
}

/// Installs `registry + filter + layer`, optionally stripping timestamps.
/// Each format produces a distinct layer type, so the chain is repeated per
/// arm instead of boxed.
macro_rules! try_init_layer {
    ($filter:expr, $layer:expr, $time:expr) => {{
        if $time {
            Registry::default().with($filter).with($layer).try_init()
        } else {
            Registry::default()
                .with($filter)
                .with($layer.without_time())
                .try_init()
        }
    }};
}

impl LoggerBuilder {
    /// Create builder from config
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Build and install the global subscriber.
    ///
    /// A subscriber installed earlier (by the host application or another
    /// test) is left in place and a no-op guard is returned.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Filter`] if the filter string cannot be parsed.
    pub fn build(self) -> LogResult<LoggerGuard> {
        let filter = EnvFilter::try_new(&self.config.level)
            .map_err(|e| LogError::Filter(format!("{}: {e}", self.config.level)))?;

        let display = &self.config.display;
        let installed = match self.config.format {
            Format::Pretty => try_init_layer!(
                filter,
                fmt::layer()
                    .pretty()
                    .with_ansi(display.colors)
                    .with_target(display.target)
                    .with_file(display.source)
                    .with_line_number(display.source)
                    .with_writer(std::io::stderr),
                display.time
            ),
            Format::Compact => try_init_layer!(
                filter,
                fmt::layer()
                    .compact()
                    .with_ansi(display.colors)
                    .with_target(display.target)
                    .with_file(display.source)
                    .with_line_number(display.source)
                    .with_writer(std::io::stderr),
                display.time
            ),
            Format::Json => try_init_layer!(
                filter,
                fmt::layer()
                    .json()
                    .flatten_event(display.flatten)
                    .with_target(display.target)
                    .with_file(display.source)
                    .with_line_number(display.source)
                    .with_writer(std::io::stderr),
                display.time
            ),
        }
        .is_ok();

        if installed {
            tracing::debug!(
                environment = %self.config.environment,
                level = %self.config.level,
                "logger initialized"
            );
        } else {
            tracing::debug!("global subscriber already set; keeping existing one");
        }

        Ok(LoggerGuard { installed })
    }
}

impl LoggerGuard {
    pub(crate) fn noop() -> Self {
        Self { installed: false }
    }

    /// Returns `true` if this guard's build installed the global subscriber.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.installed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_is_rejected() {
        let config = Config {
            level: "actuate=notalevel".to_string(),
            ..Config::test()
        };
        let err = LoggerBuilder::from_config(config).build().unwrap_err();
        assert!(matches!(err, LogError::Filter(_)));
    }

    #[test]
    fn second_build_keeps_existing_subscriber() {
        let _first = LoggerBuilder::from_config(Config::test()).build().unwrap();
        let second = LoggerBuilder::from_config(Config::test()).build().unwrap();
        assert!(!second.is_installed());
    }
}
