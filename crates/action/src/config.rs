//! Runtime configuration

use actuate_log::{Environment, Level};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Settings shared by every action run through a [`Runtime`](crate::Runtime).
///
/// Per-action overrides (`log_level`, `log_calls`, default messages) live on
/// the [`ActionBuilder`](crate::ActionBuilder) and win over these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Deployment environment; separators and loud piping errors are only
    /// produced outside production.
    pub environment: Environment,
    /// Level of the "about to execute" and "execution completed" lines.
    pub log_level: Level,
    /// Emit the before/after execution lines at all.
    pub log_calls: bool,
    /// Emit a separator line before top-level runs.
    pub log_separators: bool,
    /// Panic on piping errors instead of logging them, outside production.
    pub raise_piping_errors_outside_production: bool,
    /// Error message used when no rule matches.
    pub default_error: Option<String>,
    /// Success message used when no rule matches.
    pub default_success: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            log_level: Level::Info,
            log_calls: true,
            log_separators: true,
            raise_piping_errors_outside_production: false,
            default_error: None,
            default_success: None,
        }
    }
}

impl RuntimeConfig {
    /// Configuration from the process environment.
    ///
    /// Reads `ACTUATE_ENV`/`APP_ENV`, `ACTUATE_LOG_LEVEL`, `ACTUATE_LOG_CALLS`
    /// and `ACTUATE_RAISE_PIPING_ERRORS`. Unparseable values are logged and
    /// ignored.
    pub fn from_env() -> Self {
        let mut config = Self {
            environment: Environment::detect(),
            ..Self::default()
        };

        if let Ok(raw) = std::env::var("ACTUATE_LOG_LEVEL") {
            match raw.parse() {
                Ok(level) => config.log_level = level,
                Err(error) => warn!(%error, "ignoring ACTUATE_LOG_LEVEL"),
            }
        }
        if let Some(flag) = env_flag("ACTUATE_LOG_CALLS") {
            config.log_calls = flag;
        }
        if let Some(flag) = env_flag("ACTUATE_RAISE_PIPING_ERRORS") {
            config.raise_piping_errors_outside_production = flag;
        }
        config
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    let flag = parse_flag(&raw);
    if flag.is_none() {
        warn!(key, value = %raw, "ignoring unrecognised boolean");
    }
    flag
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.log_level, Level::Info);
        assert!(config.log_calls);
        assert!(config.log_separators);
        assert!(!config.raise_piping_errors_outside_production);
        assert_eq!(config.default_error, None);
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: RuntimeConfig = serde_json::from_str(
            r#"{"environment": "production", "log_level": "debug", "default_error": "Oops"}"#,
        )
        .unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.log_level, Level::Debug);
        assert_eq!(config.default_error.as_deref(), Some("Oops"));
        assert!(config.log_calls);
    }

    #[rstest]
    #[case("1", Some(true))]
    #[case(" TRUE ", Some(true))]
    #[case("off", Some(false))]
    #[case("maybe", None)]
    fn flags(#[case] raw: &str, #[case] expected: Option<bool>) {
        assert_eq!(parse_flag(raw), expected);
    }
}
