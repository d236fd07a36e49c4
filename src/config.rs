//! Application configuration.
//!
//! All remote endpoint and credential configuration arrives via process
//! environment, read exactly once at startup by [`Settings::from_env`].
//! Everything downstream receives the resulting value; no other component
//! reads global state.

use std::path::PathBuf;
use std::time::Duration;

/// Default API host, used when `DATADOG_HOST` is unset.
pub const DEFAULT_HOST: &str = "https://app.datadoghq.com";

/// Default per-request HTTP timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Retry elapsed-time budget, as a multiple of the request timeout.
const RETRY_BUDGET_FACTOR: u32 = 5;

/// Upper bound on the per-request timeout, in seconds. Keeps the retry
/// budget multiplication from overflowing and catches nonsense values.
const MAX_TIMEOUT_SECS: u64 = 3600;

/// Errors constructing settings from the environment.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("Required environment variable {0} is not set")]
    MissingVar(&'static str),

    /// An environment variable is set but unusable.
    #[error("Environment variable {name} has an invalid value: {value}")]
    InvalidVar {
        /// The variable's name
        name: &'static str,
        /// The offending value
        value: String,
    },
}

/// Document root and cache location for one board kind.
#[derive(Debug, Clone)]
pub struct KindPaths {
    /// Directory scanned for document files.
    pub root: PathBuf,
    /// Location of the fingerprint cache for this kind.
    pub cache: PathBuf,
}

/// Everything the application needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Datadog API key, sent as the `api_key` query parameter.
    pub api_key: String,
    /// Datadog application key, sent as the `application_key` query parameter.
    pub app_key: String,
    /// Base URL of the remote service.
    pub host: String,
    /// Paths for dashboard documents.
    pub dashboards: KindPaths,
    /// Paths for screenboard documents.
    pub screenboards: KindPaths,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Total elapsed-time budget for retried (read-only) calls.
    pub retry_timeout: Duration,
}

impl Settings {
    /// Build settings from the process environment.
    ///
    /// Required: `DATADOG_API_KEY`, `DATADOG_APP_KEY`, `BOARDSYNC_DASH_DIR`,
    /// `BOARDSYNC_DASH_CACHE`, `BOARDSYNC_SCREEN_DIR`,
    /// `BOARDSYNC_SCREEN_CACHE`. Optional: `DATADOG_HOST`,
    /// `BOARDSYNC_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env), with an injectable lookup so
    /// tests don't have to mutate the process environment.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| lookup(name).filter(|v| !v.is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::MissingVar(name));

        let timeout_secs = match get("BOARDSYNC_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if (1..=MAX_TIMEOUT_SECS).contains(&secs) => secs,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        name: "BOARDSYNC_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };
        let request_timeout = Duration::from_secs(timeout_secs);

        Ok(Self {
            api_key: require("DATADOG_API_KEY")?,
            app_key: require("DATADOG_APP_KEY")?,
            host: get("DATADOG_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            dashboards: KindPaths {
                root: require("BOARDSYNC_DASH_DIR")?.into(),
                cache: require("BOARDSYNC_DASH_CACHE")?.into(),
            },
            screenboards: KindPaths {
                root: require("BOARDSYNC_SCREEN_DIR")?.into(),
                cache: require("BOARDSYNC_SCREEN_CACHE")?.into(),
            },
            request_timeout,
            retry_timeout: request_timeout * RETRY_BUDGET_FACTOR,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATADOG_API_KEY", "api"),
            ("DATADOG_APP_KEY", "app"),
            ("BOARDSYNC_DASH_DIR", "/srv/boards/dash"),
            ("BOARDSYNC_DASH_CACHE", "/var/cache/boardsync/dash.db"),
            ("BOARDSYNC_SCREEN_DIR", "/srv/boards/screen"),
            ("BOARDSYNC_SCREEN_CACHE", "/var/cache/boardsync/screen.db"),
        ])
    }

    fn from_map(env: &HashMap<&'static str, &'static str>) -> Result<Settings, ConfigError> {
        Settings::from_lookup(|name| env.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn test_full_environment_parses_with_defaults() {
        let settings = from_map(&full_env()).unwrap();
        assert_eq!(settings.host, DEFAULT_HOST);
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert_eq!(settings.retry_timeout, Duration::from_secs(50));
        assert_eq!(settings.dashboards.root, PathBuf::from("/srv/boards/dash"));
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let mut env = full_env();
        env.remove("DATADOG_API_KEY");
        assert_eq!(
            from_map(&env).unwrap_err(),
            ConfigError::MissingVar("DATADOG_API_KEY")
        );
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut env = full_env();
        env.insert("DATADOG_APP_KEY", "");
        assert_eq!(
            from_map(&env).unwrap_err(),
            ConfigError::MissingVar("DATADOG_APP_KEY")
        );
    }

    #[test]
    fn test_host_override() {
        let mut env = full_env();
        env.insert("DATADOG_HOST", "https://dd.example.com");
        let settings = from_map(&env).unwrap();
        assert_eq!(settings.host, "https://dd.example.com");
    }

    #[test]
    fn test_timeout_override_scales_retry_budget() {
        let mut env = full_env();
        env.insert("BOARDSYNC_TIMEOUT_SECS", "4");
        let settings = from_map(&env).unwrap();
        assert_eq!(settings.request_timeout, Duration::from_secs(4));
        assert_eq!(settings.retry_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_invalid_timeout_is_an_error() {
        let mut env = full_env();
        env.insert("BOARDSYNC_TIMEOUT_SECS", "soon");
        assert!(matches!(
            from_map(&env),
            Err(ConfigError::InvalidVar {
                name: "BOARDSYNC_TIMEOUT_SECS",
                ..
            })
        ));
    }

    #[test]
    fn test_out_of_range_timeout_is_an_error() {
        for bad in ["0", "3601", "18446744073709551615"] {
            let mut env = full_env();
            env.insert("BOARDSYNC_TIMEOUT_SECS", bad);
            assert!(
                matches!(
                    from_map(&env),
                    Err(ConfigError::InvalidVar {
                        name: "BOARDSYNC_TIMEOUT_SECS",
                        ..
                    })
                ),
                "value {:?} should be rejected",
                bad
            );
        }
    }
}
