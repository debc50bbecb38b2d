//! Process-wide configuration: environment loading and startup validation.
//!
//! No config-file format — environment variables only. Field defaults are
//! applied inline rather than through `serde`, since this struct is never
//! deserialized from JSON; failures collect into a [`thiserror`] enum
//! instead of bare strings.

use std::fmt;

/// Failures that prevent the process from starting at all. Distinct from
/// [`crate::model::SearchError`], which only ever describes a single
/// search request gone wrong. An `AppError` always maps to exit code 1.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),

    #[error("invalid value for environment variable {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_port() -> u16 {
    8088
}

/// Everything read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub brave_api_key: String,
    pub tavily_api_key: Option<String>,
    pub github_api_token: Option<String>,
    pub stackexchange_api_key: Option<String>,
    pub log_level: String,
    /// Read for completeness of the environment contract; the HTTP surface
    /// this would configure is out of scope for this binary.
    pub port: u16,
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "log_level={}, port={}, tavily={}, github={}, stackexchange={}",
            self.log_level,
            self.port,
            self.tavily_api_key.is_some(),
            self.github_api_token.is_some(),
            self.stackexchange_api_key.is_some(),
        )
    }
}

impl Config {
    /// Load from the process environment. Fails iff `BRAVE_API_KEY` is
    /// absent or `PORT` is present but not a valid `u16`.
    pub fn from_env() -> Result<Self, AppError> {
        let brave_api_key =
            std::env::var("BRAVE_API_KEY").map_err(|_| AppError::MissingEnv("BRAVE_API_KEY"))?;

        let port = match std::env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| AppError::InvalidEnv { name: "PORT", value })?,
            Err(_) => default_port(),
        };

        Ok(Self {
            brave_api_key,
            tavily_api_key: std::env::var("TAVILY_API_KEY").ok(),
            github_api_token: std::env::var("GITHUB_API_TOKEN").ok(),
            stackexchange_api_key: std::env::var("STACKEXCHANGE_API_KEY").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| default_log_level()),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialise the tests that
    // touch them so they don't stomp on each other under `cargo test`'s
    // default multi-threaded runner.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in ["BRAVE_API_KEY", "TAVILY_API_KEY", "GITHUB_API_TOKEN", "STACKEXCHANGE_API_KEY", "LOG_LEVEL", "PORT"] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn missing_brave_key_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, AppError::MissingEnv("BRAVE_API_KEY")));
    }

    #[test]
    fn defaults_log_level_and_port() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("BRAVE_API_KEY", "k");
        let config = Config::from_env().unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.port, 8088);
        assert!(config.tavily_api_key.is_none());
        clear_env();
    }

    #[test]
    fn reads_optional_keys_when_present() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("BRAVE_API_KEY", "b");
        std::env::set_var("TAVILY_API_KEY", "t");
        std::env::set_var("PORT", "9090");
        let config = Config::from_env().unwrap();
        assert_eq!(config.tavily_api_key.as_deref(), Some("t"));
        assert_eq!(config.port, 9090);
        clear_env();
    }

    #[test]
    fn invalid_port_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("BRAVE_API_KEY", "b");
        std::env::set_var("PORT", "not-a-port");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, AppError::InvalidEnv { name: "PORT", .. }));
        clear_env();
    }
}
