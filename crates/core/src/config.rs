//! Configuration management for the Trek client

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix, e.g. `TREK_API__BASE_URL`
pub const ENV_PREFIX: &str = "TREK";

/// Main client configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrekConfig {
    /// Backend API configuration
    pub api: ApiConfig,

    /// Session refresh and idle policy
    pub session: SessionPolicyConfig,

    /// Navigation targets used by the route guard
    pub routes: RoutesConfig,

    /// Log output configuration
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

/// Session refresh and idle policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionPolicyConfig {
    /// Activity after this much quiet time triggers a silent refresh
    pub refresh_after_secs: u64,

    /// No activity for this long logs the session out
    pub idle_timeout_secs: u64,
}

/// Redirect targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    pub login_path: String,
    pub home_path: String,
}

/// Log output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info", "trek_session=debug")
    pub level: String,

    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:6969/api".to_string(),
            timeout_secs: 30,
            user_agent: concat!("trek-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for SessionPolicyConfig {
    fn default() -> Self {
        Self {
            refresh_after_secs: 5 * 60,
            idle_timeout_secs: 60 * 60,
        }
    }
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            home_path: "/".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ApiConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SessionPolicyConfig {
    pub const fn refresh_after(&self) -> Duration {
        Duration::from_secs(self.refresh_after_secs)
    }

    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl TrekConfig {
    /// Load configuration from an optional file layered under `TREK_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed, a value has the wrong type,
    /// or the resulting configuration fails validation
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file only
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidConfig` describing the first offending value
    pub fn validate(&self) -> CoreResult<()> {
        url::Url::parse(&self.api.base_url).map_err(|e| {
            CoreError::invalid_config(format!("api.base_url {:?}: {e}", self.api.base_url))
        })?;

        if self.session.idle_timeout_secs == 0 {
            return Err(CoreError::invalid_config(
                "session.idle_timeout_secs must be greater than zero",
            ));
        }

        if self.session.refresh_after_secs >= self.session.idle_timeout_secs {
            return Err(CoreError::invalid_config(format!(
                "session.refresh_after_secs ({}) must be shorter than session.idle_timeout_secs ({})",
                self.session.refresh_after_secs, self.session.idle_timeout_secs
            )));
        }

        for (key, value) in [
            ("routes.login_path", &self.routes.login_path),
            ("routes.home_path", &self.routes.home_path),
        ] {
            if !value.starts_with('/') {
                return Err(CoreError::invalid_config(format!(
                    "{key} must be an absolute path, got {value:?}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(extension: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(extension)
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_match_session_policy() {
        let config = TrekConfig::default();
        assert_eq!(config.session.refresh_after(), Duration::from_secs(300));
        assert_eq!(config.session.idle_timeout(), Duration::from_secs(3600));
        assert_eq!(config.routes.login_path, "/login");
        assert_eq!(config.routes.home_path, "/");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config(
            ".toml",
            r#"
[api]
base_url = "https://api.teenytechtrek.com/api"

[session]
idle_timeout_secs = 1800
"#,
        );

        let config = TrekConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api.base_url, "https://api.teenytechtrek.com/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.session.idle_timeout_secs, 1800);
        assert_eq!(config.session.refresh_after_secs, 300);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_yaml_file() {
        let file = write_config(
            ".yaml",
            "routes:\n  login_path: /signin\nlogging:\n  json: true\n",
        );

        let config = TrekConfig::from_file(file.path()).unwrap();
        assert_eq!(config.routes.login_path, "/signin");
        assert_eq!(config.routes.home_path, "/");
        assert!(config.logging.json);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = TrekConfig::default();
        config.api.base_url = "not a url".into();
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_refresh_must_be_shorter_than_idle() {
        let mut config = TrekConfig::default();
        config.session.refresh_after_secs = 7200;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("refresh_after_secs"));
    }

    #[test]
    fn test_relative_route_rejected() {
        let mut config = TrekConfig::default();
        config.routes.home_path = "home".into();
        assert!(config.validate().is_err());
    }
}
