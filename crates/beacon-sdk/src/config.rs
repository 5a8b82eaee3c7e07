//! Client configuration and environment normalisation.

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Default collector base URL when neither the options nor the environment
/// provide one.
pub const DEFAULT_COLLECTOR_URL: &str = "https://ingest.beacon.dev";

/// Environment variable overriding the collector base URL.
pub const COLLECTOR_URL_ENV: &str = "BEACON_COLLECTOR_URL";

/// Environment variable supplying the deployment environment name when the
/// host does not pass one explicitly.
pub const ENVIRONMENT_ENV: &str = "BEACON_ENVIRONMENT";

/// Deployment environment tag attached to every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production deployment.
    Production,
    /// Anything that is not production.
    Preview,
}

impl Environment {
    /// Normalise an environment name.
    ///
    /// `"production"` and `"prod"` (case-insensitively, surrounding
    /// whitespace ignored) map to [`Environment::Production`]; everything
    /// else, including absence, maps to [`Environment::Preview`].
    #[must_use]
    pub fn parse(name: Option<&str>) -> Self {
        match name {
            Some(name) => {
                let normalised = name.trim().to_ascii_lowercase();
                if normalised == "production" || normalised == "prod" {
                    Self::Production
                } else {
                    Self::Preview
                }
            }
            None => Self::Preview,
        }
    }

    /// String form as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Preview => "preview",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options accepted by [`crate::init`] and [`crate::Client::new`].
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// API key identifying the project at the collector. Required; an empty
    /// key refuses initialisation.
    pub api_key: String,
    /// Deployment environment name. Falls back to the `BEACON_ENVIRONMENT`
    /// environment variable, then to preview.
    pub environment: Option<String>,
    /// Collector base URL. Falls back to `BEACON_COLLECTOR_URL`, then to
    /// [`DEFAULT_COLLECTOR_URL`].
    pub collector_url: Option<String>,
    /// Enable the SDK's own debug logging.
    pub debug: bool,
}

impl Options {
    /// Create options with the given API key and defaults for the rest.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Set the environment name.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Set the collector base URL.
    #[must_use]
    pub fn with_collector_url(mut self, url: impl Into<String>) -> Self {
        self.collector_url = Some(url.into());
        self
    }

    /// Enable or disable debug logging.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) api_key: SecretString,
    pub(crate) environment: Environment,
    pub(crate) collector_url: String,
}

impl ClientConfig {
    /// Resolve options against the process environment.
    ///
    /// Refuses to resolve without an API key.
    pub fn resolve(options: &Options) -> SdkResult<Self> {
        if options.api_key.trim().is_empty() {
            return Err(SdkError::config("API key is required"));
        }

        let environment_name = options
            .environment
            .clone()
            .or_else(|| std::env::var(ENVIRONMENT_ENV).ok());
        let collector_url = options
            .collector_url
            .clone()
            .or_else(|| std::env::var(COLLECTOR_URL_ENV).ok())
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COLLECTOR_URL.to_owned());

        Ok(Self {
            api_key: SecretString::from(options.api_key.clone()),
            environment: Environment::parse(environment_name.as_deref()),
            collector_url: collector_url.trim().trim_end_matches('/').to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_names_normalise() {
        assert_eq!(Environment::parse(Some("production")), Environment::Production);
        assert_eq!(Environment::parse(Some("PROD")), Environment::Production);
        assert_eq!(Environment::parse(Some("  Production ")), Environment::Production);
    }

    #[test]
    fn everything_else_is_preview() {
        assert_eq!(Environment::parse(Some("staging")), Environment::Preview);
        assert_eq!(Environment::parse(Some("preview")), Environment::Preview);
        assert_eq!(Environment::parse(Some("")), Environment::Preview);
        assert_eq!(Environment::parse(None), Environment::Preview);
    }

    #[test]
    fn empty_api_key_is_refused() {
        let err = ClientConfig::resolve(&Options::new("   ")).unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn collector_url_trailing_slash_is_trimmed() {
        let options = Options::new("key").with_collector_url("http://example.test/");
        let config = ClientConfig::resolve(&options).unwrap();
        assert_eq!(config.collector_url, "http://example.test");
    }

    #[test]
    fn explicit_environment_wins() {
        let options = Options::new("key")
            .with_environment("prod")
            .with_collector_url("http://example.test");
        let config = ClientConfig::resolve(&options).unwrap();
        assert_eq!(config.environment, Environment::Production);
    }
}
