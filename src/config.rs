//! Runtime configuration for the jury.
//!
//! Values come from defaults, then environment variables, then CLI flags
//! (applied by the CLI through the `with_*` builders).

use std::time::Duration;
use thiserror::Error;

use crate::llm::cost::DEFAULT_COST_PER_MILLION_TOKENS;
use crate::llm::providers::openrouter::{OPENROUTER_BASE_URL, REQUEST_TIMEOUT_SECS};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Resolved configuration for the model client and the case store.
#[derive(Debug, Clone)]
pub struct JuryConfig {
    /// OpenRouter API key. Only required for commands that call a model.
    pub api_key: Option<String>,
    /// Chat-completions base URL.
    pub base_url: String,
    /// Attribution URL sent as `HTTP-Referer`.
    pub site_url: String,
    /// Attribution name sent as `X-Title`.
    pub app_name: String,
    /// Case store connection URL.
    pub database_url: String,
    /// Per-request timeout for model calls.
    pub request_timeout: Duration,
    /// Dollars per one million tokens.
    pub cost_per_million_tokens: f64,
}

impl Default for JuryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: OPENROUTER_BASE_URL.to_string(),
            site_url: "http://localhost:8501".to_string(),
            app_name: "TheJuryAI".to_string(),
            database_url: "sqlite://jury.db".to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            cost_per_million_tokens: DEFAULT_COST_PER_MILLION_TOKENS,
        }
    }
}

impl JuryConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENROUTER_API_KEY`: API key (optional here, checked when a model is called)
    /// - `OPENROUTER_BASE_URL`: endpoint base URL (default: OpenRouter v1)
    /// - `OR_SITE_URL`: attribution URL (default: http://localhost:8501)
    /// - `OR_APP_NAME`: attribution name (default: TheJuryAI)
    /// - `JURY_DATABASE_URL`: case store URL (default: sqlite://jury.db)
    /// - `JURY_REQUEST_TIMEOUT_SECS`: model request timeout (default: 600)
    /// - `JURY_COST_PER_MILLION`: dollars per million tokens (default: 2.00)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("OPENROUTER_API_KEY") {
            if !val.trim().is_empty() {
                config.api_key = Some(val);
            }
        }

        if let Ok(val) = std::env::var("OPENROUTER_BASE_URL") {
            config.base_url = val;
        }

        if let Ok(val) = std::env::var("OR_SITE_URL") {
            config.site_url = val;
        }

        if let Ok(val) = std::env::var("OR_APP_NAME") {
            config.app_name = val;
        }

        if let Ok(val) = std::env::var("JURY_DATABASE_URL") {
            config.database_url = val;
        }

        if let Ok(val) = std::env::var("JURY_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_env_value(&val, "JURY_REQUEST_TIMEOUT_SECS")?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Ok(val) = std::env::var("JURY_COST_PER_MILLION") {
            config.cost_per_million_tokens = parse_env_value(&val, "JURY_COST_PER_MILLION")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "base_url cannot be empty".to_string(),
            ));
        }

        if self.database_url.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "database_url cannot be empty".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if !self.cost_per_million_tokens.is_finite() || self.cost_per_million_tokens < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "cost_per_million_tokens must be a non-negative number".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns the API key or `MissingEnvVar` when none is configured.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENROUTER_API_KEY".to_string()))
    }

    /// Builder method to set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Builder method to set the endpoint base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Builder method to set the case store URL.
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    /// Builder method to set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builder method to set the token rate.
    pub fn with_cost_per_million_tokens(mut self, rate: f64) -> Self {
        self.cost_per_million_tokens = rate;
        self
    }
}

fn parse_env_value<T: std::str::FromStr>(val: &str, key: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    val.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}
