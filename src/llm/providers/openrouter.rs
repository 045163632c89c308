//! OpenRouter provider implementation.
//!
//! OpenRouter exposes many model vendors behind one OpenAI-compatible
//! chat-completions endpoint, so every debate role can use a different model
//! through the same client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::JuryConfig;
use crate::error::LlmError;
use crate::llm::{GenerationRequest, GenerationResponse, LlmProvider};

/// Default OpenRouter API endpoint.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Request timeout. Reasoning models can take minutes to answer.
pub const REQUEST_TIMEOUT_SECS: u64 = 600;

const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Idle connections kept per host in the shared pool.
const POOL_MAX_IDLE_PER_HOST: usize = 32;

const DEFAULT_SITE_URL: &str = "http://localhost:8501";
const DEFAULT_APP_NAME: &str = "TheJuryAI";

/// OpenRouter provider for LLM requests.
///
/// Holds one pooled `reqwest::Client`; construct it once per process and share
/// it behind an `Arc<dyn LlmProvider>`.
pub struct OpenRouterProvider {
    /// HTTP client (connection pool) for API requests.
    client: Client,
    /// API key for OpenRouter authentication.
    api_key: String,
    /// Base URL for the OpenRouter API.
    base_url: String,
    /// Sent as `HTTP-Referer` for OpenRouter app attribution.
    site_url: String,
    /// Sent as `X-Title` for OpenRouter app attribution.
    app_name: String,
}

impl OpenRouterProvider {
    /// Create a new provider against the public OpenRouter endpoint.
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Self::with_custom_url(api_key, OPENROUTER_BASE_URL.to_string())
    }

    /// Create a new provider with a custom base URL.
    ///
    /// Useful for testing or OpenRouter-compatible proxies.
    pub fn with_custom_url(api_key: String, base_url: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_client(Duration::from_secs(REQUEST_TIMEOUT_SECS))?,
            api_key,
            base_url,
            site_url: DEFAULT_SITE_URL.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
        })
    }

    /// Create a provider from the resolved application configuration.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` when no key is configured.
    pub fn from_config(config: &JuryConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().ok_or(LlmError::MissingApiKey)?;

        Ok(Self {
            client: build_client(config.request_timeout)?,
            api_key,
            base_url: config.base_url.clone(),
            site_url: config.site_url.clone(),
            app_name: config.app_name.clone(),
        })
    }

    /// Set the attribution headers sent with every request.
    pub fn with_attribution(
        mut self,
        site_url: impl Into<String>,
        app_name: impl Into<String>,
    ) -> Self {
        self.site_url = site_url.into();
        self.app_name = app_name.into();
        self
    }

    /// Get the API key (for debugging, returns masked value).
    pub fn api_key_masked(&self) -> String {
        if self.api_key.len() <= 8 {
            "*".repeat(self.api_key.len())
        } else {
            format!(
                "{}...{}",
                &self.api_key[..4],
                &self.api_key[self.api_key.len() - 4..]
            )
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a single request (no retry logic).
    async fn execute_request(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let http_response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.app_name)
            .json(request)
            .send()
            .await
            .map_err(LlmError::from)?;

        let status = http_response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            let message = serde_json::from_str::<ApiErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);

            return Err(LlmError::Api {
                code: status_code,
                message,
            });
        }

        let body = http_response
            .text()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to read response body: {}", e)))?;

        // OpenRouter can answer 200 with an error object when the upstream
        // vendor rejects the request.
        if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(&body) {
            return Err(LlmError::Api {
                code: error_response.error.status_code(),
                message: error_response.error.message,
            });
        }

        serde_json::from_str::<GenerationResponse>(&body)
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))
    }
}

fn build_client(timeout: Duration) -> Result<Client, LlmError> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .build()
        .map_err(|e| LlmError::ClientBuild(e.to_string()))
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending OpenRouter request"
        );
        self.execute_request(&request).await
    }
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

/// Error detail from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    /// Numeric HTTP-like code, or a vendor string such as `rate_limited`.
    #[serde(default)]
    code: Option<serde_json::Value>,
}

impl ApiErrorDetail {
    /// Numeric codes pass through; anything else is reported as 502.
    fn status_code(&self) -> u16 {
        self.code
            .as_ref()
            .and_then(|code| code.as_u64())
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or(502)
    }
}
