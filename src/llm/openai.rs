//! OpenAI-compatible chat-completions client
//!
//! Speaks to any endpoint exposing the `/chat/completions` shape. The config
//! is an explicit struct validated at construction; `from_env` is a
//! convenience for the CLI, not an ambient dependency of the client itself.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::error::{Result, RubricError};
use crate::llm::client::{LlmClient, LlmError};
use crate::llm::types::Message;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the chat-completions client
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a config from `LLM_MODEL_ID`, `LLM_API_KEY`, `LLM_BASE_URL` and
    /// optional `LLM_TIMEOUT` (seconds).
    pub fn from_env() -> Result<Self> {
        let model = env::var("LLM_MODEL_ID").unwrap_or_default();
        let api_key = env::var("LLM_API_KEY").unwrap_or_default();
        let base_url = env::var("LLM_BASE_URL").unwrap_or_default();
        let timeout_secs = env::var("LLM_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let config =
            Self::new(model, api_key, base_url).with_timeout(Duration::from_secs(timeout_secs));
        config.validate()?;
        Ok(config)
    }

    /// Fail fast on missing required fields.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.model.trim().is_empty() {
            missing.push("model (LLM_MODEL_ID)");
        }
        if self.api_key.trim().is_empty() {
            missing.push("api key (LLM_API_KEY)");
        }
        if self.base_url.trim().is_empty() {
            missing.push("base url (LLM_BASE_URL)");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RubricError::Config(format!(
                "missing required LLM settings: {}",
                missing.join(", ")
            )))
        }
    }
}

/// Chat-completions API client
pub struct OpenAiClient {
    client: Client,
    config: LlmConfig,
}

impl OpenAiClient {
    /// Create a new client, validating the config eagerly.
    pub fn new(config: LlmConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RubricError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn build_request(&self, messages: &[Message], temperature: f32) -> Value {
        json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": temperature,
            "stream": false,
        })
    }
}

/// Map a non-success HTTP status onto the client fault model.
fn map_status(status: u16, message: String) -> LlmError {
    match status {
        400 => LlmError::BadRequest(message),
        401 => LlmError::Auth(message),
        403 => LlmError::PermissionDenied(message),
        404 => LlmError::NotFound(message),
        422 => LlmError::UnprocessableEntity(message),
        429 => LlmError::RateLimited(message),
        _ => LlmError::ApiStatus { status, message },
    }
}

/// Map a transport-level reqwest failure onto the client fault model.
fn map_send_error(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout(err.to_string())
    } else {
        LlmError::Connection(err.to_string())
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        messages: &[Message],
        temperature: f32,
    ) -> std::result::Result<String, LlmError> {
        let body = self.build_request(messages, temperature);

        tracing::debug!(model = %self.config.model, "sending chat completion request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), message));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("failed to decode body: {e}")))?;

        payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                LlmError::InvalidResponse("response missing choices[0].message.content".to_string())
            })
    }
}
