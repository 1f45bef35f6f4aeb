//! LLM client trait and fault model
//!
//! Everything above this layer talks to the model through `LlmClient`. The
//! trait has two surfaces: the baseline `complete` that returns raw text or a
//! distinct fault, and an optional `complete_with_policy` for providers that
//! already run their own retry/backoff and hand back a unified result. The
//! safe invoker checks the richer surface first and falls back to driving
//! `complete` itself.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::types::{CompletionResult, InvokePolicy, Message};

/// Faults a completion client can raise.
///
/// One variant per provider fault the classifier distinguishes, plus
/// `InvalidResponse` for bodies the client could not make sense of.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("API error {status}: {message}")]
    ApiStatus { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Stateless LLM client - each call is independent (fresh context)
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request, returning the generated text.
    async fn complete(
        &self,
        messages: &[Message],
        temperature: f32,
    ) -> std::result::Result<String, LlmError>;

    /// Unified-result surface for clients that own their retry policy.
    ///
    /// Returns `None` when the client has no such capability; the safe
    /// invoker then runs its own retry loop over `complete`.
    async fn complete_with_policy(
        &self,
        messages: &[Message],
        policy: &InvokePolicy,
    ) -> Option<CompletionResult> {
        let _ = (messages, policy);
        None
    }
}

/// Scripted client for tests: pops one queued step per `complete` call.
pub struct MockLlmClient {
    script: Mutex<VecDeque<std::result::Result<String, LlmError>>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response.
    pub fn with_ok(self, content: impl Into<String>) -> Self {
        self.script
            .lock()
            .expect("mock script lock poisoned")
            .push_back(Ok(content.into()));
        self
    }

    /// Queue a raised fault.
    pub fn with_err(self, err: LlmError) -> Self {
        self.script
            .lock()
            .expect("mock script lock poisoned")
            .push_back(Err(err));
        self
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock calls lock poisoned").len()
    }

    /// Messages passed to the nth call.
    pub fn call_messages(&self, n: usize) -> Option<Vec<Message>> {
        self.calls
            .lock()
            .expect("mock calls lock poisoned")
            .get(n)
            .cloned()
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        messages: &[Message],
        _temperature: f32,
    ) -> std::result::Result<String, LlmError> {
        self.calls
            .lock()
            .expect("mock calls lock poisoned")
            .push(messages.to_vec());
        self.script
            .lock()
            .expect("mock script lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("mock script exhausted".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_pops_script_in_order() {
        let mock = MockLlmClient::new()
            .with_ok("first")
            .with_err(LlmError::Timeout("slow".to_string()))
            .with_ok("third");

        let messages = vec![Message::user("hi")];
        assert_eq!(mock.complete(&messages, 0.0).await.unwrap(), "first");
        assert!(matches!(
            mock.complete(&messages, 0.0).await,
            Err(LlmError::Timeout(_))
        ));
        assert_eq!(mock.complete(&messages, 0.0).await.unwrap(), "third");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_exhausted_script_raises() {
        let mock = MockLlmClient::new();
        let result = mock.complete(&[Message::user("hi")], 0.0).await;
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_mock_records_messages() {
        let mock = MockLlmClient::new().with_ok("ok");
        mock.complete(&[Message::user("what gives")], 0.0).await.unwrap();
        let recorded = mock.call_messages(0).unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].content, "what gives");
    }

    #[tokio::test]
    async fn test_default_policy_capability_is_absent() {
        let mock = MockLlmClient::new();
        let result = mock
            .complete_with_policy(&[Message::user("hi")], &InvokePolicy::default())
            .await;
        assert!(result.is_none());
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::ApiStatus {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "API error 503: overloaded");
    }
}
