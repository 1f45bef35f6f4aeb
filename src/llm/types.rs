//! LLM wire and result types
//!
//! Messages sent to the chat-completions endpoint, the closed error-kind
//! taxonomy, and the unified `CompletionResult` every call collapses into.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Closed taxonomy of call failure kinds.
///
/// Ten kinds mirror provider faults; `EmptyResponse` and `UnknownError` are
/// synthetic kinds for cases the provider's fault model doesn't cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    RateLimit,
    ConnectionError,
    AuthError,
    BadRequest,
    PermissionDenied,
    NotFound,
    UnprocessableEntity,
    ServerError,
    ApiStatusError,
    EmptyResponse,
    UnknownError,
}

impl ErrorKind {
    /// Whether a failed attempt of this kind is worth retrying.
    ///
    /// Only kinds plausibly caused by transient network/load conditions or a
    /// momentarily empty generation retry; client-caused faults never do.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout
                | ErrorKind::RateLimit
                | ErrorKind::ConnectionError
                | ErrorKind::ServerError
                | ErrorKind::EmptyResponse
                | ErrorKind::UnknownError
        )
    }

    /// Stable snake_case name, as printed by the CLI and serialized to JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::ConnectionError => "connection_error",
            ErrorKind::AuthError => "auth_error",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UnprocessableEntity => "unprocessable_entity",
            ErrorKind::ServerError => "server_error",
            ErrorKind::ApiStatusError => "api_status_error",
            ErrorKind::EmptyResponse => "empty_response",
            ErrorKind::UnknownError => "unknown_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified outcome of one safe LLM invocation.
///
/// `attempts` is the 1-based index of the attempt that produced the terminal
/// outcome, success or final failure — not a retry count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResult {
    pub ok: bool,
    pub content: String,
    pub error_kind: Option<ErrorKind>,
    pub error_message: String,
    pub attempts: u32,
}

impl CompletionResult {
    /// Successful completion with trimmed content.
    pub fn success(content: impl Into<String>, attempts: u32) -> Self {
        Self {
            ok: true,
            content: content.into(),
            error_kind: None,
            error_message: String::new(),
            attempts,
        }
    }

    /// Failed completion of the given kind.
    pub fn failure(kind: ErrorKind, message: impl Into<String>, attempts: u32) -> Self {
        Self {
            ok: false,
            content: String::new(),
            error_kind: Some(kind),
            error_message: message.into(),
            attempts,
        }
    }

    /// Enforce the result invariants on a client-produced value.
    ///
    /// `ok=false` implies empty content, and `attempts` is at least 1. Results
    /// built through `success`/`failure` already hold these; this guards
    /// values returned by a client's own `complete_with_policy`.
    pub fn normalized(mut self) -> Self {
        if !self.ok {
            self.content.clear();
        }
        if self.attempts == 0 {
            self.attempts = 1;
        }
        self
    }
}

/// Knobs for one safe invocation: sampling temperature plus the retry policy.
#[derive(Debug, Clone)]
pub struct InvokePolicy {
    pub temperature: f32,
    /// Retries after the first attempt; total attempts = max_retries + 1.
    pub max_retries: u32,
    /// Backoff before retry n is base_backoff * 2^(n-1).
    pub base_backoff: Duration,
}

impl Default for InvokePolicy {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_retries: 2,
            base_backoff: Duration::from_millis(500),
        }
    }
}

impl InvokePolicy {
    /// Policy with no backoff delay, for tests and latency-sensitive callers.
    pub fn immediate() -> Self {
        Self {
            base_backoff: Duration::ZERO,
            ..Self::default()
        }
    }
}
