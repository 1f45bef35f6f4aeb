//! Safe invocation layer: classification, bounded retries, backoff
//!
//! `call_llm_safe` is the sole path by which the evaluators talk to the
//! model. Faults never propagate past it; every call collapses into a
//! `CompletionResult`. Transient kinds are retried with exponential backoff,
//! client-caused kinds fail immediately.

use std::time::Duration;

use crate::llm::client::{LlmClient, LlmError};
use crate::llm::types::{CompletionResult, ErrorKind, InvokePolicy};
use crate::llm::Message;

/// Map a client fault onto the closed error-kind taxonomy.
///
/// Total function: anything unrecognized lands on `UnknownError` instead of
/// propagating. A generic status fault is a `ServerError` when the carried
/// status is >= 500, otherwise an `ApiStatusError`.
pub fn classify(err: &LlmError) -> ErrorKind {
    match err {
        LlmError::Timeout(_) => ErrorKind::Timeout,
        LlmError::RateLimited(_) => ErrorKind::RateLimit,
        LlmError::Connection(_) => ErrorKind::ConnectionError,
        LlmError::Auth(_) => ErrorKind::AuthError,
        LlmError::BadRequest(_) => ErrorKind::BadRequest,
        LlmError::PermissionDenied(_) => ErrorKind::PermissionDenied,
        LlmError::NotFound(_) => ErrorKind::NotFound,
        LlmError::UnprocessableEntity(_) => ErrorKind::UnprocessableEntity,
        LlmError::ApiStatus { status, .. } => {
            if *status >= 500 {
                ErrorKind::ServerError
            } else {
                ErrorKind::ApiStatusError
            }
        }
        LlmError::InvalidResponse(_) => ErrorKind::UnknownError,
    }
}

/// Backoff before the retry that follows `attempt`: base * 2^(attempt-1).
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt.saturating_sub(1))
}

/// One safe LLM call: up to `max_retries + 1` attempts, kind-aware retry
/// gating, exponential backoff between attempts.
///
/// Clients that expose their own unified-result surface are trusted with
/// retrying; their result is only normalized here. The backoff sleep blocks
/// the calling task — nothing else proceeds on this invocation until it
/// completes.
pub async fn call_llm_safe(
    client: &dyn LlmClient,
    messages: &[Message],
    policy: &InvokePolicy,
) -> CompletionResult {
    if let Some(result) = client.complete_with_policy(messages, policy).await {
        return result.normalized();
    }

    let mut last_failure =
        CompletionResult::failure(ErrorKind::UnknownError, "Unknown failure.", 1);

    for attempt in 1..=policy.max_retries + 1 {
        match client.complete(messages, policy.temperature).await {
            Ok(content) => {
                let trimmed = content.trim();
                if !trimmed.is_empty() {
                    tracing::debug!(attempt, "LLM call succeeded");
                    return CompletionResult::success(trimmed, attempt);
                }
                last_failure = CompletionResult::failure(
                    ErrorKind::EmptyResponse,
                    "LLM returned empty content.",
                    attempt,
                );
            }
            Err(err) => {
                last_failure = CompletionResult::failure(classify(&err), err.to_string(), attempt);
            }
        }

        let kind = last_failure
            .error_kind
            .unwrap_or(ErrorKind::UnknownError);
        if attempt <= policy.max_retries && kind.is_retryable() {
            let delay = backoff_delay(policy.base_backoff, attempt);
            tracing::warn!(
                attempt,
                kind = %kind,
                delay_ms = delay.as_millis() as u64,
                "LLM call failed, backing off before retry"
            );
            tokio::time::sleep(delay).await;
        } else {
            break;
        }
    }

    last_failure
}
