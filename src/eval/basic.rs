//! Single-shot prompt evaluation

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::eval::parse::extract_json;
use crate::llm::{CompletionResult, InvokePolicy, LlmClient, Message, call_llm_safe};
use crate::prompt::render_evaluation;

/// Scores a prompt with one safe LLM call against the evaluation template.
pub struct PromptEvaluator {
    client: Arc<dyn LlmClient>,
    policy: InvokePolicy,
}

impl PromptEvaluator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            policy: InvokePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: InvokePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Full structured outcome of one evaluation call.
    pub async fn evaluate_result(&self, prompt: &str) -> CompletionResult {
        let messages = vec![Message::user(render_evaluation(prompt))];
        call_llm_safe(self.client.as_ref(), &messages, &self.policy).await
    }

    /// Raw evaluation text; empty when the call failed.
    pub async fn evaluate(&self, prompt: &str) -> String {
        self.evaluate_result(prompt).await.content
    }

    /// Decoded evaluation object, best-effort.
    pub async fn evaluate_as_json(&self, prompt: &str) -> Map<String, Value> {
        extract_json(&self.evaluate(prompt).await)
    }
}
