//! Reflection loop: evaluate, reflect, refine, repeat
//!
//! Each iteration scores the current prompt, asks the model whether that
//! score holds up, and rewrites the prompt from the critique. Two independent
//! stop conditions end the run early: the overall score reaching the target,
//! and the reviewer declaring the evaluation reliable. Any stage failure ends
//! the run with the classified kind in the outcome; exhausting the iteration
//! budget is a normal completion.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::eval::{PromptEvaluator, extract_json, overall_score};
use crate::llm::{ErrorKind, InvokePolicy, LlmClient, Message, call_llm_safe};
use crate::prompt::{RELIABLE_VERDICT, render_reflection, render_refine};
use crate::reflect::memory::{EntryKind, Memory, MemoryEntry};

/// Terminal artifact of one reflection run.
#[derive(Debug, Clone, Serialize)]
pub struct LoopOutcome {
    pub ok: bool,
    pub error_kind: Option<ErrorKind>,
    pub error_message: String,
    pub final_prompt: String,
    pub final_evaluation_raw: String,
    pub final_evaluation_json: Map<String, Value>,
    pub final_feedback: String,
    pub iterations: u32,
    pub memory: Memory,
}

/// Drives the evaluate/reflect/refine cycle over one client.
pub struct ReflectionAgent {
    client: Arc<dyn LlmClient>,
    policy: InvokePolicy,
    max_iterations: u32,
    target_overall: f64,
}

impl ReflectionAgent {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            policy: InvokePolicy::default(),
            max_iterations: 3,
            target_overall: 8.0,
        }
    }

    pub fn with_policy(mut self, policy: InvokePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_target_overall(mut self, target_overall: f64) -> Self {
        self.target_overall = target_overall;
        self
    }

    /// Run the loop to a terminal outcome. The memory log is created here and
    /// handed back inside the outcome; nothing survives between runs.
    pub async fn run(&self, prompt: &str) -> LoopOutcome {
        let evaluator =
            PromptEvaluator::new(self.client.clone()).with_policy(self.policy.clone());

        let mut memory = Memory::new();
        let mut current_prompt = prompt.to_string();
        let mut final_feedback = String::new();
        let mut iterations = 0;
        let mut ok = true;
        let mut error_kind = None;
        let mut error_message = String::new();

        for iteration in 1..=self.max_iterations {
            iterations = iteration;
            tracing::debug!(iteration, "reflection iteration starting");

            let evaluation_call = evaluator.evaluate_result(&current_prompt).await;
            let evaluation_raw = evaluation_call.content.clone();
            let evaluation_json = extract_json(&evaluation_raw);
            memory.push(MemoryEntry::Evaluation {
                prompt: current_prompt.clone(),
                raw: evaluation_raw.clone(),
                json: evaluation_json.clone(),
                call: evaluation_call.clone(),
            });

            if !evaluation_call.ok {
                ok = false;
                error_kind = evaluation_call.error_kind;
                error_message = evaluation_call.error_message;
                final_feedback = format!("Evaluation failed: {}", kind_name(error_kind));
                break;
            }

            let overall = overall_score(&evaluation_json);
            if let Some(score) = overall
                && score >= self.target_overall
            {
                tracing::debug!(iteration, score, "target score reached");
                final_feedback = "Target score reached.".to_string();
                break;
            }

            let messages = vec![Message::user(render_reflection(
                &current_prompt,
                &evaluation_raw,
            ))];
            let feedback_call = call_llm_safe(self.client.as_ref(), &messages, &self.policy).await;
            let feedback = feedback_call.content.clone();
            memory.push(MemoryEntry::Reflection {
                text: feedback.clone(),
                call: feedback_call.clone(),
            });
            final_feedback = feedback.clone();

            if !feedback_call.ok {
                ok = false;
                error_kind = feedback_call.error_kind;
                error_message = feedback_call.error_message;
                final_feedback = format!("Reflection failed: {}", kind_name(error_kind));
                break;
            }

            // The verdict only ends the run when this iteration also produced
            // a usable overall score; the phrase alone is not trusted.
            if feedback.contains(RELIABLE_VERDICT) && overall.is_some() {
                tracing::debug!(iteration, "evaluation judged reliable");
                break;
            }

            let messages = vec![Message::user(render_refine(&current_prompt, &feedback))];
            let refine_call = call_llm_safe(self.client.as_ref(), &messages, &self.policy).await;
            let improved_prompt = refine_call.content.clone();
            memory.push(MemoryEntry::RefinedPrompt {
                text: improved_prompt.clone(),
                call: refine_call.clone(),
            });

            if !refine_call.ok {
                ok = false;
                error_kind = refine_call.error_kind;
                error_message = refine_call.error_message;
                final_feedback = format!("Refinement failed: {}", kind_name(error_kind));
                break;
            }

            let improved_prompt = improved_prompt.trim();
            if improved_prompt.is_empty() {
                // Clean exit: keep the last good prompt.
                break;
            }
            current_prompt = improved_prompt.to_string();
        }

        let (final_evaluation_raw, final_evaluation_json) =
            match memory.last(EntryKind::Evaluation) {
                Some(MemoryEntry::Evaluation { raw, json, .. }) => (raw.clone(), json.clone()),
                _ => (String::new(), Map::new()),
            };

        LoopOutcome {
            ok,
            error_kind,
            error_message,
            final_prompt: current_prompt,
            final_evaluation_raw,
            final_evaluation_json,
            final_feedback,
            iterations,
            memory,
        }
    }
}

fn kind_name(kind: Option<ErrorKind>) -> &'static str {
    kind.map(ErrorKind::as_str).unwrap_or("unknown_error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionResult, LlmError, MockLlmClient};
    use serde_json::json;

    fn agent(mock: MockLlmClient, max_iterations: u32) -> ReflectionAgent {
        ReflectionAgent::new(Arc::new(mock))
            .with_policy(InvokePolicy::immediate())
            .with_max_iterations(max_iterations)
            .with_target_overall(8.0)
    }

    #[tokio::test]
    async fn test_stops_when_target_score_reached() {
        let mock = MockLlmClient::new().with_ok(r#"{"overall": 9, "problems": "minor"}"#);
        let outcome = agent(mock, 3).run("Write quicksort").await;

        assert!(outcome.ok);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.final_feedback, "Target score reached.");
        assert_eq!(outcome.final_evaluation_json["overall"], json!(9));
        assert_eq!(outcome.final_prompt, "Write quicksort");
        assert_eq!(outcome.memory.len(), 1);
    }

    #[tokio::test]
    async fn test_stops_when_evaluation_is_reliable() {
        let mock = MockLlmClient::new()
            .with_ok(r#"{"overall": 6, "problems": "needs constraints"}"#)
            .with_ok("Evaluation is reliable.");
        let outcome = agent(mock, 3).run("Write quicksort").await;

        assert!(outcome.ok);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.final_feedback, "Evaluation is reliable.");
        assert_eq!(outcome.final_evaluation_json["overall"], json!(6));
        assert_eq!(outcome.memory.len(), 2);
    }

    #[tokio::test]
    async fn test_reliable_phrase_without_overall_keeps_refining() {
        // The reflection claims reliability, but the evaluation carried no
        // numeric overall; the loop must refine instead of stopping.
        let mock = MockLlmClient::new()
            .with_ok(r#"{"problems": "no score emitted"}"#)
            .with_ok("Evaluation is reliable.")
            .with_ok("A sharper prompt.")
            .with_ok(r#"{"overall": 9}"#);
        let outcome = agent(mock, 3).run("Write quicksort").await;

        assert!(outcome.ok);
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.final_prompt, "A sharper prompt.");
        assert_eq!(outcome.final_feedback, "Target score reached.");
    }

    #[tokio::test]
    async fn test_respects_max_iterations() {
        let mock = MockLlmClient::new()
            .with_ok(r#"{"overall": 5, "problems": "too vague"}"#)
            .with_ok("Need more detail.")
            .with_ok("Write a typed quicksort and return code only.")
            .with_ok(r#"{"overall": 6, "problems": "still weak constraints"}"#)
            .with_ok("Need stricter output format.")
            .with_ok("Write quicksort with strict JSON output contract.");
        let outcome = agent(mock, 2).run("Write quicksort").await;

        assert!(outcome.ok);
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.final_evaluation_json["overall"], json!(6));
        assert_eq!(
            outcome.final_prompt,
            "Write quicksort with strict JSON output contract."
        );
        assert_eq!(outcome.memory.len(), 6);
    }

    #[tokio::test]
    async fn test_evaluation_failure_is_terminal() {
        let mock = MockLlmClient::new().with_err(LlmError::Auth("bad key".into()));
        let outcome = agent(mock, 3).run("p").await;

        assert!(!outcome.ok);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.error_kind, Some(ErrorKind::AuthError));
        assert_eq!(outcome.final_feedback, "Evaluation failed: auth_error");
        // The failed call is still on record.
        assert_eq!(outcome.memory.len(), 1);
        assert_eq!(outcome.final_evaluation_raw, "");
        assert!(outcome.final_evaluation_json.is_empty());
    }

    #[tokio::test]
    async fn test_reflection_failure_is_terminal() {
        let mock = MockLlmClient::new()
            .with_ok(r#"{"overall": 4}"#)
            .with_err(LlmError::BadRequest("oops".into()));
        let outcome = agent(mock, 3).run("p").await;

        assert!(!outcome.ok);
        assert_eq!(outcome.error_kind, Some(ErrorKind::BadRequest));
        assert_eq!(outcome.final_feedback, "Reflection failed: bad_request");
        assert_eq!(outcome.iterations, 1);
        // Evaluation survives as the final one on record.
        assert_eq!(outcome.final_evaluation_json["overall"], json!(4));
    }

    #[tokio::test]
    async fn test_refinement_failure_is_terminal() {
        let mock = MockLlmClient::new()
            .with_ok(r#"{"overall": 4}"#)
            .with_ok("Could be tighter.")
            .with_err(LlmError::PermissionDenied("no".into()));
        let outcome = agent(mock, 3).run("p").await;

        assert!(!outcome.ok);
        assert_eq!(outcome.error_kind, Some(ErrorKind::PermissionDenied));
        assert_eq!(outcome.final_feedback, "Refinement failed: permission_denied");
        assert_eq!(outcome.final_prompt, "p");
        assert_eq!(outcome.memory.len(), 3);
    }

    #[tokio::test]
    async fn test_blank_refinement_is_a_clean_exit() {
        // A policy-capable client can legitimately return ok with blank
        // content; the loop keeps the last good prompt and exits cleanly.
        struct Scripted {
            steps: std::sync::Mutex<std::collections::VecDeque<CompletionResult>>,
        }

        #[async_trait::async_trait]
        impl LlmClient for Scripted {
            async fn complete(
                &self,
                _messages: &[Message],
                _temperature: f32,
            ) -> std::result::Result<String, LlmError> {
                unreachable!("policy surface covers all calls");
            }

            async fn complete_with_policy(
                &self,
                _messages: &[Message],
                _policy: &InvokePolicy,
            ) -> Option<CompletionResult> {
                self.steps.lock().unwrap().pop_front()
            }
        }

        let scripted = Scripted {
            steps: std::sync::Mutex::new(
                vec![
                    CompletionResult::success(r#"{"overall": 5}"#, 1),
                    CompletionResult::success("Make it stricter.", 1),
                    CompletionResult {
                        ok: true,
                        content: "   ".to_string(),
                        error_kind: None,
                        error_message: String::new(),
                        attempts: 1,
                    },
                ]
                .into(),
            ),
        };

        let outcome = ReflectionAgent::new(Arc::new(scripted))
            .with_policy(InvokePolicy::immediate())
            .with_max_iterations(3)
            .run("Keep me")
            .await;

        assert!(outcome.ok);
        assert!(outcome.error_kind.is_none());
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.final_prompt, "Keep me");
        assert_eq!(outcome.memory.len(), 3);
    }
}
