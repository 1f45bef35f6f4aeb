//! Plan/execute/synthesize evaluation
//!
//! Decomposes one evaluation into a generated plan, a per-step analysis pass,
//! and a final synthesized score. The plan stage short-circuits the run on
//! failure; the execute stage accumulates step failures and keeps going, so a
//! flaky call costs one step's analysis rather than the whole run.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::eval::parse::extract_json;
use crate::llm::{CompletionResult, ErrorKind, InvokePolicy, LlmClient, Message, call_llm_safe};
use crate::prompt::{render_executor, render_planner, render_synthesis};

/// A trimmed line counts as a step when it carries a numbered or bulleted
/// prefix: "1. ", "1) ", "- ", "* ".
static STEP_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+[.)]\s+|[-*]\s+)").expect("step prefix regex is valid"));

/// Where in the pipeline an error was recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Plan,
    Step(String),
    Synthesis,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Plan => f.write_str("plan"),
            Stage::Step(step) => write!(f, "step {step:?}"),
            Stage::Synthesis => f.write_str("synthesis"),
        }
    }
}

/// One recorded failure, tagged with the stage (or step) it came from.
#[derive(Debug, Clone, Serialize)]
pub struct StageError {
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
    pub attempts: u32,
}

/// Outcome of the execute stage alone.
#[derive(Debug, Clone)]
pub struct ExecuteOutcome {
    pub ok: bool,
    /// Concatenated "{step}\n{analysis}" blocks, failures included.
    pub content: String,
    pub errors: Vec<StageError>,
}

/// Terminal artifact of one plan/execute/synthesize run.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSolveReport {
    pub ok: bool,
    pub error_kind: Option<ErrorKind>,
    pub error_message: String,
    pub plan: String,
    pub step_analyses: String,
    pub final_raw: String,
    pub final_json: Map<String, Value>,
    pub errors: Vec<StageError>,
}

impl PlanSolveReport {
    fn failed_at_plan(error: StageError) -> Self {
        Self {
            ok: false,
            error_kind: Some(error.kind),
            error_message: error.message.clone(),
            plan: String::new(),
            step_analyses: String::new(),
            final_raw: String::new(),
            final_json: Map::new(),
            errors: vec![error],
        }
    }
}

/// Three-stage evaluator over one safe-invocation client.
pub struct PlanSolveEvaluator {
    client: Arc<dyn LlmClient>,
    policy: InvokePolicy,
}

impl PlanSolveEvaluator {
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

    /// Stage 1: generate the evaluation plan.
    pub async fn plan_result(&self, prompt: &str) -> CompletionResult {
        let messages = vec![Message::user(render_planner(prompt))];
        call_llm_safe(self.client.as_ref(), &messages, &self.policy).await
    }

    /// Split plan text into ordered steps.
    ///
    /// Prefixed lines win; when none match, every non-blank line is a step,
    /// which guarantees at least one step for any non-blank plan.
    pub fn extract_steps(plan: &str) -> Vec<String> {
        let lines: Vec<&str> = plan
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let prefixed: Vec<String> = lines
            .iter()
            .filter(|line| STEP_PREFIX.is_match(line))
            .map(|line| line.to_string())
            .collect();

        if prefixed.is_empty() {
            lines.into_iter().map(str::to_string).collect()
        } else {
            prefixed
        }
    }

    /// Stage 2: analyze every step, tolerating per-step failures.
    pub async fn execute_result(&self, prompt: &str, plan: &str) -> ExecuteOutcome {
        let mut history = Vec::new();
        let mut errors = Vec::new();

        for step in Self::extract_steps(plan) {
            let messages = vec![Message::user(render_executor(prompt, plan, &step))];
            let result = call_llm_safe(self.client.as_ref(), &messages, &self.policy).await;

            history.push(format!("{step}\n{}", result.content));
            if !result.ok {
                tracing::warn!(step = %step, kind = ?result.error_kind, "step analysis failed");
                errors.push(StageError {
                    stage: Stage::Step(step),
                    kind: result.error_kind.unwrap_or(ErrorKind::UnknownError),
                    message: result.error_message,
                    attempts: result.attempts,
                });
            }
        }

        ExecuteOutcome {
            ok: errors.is_empty(),
            content: history.join("\n\n"),
            errors,
        }
    }

    /// Run all three stages and aggregate their outcomes.
    pub async fn evaluate(&self, prompt: &str) -> PlanSolveReport {
        let plan_call = self.plan_result(prompt).await;
        if !plan_call.ok {
            return PlanSolveReport::failed_at_plan(StageError {
                stage: Stage::Plan,
                kind: plan_call.error_kind.unwrap_or(ErrorKind::UnknownError),
                message: plan_call.error_message,
                attempts: plan_call.attempts,
            });
        }
        let plan = plan_call.content;

        let execute = self.execute_result(prompt, &plan).await;
        let step_analyses = execute.content;

        let messages = vec![Message::user(render_synthesis(prompt, &step_analyses))];
        let final_call = call_llm_safe(self.client.as_ref(), &messages, &self.policy).await;
        let final_raw = final_call.content;

        let mut errors = execute.errors;
        if !final_call.ok {
            errors.push(StageError {
                stage: Stage::Synthesis,
                kind: final_call.error_kind.unwrap_or(ErrorKind::UnknownError),
                message: final_call.error_message,
                attempts: final_call.attempts,
            });
        }

        // Synthesis text is decoded even when a stage failed: partial runs
        // still produce whatever score the model managed to emit.
        let final_json = extract_json(&final_raw);

        PlanSolveReport {
            ok: errors.is_empty(),
            error_kind: errors.first().map(|e| e.kind),
            error_message: errors.first().map(|e| e.message.clone()).unwrap_or_default(),
            plan,
            step_analyses,
            final_raw,
            final_json,
            errors,
        }
    }
}
