//! Evaluators - single-shot scoring and plan/execute/synthesize
//!
//! Both evaluators talk to the model exclusively through the safe invoker
//! and decode scoring responses with the tolerant JSON extractor.

pub mod basic;
pub mod parse;
pub mod plan_solve;

pub use basic::PromptEvaluator;
pub use parse::{extract_json, overall_score};
pub use plan_solve::{ExecuteOutcome, PlanSolveEvaluator, PlanSolveReport, Stage, StageError};
