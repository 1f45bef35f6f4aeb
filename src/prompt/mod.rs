//! Fixed prompt templates for the evaluation pipeline
//!
//! Five templates cover the whole pipeline: single-shot scoring, the three
//! plan/execute/synthesize stages, and the reflection/refine pair. Scoring
//! templates instruct the model to answer with a JSON object so downstream
//! parsing stays mechanical. Each variable occurs once, so plain string
//! replacement is all the rendering we need.

/// Single-shot scoring template.
pub const EVALUATION_TEMPLATE: &str = r#"You are a professional Prompt Quality Evaluator.

Evaluate the following prompt on a scale of 1-10 in these dimensions:

1. Clarity
2. Specificity
3. Constraints
4. Output Format Definition

Return your answer strictly in JSON format:

{
  "clarity": score,
  "specificity": score,
  "constraints": score,
  "format_definition": score,
  "overall": score,
  "problems": "short diagnosis",
  "improvement_suggestions": "actionable advice"
}

Prompt:
{prompt}"#;

/// Plan stage: break the evaluation into numbered steps.
pub const PLANNER_TEMPLATE: &str = r#"You are a Prompt Analysis Planner.

Break down how to evaluate the following prompt.
Return a numbered list of evaluation steps.

Prompt:
{prompt}"#;

/// Execute stage: analyze one step of the plan.
pub const EXECUTOR_TEMPLATE: &str = r#"You are evaluating a prompt.

Original Prompt:
{prompt}

Evaluation Plan:
{plan}

Current Step:
{step}

Return only the analysis for this step."#;

/// Synthesis stage: fold the step analyses into a final JSON score.
pub const SYNTHESIS_TEMPLATE: &str = r#"You are a senior Prompt Quality Evaluator.

Original Prompt:
{prompt}

Step Analyses:
{step_analyses}

Now provide a final scoring result strictly in JSON:
{
  "clarity": score,
  "specificity": score,
  "constraints": score,
  "format_definition": score,
  "overall": score,
  "problems": "short diagnosis",
  "improvement_suggestions": "actionable advice"
}"#;

/// Reflection stage: judge whether the previous evaluation holds up.
pub const REFLECTION_TEMPLATE: &str = r#"You are a strict Prompt Quality Reviewer.

Original Prompt:
{prompt}

Previous Evaluation:
{evaluation}

If the evaluation is flawed, explain why.
If acceptable, reply exactly: "Evaluation is reliable.""#;

/// Refine stage: rewrite the prompt from the reflection feedback.
pub const REFINE_TEMPLATE: &str = r#"Improve the original prompt based on this feedback:

Original Prompt:
{prompt}

Feedback:
{feedback}

Return only the improved prompt."#;

/// The literal verdict the reflection loop watches for.
pub const RELIABLE_VERDICT: &str = "Evaluation is reliable.";

pub fn render_evaluation(prompt: &str) -> String {
    EVALUATION_TEMPLATE.replace("{prompt}", prompt)
}

pub fn render_planner(prompt: &str) -> String {
    PLANNER_TEMPLATE.replace("{prompt}", prompt)
}

pub fn render_executor(prompt: &str, plan: &str, step: &str) -> String {
    EXECUTOR_TEMPLATE
        .replace("{prompt}", prompt)
        .replace("{plan}", plan)
        .replace("{step}", step)
}

pub fn render_synthesis(prompt: &str, step_analyses: &str) -> String {
    SYNTHESIS_TEMPLATE
        .replace("{prompt}", prompt)
        .replace("{step_analyses}", step_analyses)
}

pub fn render_reflection(prompt: &str, evaluation: &str) -> String {
    REFLECTION_TEMPLATE
        .replace("{prompt}", prompt)
        .replace("{evaluation}", evaluation)
}

pub fn render_refine(prompt: &str, feedback: &str) -> String {
    REFINE_TEMPLATE
        .replace("{prompt}", prompt)
        .replace("{feedback}", feedback)
}
