//! rubric - prompt quality evaluation and refinement
//!
//! rubric scores a prompt along fixed quality dimensions using a single LLM
//! chat-completions endpoint. On top of one robust invocation layer it offers
//! three modes: a single-shot evaluation, a plan/execute/synthesize
//! decomposition, and a reflection loop that refines the prompt until a
//! target score is reached or the iteration budget runs out.

pub mod error;
pub mod eval;
pub mod llm;
pub mod prompt;
pub mod reflect;

pub use error::{Result, RubricError};
