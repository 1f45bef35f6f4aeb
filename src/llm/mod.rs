//! LLM layer - client trait, safe invocation, chat-completions backend
//!
//! This module provides:
//! - Message and result types shared across the pipeline
//! - The LlmClient trait with its optional unified-result capability
//! - The safe invoker (classification, retries, backoff)
//! - An OpenAI-compatible client implementation

pub mod client;
pub mod invoke;
pub mod openai;
pub mod types;

pub use client::{LlmClient, LlmError, MockLlmClient};
pub use invoke::{call_llm_safe, classify};
pub use openai::{LlmConfig, OpenAiClient};
pub use types::{CompletionResult, ErrorKind, InvokePolicy, Message, Role};
