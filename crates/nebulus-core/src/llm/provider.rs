//! LlmProvider trait definition.
//!
//! The consolidator only needs the plain synchronous chat surface: an
//! ordered list of role/content messages plus a model identifier in, one
//! text completion out. Whatever timeout behavior exists is the provider's.
//!
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).
//! Implementations live in nebulus-infra (e.g., `OpenAiCompatProvider`).

use nebulus_types::llm::{LlmError, Message};

/// Trait for LLM chat backends used as the fact extraction collaborator.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai-compat").
    fn name(&self) -> &str;

    /// Send the messages and return the assistant's text completion.
    fn chat(
        &self,
        messages: &[Message],
        model: &str,
    ) -> impl std::future::Future<Output = Result<String, LlmError>> + Send;
}
