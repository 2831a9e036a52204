use async_trait::async_trait;

use crate::errors::ChatLoopResult;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse};

/// Unified LLM provider trait. All providers implement this trait.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the provider's identifier (matches the config.toml key).
    fn name(&self) -> &str;

    /// Runs one chat completion and returns the accumulated response,
    /// whether or not the wire format was streamed.
    async fn chat(&self, messages: Vec<ChatMessage>, cfg: &CallConfig) -> ChatLoopResult<LlmResponse>;
}
