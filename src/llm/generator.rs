use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{ChatLoopError, ChatLoopResult};
use crate::llm::persona::Persona;
use crate::llm::provider::LlmProvider;
use crate::llm::registry::ProviderRegistry;
use crate::llm::types::{CallConfig, ChatMessage};

/// Turns a counterpart message into reply text.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, content: &str, persona: &Persona) -> ChatLoopResult<String>;
}

/// Reply generation backed by an LLM provider from the registry.
pub struct LlmReplyGenerator {
    provider: Arc<dyn LlmProvider>,
    cfg: CallConfig,
}

impl LlmReplyGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, cfg: CallConfig) -> Self {
        Self { provider, cfg }
    }

    pub fn from_registry(registry: &ProviderRegistry) -> ChatLoopResult<Self> {
        let (provider, cfg) = registry.reply_call()?;
        Ok(Self::new(provider, cfg))
    }
}

#[async_trait]
impl ReplyGenerator for LlmReplyGenerator {
    async fn generate(&self, content: &str, persona: &Persona) -> ChatLoopResult<String> {
        let messages = vec![
            ChatMessage::system(persona.system_prompt()),
            ChatMessage::user(content),
        ];
        let response = self.provider.chat(messages, &self.cfg).await?;
        let reply = persona
            .finish_reply(&response.content)
            .ok_or_else(|| ChatLoopError::LlmProvider(format!("{} returned an empty reply", self.provider.name())))?;
        tracing::debug!(
            provider = self.provider.name(),
            reply_len = reply.len(),
            "reply generated"
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::llm::types::LlmResponse;

    struct CannedProvider {
        reply: String,
        seen: Mutex<Vec<ChatMessage>>,
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        async fn chat(&self, messages: Vec<ChatMessage>, _cfg: &CallConfig) -> ChatLoopResult<LlmResponse> {
            self.seen.lock().unwrap().extend(messages);
            Ok(LlmResponse {
                content: self.reply.clone(),
                reasoning: String::new(),
            })
        }
    }

    fn cfg() -> CallConfig {
        CallConfig {
            model: "test-model".into(),
            stream: false,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn sends_persona_and_message_only() {
        let provider = Arc::new(CannedProvider {
            reply: "  Hello! How can I help?\n".into(),
            seen: Mutex::new(Vec::new()),
        });
        let generator = LlmReplyGenerator::new(provider.clone(), cfg());
        let persona = Persona::default();

        let reply = generator.generate("Hi there!", &persona).await.unwrap();
        assert_eq!(reply, "Hello! How can I help?");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].role, "system");
        assert_eq!(seen[0].content, persona.system_prompt());
        assert_eq!(seen[1].role, "user");
        assert_eq!(seen[1].content, "Hi there!");
    }

    #[tokio::test]
    async fn blank_reply_is_a_failure() {
        let provider = Arc::new(CannedProvider {
            reply: " \n".into(),
            seen: Mutex::new(Vec::new()),
        });
        let generator = LlmReplyGenerator::new(provider, cfg());
        let err = generator.generate("Hi", &Persona::default()).await.unwrap_err();
        assert!(matches!(err, ChatLoopError::LlmProvider(_)));
    }
}
