use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{seconds, LlmConfig, ProviderEntry};
use crate::errors::{ChatLoopError, ChatLoopResult};
use crate::llm::provider::LlmProvider;
use crate::llm::providers::openai_compatible::OpenAiCompatibleProvider;
use crate::llm::types::CallConfig;

/// Registry of all available LLM providers, keyed by their config.toml identifier.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    /// Providers that were registered without an API key.
    keyless: Vec<String>,
    llm_config: LlmConfig,
}

impl ProviderRegistry {
    pub fn new(llm_config: LlmConfig) -> Self {
        Self {
            providers: HashMap::new(),
            keyless: Vec::new(),
            llm_config,
        }
    }

    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Build a registry from the loaded config.
    /// API keys come from `CHATLOOP_<ID>_API_KEY`, then the provider's
    /// `api_key_env`, then `api_key` in the file.
    pub fn from_config(llm_config: &LlmConfig) -> ChatLoopResult<Self> {
        let timeout = seconds("llm.request_timeout", llm_config.request_timeout)?;
        let mut registry = Self::new(llm_config.clone());
        for (id, entry) in &llm_config.providers {
            let api_key = resolve_api_key(id, entry, |name| std::env::var(name).ok());
            if api_key.is_empty() {
                registry.keyless.push(id.clone());
            }
            let provider = OpenAiCompatibleProvider::new(id.clone(), entry.api_base.clone(), api_key, timeout)?;
            registry.register(Arc::new(provider));
        }
        Ok(registry)
    }

    /// Provider and call settings used for reply generation.
    ///
    /// Resolution order:
    /// 1. `[llm.reply]` in config.toml
    /// 2. Fallback: the active provider with its default model and temperature, no streaming
    pub fn reply_call(&self) -> ChatLoopResult<(Arc<dyn LlmProvider>, CallConfig)> {
        let (provider_id, cfg) = match &self.llm_config.reply {
            Some(role) => {
                let temperature = role.temperature.unwrap_or_else(|| {
                    self.llm_config
                        .providers
                        .get(&role.provider)
                        .map(|p| p.temperature)
                        .unwrap_or(0.7)
                });
                (
                    role.provider.as_str(),
                    CallConfig {
                        model: role.model.clone(),
                        stream: role.stream,
                        temperature,
                    },
                )
            }
            None => {
                let active = self.llm_config.active_provider.as_str();
                let entry = self.llm_config.providers.get(active).ok_or_else(|| {
                    ChatLoopError::Config(format!("Active provider '{active}' not configured"))
                })?;
                (
                    active,
                    CallConfig {
                        model: entry.model.clone(),
                        stream: false,
                        temperature: entry.temperature,
                    },
                )
            }
        };

        let provider = self.providers.get(provider_id).cloned().ok_or_else(|| {
            ChatLoopError::Config(format!("Reply generation references unknown provider '{provider_id}'"))
        })?;
        if self.keyless.iter().any(|k| k == provider_id) {
            return Err(ChatLoopError::Config(format!(
                "no API key for provider '{provider_id}'; set CHATLOOP_{}_API_KEY",
                provider_id.to_uppercase()
            )));
        }
        tracing::debug!(
            provider = provider_id,
            model = %cfg.model,
            stream = cfg.stream,
            temperature = cfg.temperature,
            "resolved reply call config"
        );
        Ok((provider, cfg))
    }
}

fn resolve_api_key(id: &str, entry: &ProviderEntry, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut candidates = vec![format!("CHATLOOP_{}_API_KEY", id.to_uppercase())];
    candidates.extend(entry.api_key_env.clone());
    candidates
        .iter()
        .filter_map(|name| lookup(name))
        .map(|k| k.trim().to_string())
        .find(|k| !k.is_empty())
        .or_else(|| entry.api_key.clone().filter(|k| !k.trim().is_empty()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoleEntry;

    fn groq_entry() -> ProviderEntry {
        LlmConfig::default().providers["groq"].clone()
    }

    #[test]
    fn api_key_precedence() {
        let mut entry = groq_entry();
        entry.api_key = Some("from-file".into());

        let both = |name: &str| match name {
            "CHATLOOP_GROQ_API_KEY" => Some("ours".to_string()),
            "GROQ_API_KEY" => Some("vendor".to_string()),
            _ => None,
        };
        assert_eq!(resolve_api_key("groq", &entry, both), "ours");

        let vendor_only = |name: &str| (name == "GROQ_API_KEY").then(|| "vendor".to_string());
        assert_eq!(resolve_api_key("groq", &entry, vendor_only), "vendor");

        let blank = |_: &str| Some("  ".to_string());
        assert_eq!(resolve_api_key("groq", &entry, blank), "from-file");

        entry.api_key = None;
        assert_eq!(resolve_api_key("groq", &entry, |_| None), "");
    }

    #[test]
    fn reply_role_overrides_active_defaults() {
        let mut llm = LlmConfig::default();
        llm.providers.get_mut("groq").unwrap().api_key = Some("k".into());
        llm.reply = Some(RoleEntry {
            provider: "groq".into(),
            model: "llama-3.3-70b-versatile".into(),
            stream: true,
            temperature: None,
        });
        let registry = ProviderRegistry::from_config(&llm).unwrap();
        let (provider, cfg) = registry.reply_call().unwrap();
        assert_eq!(provider.name(), "groq");
        assert_eq!(cfg.model, "llama-3.3-70b-versatile");
        assert!(cfg.stream);
        assert_eq!(cfg.temperature, 0.7);
    }

    #[test]
    fn unknown_reply_provider_is_a_config_error() {
        let mut llm = LlmConfig::default();
        llm.reply = Some(RoleEntry {
            provider: "nowhere".into(),
            model: "m".into(),
            stream: false,
            temperature: Some(0.2),
        });
        let registry = ProviderRegistry::from_config(&llm).unwrap();
        assert!(matches!(registry.reply_call(), Err(ChatLoopError::Config(_))));
    }
}
