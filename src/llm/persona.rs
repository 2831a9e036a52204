use serde::{Deserialize, Serialize};

const DEFAULT_INSTRUCTIONS: &str = "\
You are the official Facebook Messenger auto-reply assistant for MultiHAT, a company providing development and cybersecurity services.

Your job is to:
- Reply instantly to new messages
- Acknowledge the user politely
- Set a clear response-time expectation
- Share the website link when helpful
- Keep replies short, professional, and human

Rules:
- Use the sender's first name if available
- Do not sound robotic or overly technical
- Do not promise instant human support
- Do not ask more than one question
- Do not request sensitive information
- Do not explain internal logic or system behavior
- Keep messages professional and business-focused

Default first-time reply:
Thanks for reaching out to MultiHAT. We've received your message and will get back to you within 2 hours.
In the meantime, you can visit our website: https://sagarbiswas-multihat.github.io/";

/// Who the bot speaks as and how. Rendered into the system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    /// Display identity, e.g. "MultiHAT support".
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_instructions")]
    pub instructions: String,
    /// Free-form tone hint, e.g. "professional, calm".
    #[serde(default)]
    pub tone: Option<String>,
    /// Allow emojis in replies.
    #[serde(default)]
    pub emojis: bool,
    /// Replies longer than this are cut at a character boundary.
    #[serde(default = "default_max_reply_chars")]
    pub max_reply_chars: usize,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: None,
            instructions: default_instructions(),
            tone: Some("Professional, calm, and trustworthy".to_string()),
            emojis: false,
            max_reply_chars: default_max_reply_chars(),
        }
    }
}

fn default_instructions() -> String {
    DEFAULT_INSTRUCTIONS.to_string()
}

fn default_max_reply_chars() -> usize {
    1000
}

impl Persona {
    pub fn system_prompt(&self) -> String {
        let mut prompt = self.instructions.trim().to_string();
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            prompt.push_str(&format!("\n\nYou speak as: {}.", name.trim()));
        }
        if let Some(tone) = self.tone.as_deref().filter(|t| !t.trim().is_empty()) {
            prompt.push_str(&format!("\nTone: {}.", tone.trim().trim_end_matches('.')));
        }
        if !self.emojis {
            prompt.push_str("\nDo not use emojis.");
        }
        prompt.push_str("\nReply with the message text only.");
        prompt
    }

    /// Trims the generated text and enforces `max_reply_chars`.
    /// Returns `None` when nothing usable is left.
    pub fn finish_reply(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if self.max_reply_chars == 0 || trimmed.chars().count() <= self.max_reply_chars {
            return Some(trimmed.to_string());
        }
        let cut: String = trimmed.chars().take(self.max_reply_chars).collect();
        Some(cut.trim_end().to_string())
    }
}
