// CJK-aware text input.
// CJK characters and multi-line text go via clipboard + paste chord; plain
// Latin text via direct key simulation.
use serde::{Deserialize, Serialize};

use crate::errors::ChatLoopResult;
use crate::executor::{clipboard, input};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InsertMethod {
    #[default]
    Auto,
    Paste,
    Type,
}

impl InsertMethod {
    /// Resolves `Auto` for a concrete piece of text.
    pub fn resolve(self, text: &str) -> InsertMethod {
        match self {
            InsertMethod::Auto if contains_cjk(text) || text.contains('\n') => InsertMethod::Paste,
            InsertMethod::Auto => InsertMethod::Type,
            other => other,
        }
    }
}

/// Returns true if the text contains CJK (Chinese/Japanese/Korean) characters.
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c)
        || ('\u{3040}'..='\u{309f}').contains(&c)
        || ('\u{30a0}'..='\u{30ff}').contains(&c)
        || ('\u{ac00}'..='\u{d7af}').contains(&c))
}

/// Inserts `text` into whatever field currently has keyboard focus.
pub async fn insert_text(text: &str, method: InsertMethod) -> ChatLoopResult<()> {
    match method.resolve(text) {
        InsertMethod::Type => input::type_text(text).await,
        _ => {
            clipboard::write_text(text).await?;
            input::paste_shortcut().await
        }
    }
}
