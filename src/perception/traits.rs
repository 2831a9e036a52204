use async_trait::async_trait;

use crate::errors::ChatLoopResult;
use crate::perception::types::Region;

/// Source of the raw text shown in a chat's message area.
/// Two implementations: clipboard-based screen capture and transcript files.
#[async_trait]
pub trait CaptureAdapter: Send + Sync {
    /// Returns the text currently inside `region` for the chat at `slot`.
    async fn capture(&self, slot: usize, region: &Region) -> ChatLoopResult<String>;
}
