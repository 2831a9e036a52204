use std::time::Duration;

use async_trait::async_trait;

use crate::config::{seconds, CaptureConfig, TimingConfig};
use crate::errors::{ChatLoopError, ChatLoopResult};
use crate::executor::{clipboard, input};
use crate::perception::traits::CaptureAdapter;
use crate::perception::types::Region;

/// Reads a chat by drag-selecting its message area and copying the selection.
pub struct ScreenCapture {
    drag_duration: Duration,
    after_copy: Duration,
    retries: u32,
    retry_delay: Duration,
}

impl ScreenCapture {
    pub fn new(timing: &TimingConfig, capture: &CaptureConfig) -> ChatLoopResult<Self> {
        Ok(Self {
            drag_duration: seconds("drag_duration", timing.drag_duration)?,
            after_copy: seconds("after_copy", timing.after_copy)?,
            retries: capture.clipboard_retries.max(1),
            retry_delay: seconds("clipboard_retry_delay", capture.clipboard_retry_delay)?,
        })
    }
}

#[async_trait]
impl CaptureAdapter for ScreenCapture {
    async fn capture(&self, slot: usize, region: &Region) -> ChatLoopResult<String> {
        // A stale clipboard must never pass for this chat's transcript.
        if let Err(e) = clipboard::clear().await {
            tracing::warn!(slot, error = %e, "could not clear clipboard before capture");
        }

        input::drag(*region, self.drag_duration).await?;
        tokio::time::sleep(self.after_copy).await;
        input::copy_shortcut().await?;
        input::click_in_place().await?;

        for attempt in 1..=self.retries {
            tokio::time::sleep(self.retry_delay).await;
            let text = clipboard::read_text().await?;
            if !text.trim().is_empty() {
                tracing::debug!(slot, attempt, len = text.len(), "chat text captured");
                return Ok(text);
            }
            tracing::debug!(slot, attempt, retries = self.retries, "clipboard empty");
        }

        Err(ChatLoopError::Capture(format!(
            "clipboard stayed empty after {} attempts; check the selection coordinates",
            self.retries
        )))
    }
}
