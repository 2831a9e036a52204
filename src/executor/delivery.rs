use std::time::Duration;

use async_trait::async_trait;

use crate::config::{seconds, DeliveryConfig, TimingConfig};
use crate::errors::{ChatLoopError, ChatLoopResult};
use crate::executor::text_input::{self, InsertMethod};
use crate::executor::input;
use crate::perception::types::Point;

/// Everything the cycle does to the chat UI besides reading it.
#[async_trait]
pub trait DeliveryAdapter: Send + Sync {
    /// Opens the chat list; called once before the first cycle.
    async fn open_chat_list(&self, at: Point) -> ChatLoopResult<()>;

    /// Brings the chat whose list entry sits at `at` to the front.
    async fn focus_slot(&self, at: Point) -> ChatLoopResult<()>;

    /// Places `text` into the input at `at` and submits it.
    async fn deliver(&self, at: Point, text: &str) -> ChatLoopResult<()>;
}

/// Real mouse and keyboard delivery.
pub struct EnigoDelivery {
    after_click: Duration,
    after_focus: Duration,
    after_paste: Duration,
    method: InsertMethod,
    submit: bool,
}

impl EnigoDelivery {
    pub fn new(timing: &TimingConfig, delivery: &DeliveryConfig) -> ChatLoopResult<Self> {
        Ok(Self {
            after_click: seconds("after_click", timing.after_click)?,
            after_focus: seconds("after_focus", timing.after_focus)?,
            after_paste: seconds("after_paste", timing.after_paste)?,
            method: delivery.method,
            submit: delivery.submit,
        })
    }
}

#[async_trait]
impl DeliveryAdapter for EnigoDelivery {
    async fn open_chat_list(&self, at: Point) -> ChatLoopResult<()> {
        input::mouse_click(at).await?;
        tokio::time::sleep(self.after_click).await;
        Ok(())
    }

    async fn focus_slot(&self, at: Point) -> ChatLoopResult<()> {
        input::mouse_click(at).await?;
        tokio::time::sleep(self.after_click).await;
        Ok(())
    }

    async fn deliver(&self, at: Point, text: &str) -> ChatLoopResult<()> {
        let wrap = |e: ChatLoopError| ChatLoopError::Delivery(e.to_string());

        input::mouse_click(at).await.map_err(wrap)?;
        tokio::time::sleep(self.after_focus).await;
        text_input::insert_text(text, self.method).await.map_err(wrap)?;
        tokio::time::sleep(self.after_paste).await;
        if self.submit {
            input::press_enter().await.map_err(wrap)?;
        }
        tracing::debug!(x = at.x, y = at.y, len = text.len(), "reply delivered");
        Ok(())
    }
}
