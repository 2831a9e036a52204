//! In-memory adapters for exercising the cycle without a screen or network.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::engine::run_log::{LogSink, RunLogEntry};
use crate::errors::{ChatLoopError, ChatLoopResult};
use crate::executor::delivery::DeliveryAdapter;
use crate::llm::generator::ReplyGenerator;
use crate::llm::persona::Persona;
use crate::perception::traits::CaptureAdapter;
use crate::perception::types::{Point, Region};

#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<RunLogEntry>>>,
}

impl MemorySink {
    pub fn entries(&self) -> Vec<RunLogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl LogSink for MemorySink {
    fn append(&mut self, entry: &RunLogEntry) -> ChatLoopResult<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

/// Returns a fixed capture per slot; slots without a script fail.
#[derive(Default)]
pub struct ScriptedCapture {
    texts: HashMap<usize, String>,
    pub calls: Mutex<Vec<(usize, Region)>>,
}

impl ScriptedCapture {
    pub fn with(mut self, slot: usize, text: &str) -> Self {
        self.texts.insert(slot, text.to_string());
        self
    }
}

#[async_trait]
impl CaptureAdapter for ScriptedCapture {
    async fn capture(&self, slot: usize, region: &Region) -> ChatLoopResult<String> {
        self.calls.lock().unwrap().push((slot, *region));
        self.texts
            .get(&slot)
            .cloned()
            .ok_or_else(|| ChatLoopError::Capture(format!("no capture scripted for slot {slot}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    OpenChatList(Point),
    Focus(Point),
    Deliver(Point, String),
}

#[derive(Default)]
pub struct RecordingDelivery {
    pub fail_delivery: bool,
    pub fail_focus: bool,
    pub actions: Mutex<Vec<UiAction>>,
}

impl RecordingDelivery {
    pub fn actions(&self) -> Vec<UiAction> {
        self.actions.lock().unwrap().clone()
    }

    pub fn deliveries(&self) -> Vec<(Point, String)> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                UiAction::Deliver(p, t) => Some((p, t)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl DeliveryAdapter for RecordingDelivery {
    async fn open_chat_list(&self, at: Point) -> ChatLoopResult<()> {
        self.actions.lock().unwrap().push(UiAction::OpenChatList(at));
        Ok(())
    }

    async fn focus_slot(&self, at: Point) -> ChatLoopResult<()> {
        if self.fail_focus {
            return Err(ChatLoopError::Input("pointer blocked".into()));
        }
        self.actions.lock().unwrap().push(UiAction::Focus(at));
        Ok(())
    }

    async fn deliver(&self, at: Point, text: &str) -> ChatLoopResult<()> {
        if self.fail_delivery {
            return Err(ChatLoopError::Delivery("input box obstructed".into()));
        }
        self.actions.lock().unwrap().push(UiAction::Deliver(at, text.to_string()));
        Ok(())
    }
}

pub struct CannedGenerator {
    reply: Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            reply: Err(error.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplyGenerator for CannedGenerator {
    async fn generate(&self, content: &str, _persona: &Persona) -> ChatLoopResult<String> {
        self.prompts.lock().unwrap().push(content.to_string());
        self.reply.clone().map_err(ChatLoopError::LlmProvider)
    }
}
