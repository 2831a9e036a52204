use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classifier::MarkerPosition;
use crate::errors::{ChatLoopError, ChatLoopResult};
use crate::executor::text_input::InsertMethod;
use crate::llm::persona::Persona;
use crate::perception::types::{Point, Region};

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub persona: Persona,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub coords: CoordsConfig,
    /// Per-chat overrides. When present, replaces `coords.chat_list`.
    #[serde(default)]
    pub chats: Vec<ChatEntry>,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub run: RunLimits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub active_provider: String,
    pub providers: HashMap<String, ProviderEntry>,
    /// Optional provider+model pinned for reply generation.
    /// Falls back to the active provider's defaults when absent.
    #[serde(default)]
    pub reply: Option<RoleEntry>,
    /// Whole-request timeout for LLM calls, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: f64,
}

fn default_request_timeout() -> f64 {
    60.0
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "groq".to_string(),
            ProviderEntry {
                display_name: "Groq".to_string(),
                api_base: "https://api.groq.com/openai/v1/chat/completions".to_string(),
                model: "llama-3.1-8b-instant".to_string(),
                temperature: default_temperature(),
                api_key_env: Some("GROQ_API_KEY".to_string()),
                api_key: None,
            },
        );
        Self {
            active_provider: "groq".to_string(),
            providers,
            reply: None,
            request_timeout: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub display_name: String,
    pub api_base: String,
    /// Default model for this provider.
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Extra environment variable consulted for the API key, e.g. `GROQ_API_KEY`.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Optional API key stored in config.toml (lowest precedence).
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleEntry {
    /// Must match a key under [llm.providers.*].
    pub provider: String,
    /// Model name sent to the API.
    pub model: String,
    #[serde(default)]
    pub stream: bool,
    /// Overrides the provider-level temperature.
    pub temperature: Option<f64>,
}

fn default_temperature() -> f64 {
    0.7
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Label the chat UI renders next to our own messages.
    pub self_marker: String,
    #[serde(default)]
    pub self_aliases: Vec<String>,
    #[serde(default)]
    pub marker_position: MarkerPosition,
    /// Lines starting with one of these (case-insensitive) belong to the input
    /// area; everything from the last such line on is dropped before parsing.
    #[serde(default = "default_input_placeholders")]
    pub input_placeholders: Vec<String>,
    #[serde(default = "default_true")]
    pub reply_once_per_message: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            self_marker: "You sent".to_string(),
            self_aliases: Vec::new(),
            marker_position: MarkerPosition::default(),
            input_placeholders: default_input_placeholders(),
            reply_once_per_message: true,
        }
    }
}

fn default_input_placeholders() -> Vec<String> {
    vec!["type a message".to_string(), "write to".to_string()]
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordsConfig {
    /// Clicked once at startup to open the chat list.
    #[serde(default = "default_chat_icon")]
    pub chat_icon: Option<Point>,
    /// Set to false to skip the startup click on `chat_icon`.
    #[serde(default = "default_true")]
    pub open_chat_list: bool,
    #[serde(default = "default_select_start")]
    pub select_start: Point,
    #[serde(default = "default_select_end")]
    pub select_end: Point,
    #[serde(default = "default_input_box")]
    pub input_box: Point,
    #[serde(default = "default_chat_list")]
    pub chat_list: Vec<Point>,
}

impl Default for CoordsConfig {
    fn default() -> Self {
        Self {
            chat_icon: default_chat_icon(),
            open_chat_list: true,
            select_start: default_select_start(),
            select_end: default_select_end(),
            input_box: default_input_box(),
            chat_list: default_chat_list(),
        }
    }
}

fn default_chat_icon() -> Option<Point> {
    Some(Point::new(617, 1050))
}

fn default_select_start() -> Point {
    Point::new(523, 183)
}

fn default_select_end() -> Point {
    Point::new(1397, 1013)
}

fn default_input_box() -> Point {
    Point::new(600, 1006)
}

fn default_chat_list() -> Vec<Point> {
    vec![
        Point::new(245, 248),
        Point::new(245, 314),
        Point::new(230, 373),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntry {
    pub list_entry: Point,
    pub select_start: Option<Point>,
    pub select_end: Option<Point>,
    pub input_box: Option<Point>,
}

/// All values in seconds, as fractional numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_after_click")]
    pub after_click: f64,
    #[serde(default = "default_drag_duration")]
    pub drag_duration: f64,
    #[serde(default = "default_short_pause")]
    pub after_copy: f64,
    #[serde(default = "default_short_pause")]
    pub after_focus: f64,
    #[serde(default = "default_short_pause")]
    pub after_paste: f64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            after_click: default_after_click(),
            drag_duration: default_drag_duration(),
            after_copy: default_short_pause(),
            after_focus: default_short_pause(),
            after_paste: default_short_pause(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_after_click() -> f64 {
    1.0
}

fn default_drag_duration() -> f64 {
    0.5
}

fn default_short_pause() -> f64 {
    0.5
}

fn default_poll_interval() -> f64 {
    2.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default)]
    pub source: CaptureSource,
    /// Directory holding `slot_<n>.txt` files when `source = "transcript"`.
    pub transcript_dir: Option<PathBuf>,
    #[serde(default = "default_clipboard_retries")]
    pub clipboard_retries: u32,
    #[serde(default = "default_clipboard_retry_delay")]
    pub clipboard_retry_delay: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: CaptureSource::default(),
            transcript_dir: None,
            clipboard_retries: default_clipboard_retries(),
            clipboard_retry_delay: default_clipboard_retry_delay(),
        }
    }
}

fn default_clipboard_retries() -> u32 {
    3
}

fn default_clipboard_retry_delay() -> f64 {
    0.3
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    #[default]
    Screen,
    Transcript,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default)]
    pub method: InsertMethod,
    /// Press Enter after inserting the reply.
    #[serde(default = "default_true")]
    pub submit: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            method: InsertMethod::default(),
            submit: true,
        }
    }
}

/// Optional stop conditions; the cycle runs until cancelled when both are unset.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunLimits {
    pub max_cycles: Option<u64>,
    pub max_duration_minutes: Option<u64>,
}

/// One monitored conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatSlot {
    pub index: usize,
    pub list_entry: Point,
    pub region: Region,
    pub input_box: Point,
}

/// Validated, read-only view of the configuration that drives the cycle.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub self_marker: String,
    pub self_aliases: Vec<String>,
    pub marker_position: MarkerPosition,
    pub input_placeholders: Vec<String>,
    pub reply_once_per_message: bool,
    pub chat_icon: Option<Point>,
    pub slots: Vec<ChatSlot>,
    pub poll_interval: Duration,
    pub persona: Persona,
    pub dry_run: bool,
}

impl AppConfig {
    /// Applies `CHATLOOP_MODEL` / `CHATLOOP_PERSONA` on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(model) = lookup("CHATLOOP_MODEL") {
            if !model.trim().is_empty() {
                tracing::debug!(model = %model, "model overridden from environment");
                if let Some(role) = self.llm.reply.as_mut() {
                    role.model = model.clone();
                }
                if let Some(entry) = self.llm.providers.get_mut(&self.llm.active_provider) {
                    entry.model = model;
                }
            }
        }
        if let Some(persona) = lookup("CHATLOOP_PERSONA") {
            if !persona.trim().is_empty() {
                tracing::debug!("persona instructions overridden from environment");
                self.persona.instructions = persona;
            }
        }
    }

    pub fn slots(&self) -> ChatLoopResult<Vec<ChatSlot>> {
        let c = &self.coords;
        let default_region = Region::new(c.select_start, c.select_end);
        // [[chats]] wins over coords.chat_list, which is always populated by default.
        if !self.chats.is_empty() && !c.chat_list.is_empty() {
            tracing::debug!("[[chats]] configured; ignoring coords.chat_list");
        }
        let slots: Vec<ChatSlot> = if self.chats.is_empty() {
            c.chat_list
                .iter()
                .enumerate()
                .map(|(index, &list_entry)| ChatSlot {
                    index,
                    list_entry,
                    region: default_region,
                    input_box: c.input_box,
                })
                .collect()
        } else {
            self.chats
                .iter()
                .enumerate()
                .map(|(index, chat)| ChatSlot {
                    index,
                    list_entry: chat.list_entry,
                    region: Region::new(
                        chat.select_start.unwrap_or(c.select_start),
                        chat.select_end.unwrap_or(c.select_end),
                    ),
                    input_box: chat.input_box.unwrap_or(c.input_box),
                })
                .collect()
        };
        if slots.is_empty() {
            return Err(ChatLoopError::Config("no chats configured to monitor".into()));
        }
        Ok(slots)
    }

    pub fn validate(&self) -> ChatLoopResult<()> {
        if self.chat.self_marker.trim().is_empty() {
            return Err(ChatLoopError::Config("chat.self_marker must not be empty".into()));
        }
        let t = &self.timing;
        for (name, secs) in [
            ("after_click", t.after_click),
            ("drag_duration", t.drag_duration),
            ("after_copy", t.after_copy),
            ("after_focus", t.after_focus),
            ("after_paste", t.after_paste),
            ("clipboard_retry_delay", self.capture.clipboard_retry_delay),
        ] {
            seconds(name, secs)?;
        }
        if seconds("poll_interval", t.poll_interval)?.is_zero() {
            return Err(ChatLoopError::Config("timing.poll_interval must be positive".into()));
        }
        if self.capture.source == CaptureSource::Transcript && self.capture.transcript_dir.is_none() {
            return Err(ChatLoopError::Config(
                "capture.source = \"transcript\" needs capture.transcript_dir".into(),
            ));
        }
        if seconds("llm.request_timeout", self.llm.request_timeout)?.is_zero() {
            return Err(ChatLoopError::Config("llm.request_timeout must be positive".into()));
        }
        if !self.llm.providers.contains_key(&self.llm.active_provider) {
            return Err(ChatLoopError::Config(format!(
                "active provider '{}' has no [llm.providers.{}] entry",
                self.llm.active_provider, self.llm.active_provider
            )));
        }
        if self.run.max_cycles == Some(0) {
            return Err(ChatLoopError::Config("run.max_cycles must be at least 1".into()));
        }
        self.slots().map(|_| ())
    }

    pub fn run_config(&self, dry_run: bool) -> ChatLoopResult<RunConfig> {
        self.validate()?;
        // Screen capture drags the mouse and presses the copy chord.
        if dry_run && self.capture.source == CaptureSource::Screen {
            return Err(ChatLoopError::Config(
                "--dry-run never touches the screen; set capture.source = \"transcript\" and capture.transcript_dir".into(),
            ));
        }
        Ok(RunConfig {
            self_marker: self.chat.self_marker.trim().to_string(),
            self_aliases: self
                .chat
                .self_aliases
                .iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
            marker_position: self.chat.marker_position,
            input_placeholders: self.chat.input_placeholders.clone(),
            reply_once_per_message: self.chat.reply_once_per_message,
            chat_icon: self.coords.chat_icon.filter(|_| self.coords.open_chat_list),
            slots: self.slots()?,
            poll_interval: seconds("poll_interval", self.timing.poll_interval)?,
            persona: self.persona.clone(),
            dry_run,
        })
    }
}

/// Converts a config value in seconds, rejecting negative or non-finite input.
pub fn seconds(name: &str, secs: f64) -> ChatLoopResult<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| ChatLoopError::Config(format!("{name} must be a non-negative number of seconds, got {secs}")))
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join(CONFIG_FILE);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Some(candidate);
            }
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        let candidate = cwd.join(CONFIG_FILE);
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in working directory");
            return Some(candidate);
        }
    }

    let candidate = dirs::config_dir()?.join("chatloop").join(CONFIG_FILE);
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in user config directory");
        return Some(candidate);
    }
    None
}

/// Loads the configuration. An explicit path must exist; otherwise the usual
/// locations are searched and built-in defaults are used when nothing is found.
pub fn load_config(explicit: Option<&Path>) -> ChatLoopResult<AppConfig> {
    let path = match explicit {
        Some(p) if !p.exists() => {
            return Err(ChatLoopError::Config(format!("config file {} does not exist", p.display())));
        }
        Some(p) => Some(p.to_path_buf()),
        None => resolve_config_path(),
    };

    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            let config = parse_config(&content)?;
            tracing::info!(
                path = %path.display(),
                provider = %config.llm.active_provider,
                "config loaded"
            );
            config
        }
        None => {
            tracing::warn!("no config.toml found; using built-in defaults");
            AppConfig::default()
        }
    };
    config.apply_env_overrides();
    Ok(config)
}

pub fn parse_config(content: &str) -> ChatLoopResult<AppConfig> {
    Ok(toml::from_str(content)?)
}
