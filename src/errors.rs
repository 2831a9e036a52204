use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatLoopError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("LLM provider error: {0}")]
    LlmProvider(String),

    #[error("SSE parsing error: {0}")]
    SseParsing(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Input simulation error: {0}")]
    Input(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<enigo::InputError> for ChatLoopError {
    fn from(e: enigo::InputError) -> Self {
        ChatLoopError::Input(e.to_string())
    }
}

impl From<enigo::NewConError> for ChatLoopError {
    fn from(e: enigo::NewConError) -> Self {
        ChatLoopError::Input(e.to_string())
    }
}

impl From<arboard::Error> for ChatLoopError {
    fn from(e: arboard::Error) -> Self {
        ChatLoopError::Clipboard(e.to_string())
    }
}

pub type ChatLoopResult<T> = Result<T, ChatLoopError>;
