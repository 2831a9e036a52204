use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::errors::{ChatLoopError, ChatLoopResult};
use crate::llm::provider::LlmProvider;
use crate::llm::sse_parser;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse, StreamChunkKind};

pub struct OpenAiCompatibleProvider {
    id: String,
    api_base: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    /// `timeout` bounds the whole request, streamed body included.
    pub fn new(id: String, api_base: String, api_key: String, timeout: Duration) -> ChatLoopResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            id,
            api_base,
            api_key,
            client,
        })
    }
}

/// Splits a byte stream into trimmed lines. Bytes are only decoded once a
/// full line is buffered, so a UTF-8 sequence split across network chunks
/// survives intact.
#[derive(Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.id
    }

    async fn chat(&self, messages: Vec<ChatMessage>, cfg: &CallConfig) -> ChatLoopResult<LlmResponse> {
        let body = serde_json::json!({
            "model": cfg.model,
            "messages": &messages,
            "stream": cfg.stream,
            "temperature": cfg.temperature,
        });

        tracing::debug!(
            provider = %self.id,
            model = %cfg.model,
            stream = cfg.stream,
            messages = messages.len(),
            "sending LLM request"
        );

        let response = self
            .client
            .post(&self.api_base)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(ChatLoopError::LlmProvider(format!("{}: {}", status, err_body)));
        }

        if cfg.stream {
            self.handle_stream(response).await
        } else {
            let json: serde_json::Value = response.json().await?;
            let parsed = parse_completion(&json)?;
            tracing::info!(content_len = parsed.content.len(), "LLM JSON response received");
            Ok(parsed)
        }
    }
}

impl OpenAiCompatibleProvider {
    /// Handle SSE streaming response, accumulating the full reply.
    async fn handle_stream(&self, response: reqwest::Response) -> ChatLoopResult<LlmResponse> {
        let mut byte_stream = response.bytes_stream();
        let mut lines = LineBuffer::default();
        let mut resp = LlmResponse::default();

        'stream: while let Some(result) = byte_stream.next().await {
            let bytes = result?;

            for line in lines.push(&bytes) {
                match sse_parser::parse_sse_line(&line) {
                    Ok(Some(chunk)) => match chunk.kind {
                        StreamChunkKind::Reasoning => resp.reasoning.push_str(&chunk.content),
                        StreamChunkKind::Content => resp.content.push_str(&chunk.content),
                        StreamChunkKind::Done => break 'stream,
                    },
                    Ok(None) => {}
                    Err(ChatLoopError::SseParsing(e)) => {
                        tracing::debug!("SSE parse skipped: {e}");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        tracing::info!(
            content_len = resp.content.len(),
            reasoning_len = resp.reasoning.len(),
            "LLM stream complete"
        );
        Ok(resp)
    }
}

/// Extracts the first choice of a non-streaming chat completion.
fn parse_completion(json: &serde_json::Value) -> ChatLoopResult<LlmResponse> {
    if let Some(message) = json["error"]["message"].as_str() {
        return Err(ChatLoopError::LlmProvider(message.to_string()));
    }
    let message = &json["choices"][0]["message"];
    let content = message["content"]
        .as_str()
        .ok_or_else(|| ChatLoopError::LlmProvider("response has no choices[0].message.content".into()))?;
    Ok(LlmResponse {
        content: content.to_string(),
        reasoning: message["reasoning_content"].as_str().unwrap_or("").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_choice() {
        let json = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "Hello! How can I help?" } }]
        });
        let resp = parse_completion(&json).unwrap();
        assert_eq!(resp.content, "Hello! How can I help?");
        assert!(resp.reasoning.is_empty());
    }

    #[test]
    fn line_buffer_keeps_split_utf8_intact() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"café\"}}]}\n";
        let bytes = line.as_bytes();
        // Cut between the two bytes of 'é'.
        let cut = line.find('é').unwrap() + 1;

        let mut buf = LineBuffer::default();
        assert!(buf.push(&bytes[..cut]).is_empty());
        let lines = buf.push(&bytes[cut..]);
        assert_eq!(lines, vec![line.trim().to_string()]);
        assert!(!lines[0].contains('\u{fffd}'));

        let chunk = sse_parser::parse_sse_line(&lines[0]).unwrap().unwrap();
        assert_eq!(chunk.content, "café");
    }

    #[test]
    fn line_buffer_splits_and_skips_blank_lines() {
        let mut buf = LineBuffer::default();
        assert_eq!(buf.push(b"data: a\n\r\n\ndata: "), vec!["data: a".to_string()]);
        assert_eq!(buf.push(b"b\n"), vec!["data: b".to_string()]);
    }

    #[tokio::test]
    async fn stalled_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept connections and never answer.
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let provider = OpenAiCompatibleProvider::new(
            "local".into(),
            format!("http://{addr}/v1/chat/completions"),
            "key".into(),
            Duration::from_millis(200),
        )
        .unwrap();
        let cfg = CallConfig {
            model: "m".into(),
            stream: false,
            temperature: 0.7,
        };
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            provider.chat(vec![ChatMessage::user("hi")], &cfg),
        )
        .await
        .expect("request should time out on its own");
        assert!(matches!(result, Err(ChatLoopError::Http(ref e)) if e.is_timeout()));
    }

    #[test]
    fn missing_content_is_an_error() {
        let json = serde_json::json!({ "choices": [] });
        assert!(matches!(parse_completion(&json), Err(ChatLoopError::LlmProvider(_))));

        let json = serde_json::json!({ "error": { "message": "invalid api key" } });
        let err = parse_completion(&json).unwrap_err();
        assert!(err.to_string().contains("invalid api key"));
    }
}
