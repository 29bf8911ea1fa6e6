//! Streaming support for DeepSeek chat completions
//!
//! Bytes from the HTTP body go through [`SseDecoder`] into
//! [`ChatCompletionChunk`]s, which [`DeepSeekStreamHandler`] folds into
//! neutral [`StreamChunk`](crate::services::StreamChunk) events.

pub mod deepseek_stream;
pub mod sse_parser;

pub use deepseek_stream::{DeepSeekStreamHandler, StreamState};
pub use sse_parser::{SseDecoder, SseEvent};

use serde::{Deserialize, Serialize};

use crate::services::Usage;

/// One streamed unit of a chat completion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
    /// Provider failure reported in-band
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

/// Error object sent inside the event stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireError {
    #[serde(default)]
    pub message: Option<String>,
    /// String or numeric code
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
}

impl WireError {
    /// Code as text, falling back to the error type
    #[must_use]
    pub fn code_text(&self) -> Option<String> {
        match &self.code {
            Some(serde_json::Value::String(code)) => Some(code.clone()),
            Some(serde_json::Value::Null) | None => self.error_type.clone(),
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Choice in a streamed chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Incremental fields of a choice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Thinking-mode output
    #[serde(default)]
    pub reasoning_content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

/// Fragment of a tool call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub call_type: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

/// Fragment of a function call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

/// Usage as reported by the provider; absent counters read as zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireUsage {
    #[serde(default)]
    pub prompt_tokens: Option<u32>,
    #[serde(default)]
    pub completion_tokens: Option<u32>,
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

impl From<WireUsage> for Usage {
    fn from(usage: WireUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens.unwrap_or(0),
            completion_tokens: usage.completion_tokens.unwrap_or(0),
            total_tokens: usage.total_tokens.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_chunk() {
        let chunk: ChatCompletionChunk = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "object": "chat.completion.chunk",
            "created": 1,
            "model": "deepseek-chat",
            "choices": [{"index": 0, "delta": {"reasoning_content": "hm"}, "finish_reason": null}]
        }))
        .unwrap();
        assert_eq!(chunk.id.as_deref(), Some("c1"));
        assert_eq!(chunk.choices[0].delta.reasoning_content.as_deref(), Some("hm"));
        assert!(chunk.choices[0].finish_reason.is_none());
    }

    #[test]
    fn test_usage_defaults_to_zero() {
        let usage: WireUsage = serde_json::from_str(r#"{"prompt_tokens":4}"#).unwrap();
        let usage = Usage::from(usage);
        assert_eq!(usage.prompt_tokens, 4);
        assert_eq!(usage.completion_tokens, 0);
        assert_eq!(usage.total_tokens, 0);
    }

    #[test]
    fn test_usage_only_chunk_has_no_choices() {
        let chunk: ChatCompletionChunk =
            serde_json::from_str(r#"{"id":"c1","choices":[],"usage":{"total_tokens":9}}"#)
                .unwrap();
        assert!(chunk.choices.is_empty());
        assert_eq!(chunk.usage.unwrap().total_tokens, Some(9));
    }

    #[test]
    fn test_in_band_error_code_forms() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"error":{"message":"Rate limit reached","type":"rate_limit_error","code":429}}"#,
        )
        .unwrap();
        let error = chunk.error.unwrap();
        assert_eq!(error.message.as_deref(), Some("Rate limit reached"));
        assert_eq!(error.code_text().as_deref(), Some("429"));

        let error: WireError = serde_json::from_str(
            r#"{"message":"busy","type":"server_error","code":null}"#,
        )
        .unwrap();
        assert_eq!(error.code_text().as_deref(), Some("server_error"));
    }
}
