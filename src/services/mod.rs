//! Service layer: provider-neutral request/event types and adapter traits
//!
//! A host system speaks [`TextOptions`] in and [`StreamChunk`] out; the
//! DeepSeek adapters translate both directions to the provider's
//! OpenAI-compatible chat completion API.

pub mod adapters;
pub mod deepseek;
pub mod streaming;
pub mod summarize;

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use self::{
    adapters::options::{StopSequences, TextProviderOptions},
    deepseek::{create_deepseek_text, deepseek_text, DeepSeekTextAdapter},
    summarize::{create_deepseek_summarize, deepseek_summarize, DeepSeekSummarizeAdapter},
};
use crate::{
    error::{DeepSeekError, Result},
    messages::{ModelMessage, Role, ToolCall},
};

/// Tool definition in the host's canonical shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments
    #[serde(default, rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl ToolDefinition {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: Some(input_schema),
        }
    }
}

/// A provider-neutral chat request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOptions {
    pub model: String,
    pub messages: Vec<ModelMessage>,
    #[serde(default)]
    pub system_prompts: Vec<String>,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Provider-specific option bag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_options: Option<TextProviderOptions>,
}

impl TextOptions {
    #[must_use]
    pub fn new(model: impl Into<String>, messages: Vec<ModelMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompts.push(prompt.into());
        self
    }

    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    #[must_use]
    pub const fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    #[must_use]
    pub fn with_model_options(mut self, options: TextProviderOptions) -> Self {
        self.model_options = Some(options);
        self
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Why a response ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    ToolCalls,
}

/// Error payload of an `error` chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A provider-neutral streaming event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum StreamChunk {
    /// Answer text delta plus everything accumulated so far
    Content {
        id: String,
        model: String,
        timestamp: i64,
        delta: String,
        content: String,
        role: Role,
    },

    /// Reasoning text delta plus everything accumulated so far
    Thinking {
        id: String,
        model: String,
        timestamp: i64,
        delta: String,
        content: String,
    },

    /// A fully assembled tool call
    ToolCall {
        id: String,
        model: String,
        timestamp: i64,
        index: u32,
        tool_call: ToolCall,
    },

    /// Stream completed
    Done {
        id: String,
        model: String,
        timestamp: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
        finish_reason: FinishReason,
    },

    /// Stream failed; nothing follows
    Error {
        id: String,
        model: String,
        timestamp: i64,
        error: ChunkError,
    },
}

impl StreamChunk {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Content { id, .. }
            | Self::Thinking { id, .. }
            | Self::ToolCall { id, .. }
            | Self::Done { id, .. }
            | Self::Error { id, .. } => id,
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        match self {
            Self::Content { model, .. }
            | Self::Thinking { model, .. }
            | Self::ToolCall { model, .. }
            | Self::Done { model, .. }
            | Self::Error { model, .. } => model,
        }
    }

    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        match self {
            Self::Content { timestamp, .. }
            | Self::Thinking { timestamp, .. }
            | Self::ToolCall { timestamp, .. }
            | Self::Done { timestamp, .. }
            | Self::Error { timestamp, .. } => *timestamp,
        }
    }

    /// Whether this chunk ends the stream
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

/// Stream of neutral events; a failure is yielded as `Err` after its `error` chunk
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// Result of draining a chat stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResult {
    pub id: String,
    pub model: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    pub usage: Usage,
}

/// Input for structured (JSON) generation
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredOutputOptions {
    pub chat_options: TextOptions,
    /// JSON schema the response should follow
    pub output_schema: Value,
}

/// Parsed structured output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredOutputResult {
    pub data: Value,
    pub raw_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Summary presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryStyle {
    BulletPoints,
    Paragraph,
    Concise,
}

/// Input for summarization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizationOptions {
    pub model: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<SummaryStyle>,
    #[serde(default)]
    pub focus: Vec<String>,
}

/// Summarization output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizationResult {
    pub id: String,
    pub model: String,
    pub summary: String,
    pub usage: Usage,
}

/// Chat/text completion adapter
#[async_trait]
pub trait TextAdapter: Send + Sync {
    /// Provider name (e.g., "deepseek")
    fn name(&self) -> &str;

    /// Model the adapter was created for
    fn model(&self) -> &str;

    /// Stream a chat completion as neutral events
    ///
    /// Request and transport failures are reported in-band: the stream yields
    /// an `error` chunk followed by the `Err` itself.
    fn chat_stream(&self, options: TextOptions) -> ChunkStream;

    /// Run a chat completion to the end and collect the result
    async fn chat_completion(&self, options: TextOptions) -> Result<CompletionResult> {
        collect_completion(self.chat_stream(options)).await
    }

    /// Generate JSON matching `output_schema`
    async fn structured_output(
        &self,
        options: StructuredOutputOptions,
    ) -> Result<StructuredOutputResult>;
}

/// Summarization adapter
#[async_trait]
pub trait SummarizeAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    async fn summarize(&self, options: SummarizationOptions) -> Result<SummarizationResult>;

    fn summarize_stream(&self, options: SummarizationOptions) -> ChunkStream;
}

/// Drain a chunk stream, keeping the last snapshots and the final usage
///
/// # Errors
///
/// Returns the error surfaced by the stream, or a stream error if the stream
/// ends after an `error` chunk without yielding one
pub async fn collect_completion(mut stream: ChunkStream) -> Result<CompletionResult> {
    let mut result = CompletionResult {
        id: String::new(),
        model: String::new(),
        content: String::new(),
        reasoning: None,
        tool_calls: Vec::new(),
        finish_reason: None,
        usage: Usage::default(),
    };
    let mut failure: Option<ChunkError> = None;

    while let Some(item) = stream.next().await {
        match item? {
            StreamChunk::Content {
                id, model, content, ..
            } => {
                result.id = id;
                result.model = model;
                result.content = content;
            }
            StreamChunk::Thinking { content, .. } => result.reasoning = Some(content),
            StreamChunk::ToolCall { tool_call, .. } => result.tool_calls.push(tool_call),
            StreamChunk::Done {
                id,
                model,
                usage,
                finish_reason,
                ..
            } => {
                result.id = id;
                result.model = model;
                result.finish_reason = Some(finish_reason);
                if let Some(usage) = usage {
                    result.usage = usage;
                }
            }
            StreamChunk::Error { error, .. } => failure = Some(error),
        }
    }

    match failure {
        Some(error) => Err(DeepSeekError::Stream {
            message: error.message,
            code: error.code,
        }),
        None => Ok(result),
    }
}

/// Unique id of the form `<prefix>-<millis>-<random>`
#[must_use]
pub fn generate_id(prefix: &str) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{prefix}-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        &random[..7]
    )
}
