//! Provider-neutral message types
//!
//! These are the shapes a host system hands to an adapter: role-tagged
//! messages whose content is either plain text or an ordered list of typed
//! multimodal parts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message role in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Where the bytes of a non-text part live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentSource {
    /// Remote resource (or an already formed `data:` URI)
    Url { value: String },
    /// Inline base64 payload
    Data {
        value: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ContentSource {
    /// Render the source as a URL the provider accepts
    #[must_use]
    pub fn to_url(&self) -> String {
        match self {
            Self::Url { value } => value.clone(),
            Self::Data { value, .. } if value.starts_with("data:") => value.clone(),
            Self::Data { value, mime_type } => format!("data:{mime_type};base64,{value}"),
        }
    }
}

/// Image resolution hint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    #[default]
    Auto,
    Low,
    High,
}

/// Metadata for image parts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ImageDetail>,
}

/// Audio container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Wav,
    Flac,
    Ogg,
    Webm,
    Aac,
}

/// Metadata for audio parts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<AudioFormat>,
}

/// A typed piece of multimodal content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text {
        content: String,
    },
    Image {
        source: ContentSource,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<ImageMetadata>,
    },
    Audio {
        source: ContentSource,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<AudioMetadata>,
    },
    Video {
        source: ContentSource,
    },
    Document {
        source: ContentSource,
    },
}

impl ContentPart {
    /// Create a text part
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Create an image part pointing at a URL
    #[must_use]
    pub fn image_url(url: impl Into<String>) -> Self {
        Self::Image {
            source: ContentSource::Url { value: url.into() },
            metadata: None,
        }
    }

    /// Create an image part from raw bytes, base64-encoding them inline
    #[must_use]
    pub fn image_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        use base64::Engine as _;

        Self::Image {
            source: ContentSource::Data {
                value: base64::engine::general_purpose::STANDARD.encode(bytes),
                mime_type: mime_type.into(),
            },
            metadata: None,
        }
    }

    /// Attach a detail hint to an image part; other parts are returned as-is
    #[must_use]
    pub fn with_detail(self, detail: ImageDetail) -> Self {
        match self {
            Self::Image { source, .. } => Self::Image {
                source,
                metadata: Some(ImageMetadata {
                    detail: Some(detail),
                }),
            },
            other => other,
        }
    }

    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}

/// Message content: a bare string or an ordered part list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<ContentPart>> for MessageContent {
    fn from(parts: Vec<ContentPart>) -> Self {
        Self::Parts(parts)
    }
}

/// Normalize optional content to a part list; null becomes empty
#[must_use]
pub fn normalize_content(content: Option<&MessageContent>) -> Vec<ContentPart> {
    match content {
        None => Vec::new(),
        Some(MessageContent::Text(text)) => vec![ContentPart::text(text.clone())],
        Some(MessageContent::Parts(parts)) => parts.clone(),
    }
}

/// Concatenate the text parts of optional content, dropping everything else
#[must_use]
pub fn extract_text_content(content: Option<&MessageContent>) -> String {
    match content {
        None => String::new(),
        Some(MessageContent::Text(text)) => text.clone(),
        Some(MessageContent::Parts(parts)) => parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { content } => Some(content.as_str()),
                _ => None,
            })
            .collect(),
    }
}

/// Arguments of a tool call: raw JSON text or an already decoded value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolArguments {
    Text(String),
    Json(Value),
}

impl ToolArguments {
    /// Argument text as sent on the wire
    #[must_use]
    pub fn to_json_string(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Json(value) => value.to_string(),
        }
    }

    /// Decode the arguments into a JSON value
    ///
    /// # Errors
    ///
    /// Returns an error when textual arguments are not valid JSON
    pub fn parse(&self) -> serde_json::Result<Value> {
        match self {
            Self::Text(text) => serde_json::from_str(text),
            Self::Json(value) => Ok(value.clone()),
        }
    }
}

impl Default for ToolArguments {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<String> for ToolArguments {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Value> for ToolArguments {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// Function invoked by a tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: ToolArguments,
}

/// A tool call requested by the assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

impl ToolCall {
    /// Create a function tool call
    #[must_use]
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<ToolArguments>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ModelMessage {
    User {
        content: Option<MessageContent>,
    },
    Assistant {
        content: Option<MessageContent>,
        #[serde(default, rename = "toolCalls", skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        content: Option<Value>,
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
    },
}

impl ModelMessage {
    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::User {
            content: Some(content.into()),
        }
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Create an assistant message that only requests tools
    #[must_use]
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: None,
            tool_calls,
        }
    }

    /// Create a tool result message
    #[must_use]
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<Value>) -> Self {
        Self::Tool {
            content: Some(content.into()),
            tool_call_id: tool_call_id.into(),
        }
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::Tool { .. } => Role::Tool,
        }
    }

    /// Plain text of the message (text parts only)
    #[must_use]
    pub fn text_content(&self) -> String {
        match self {
            Self::User { content } | Self::Assistant { content, .. } => {
                extract_text_content(content.as_ref())
            }
            Self::Tool { content, .. } => match content {
                Some(Value::String(text)) => text.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            },
        }
    }
}
