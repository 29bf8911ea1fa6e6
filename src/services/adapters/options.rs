//! Neutral request → DeepSeek chat completion request

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{messages::convert_messages, tools::convert_tools, ChatMessageParam, FunctionTool};
use crate::{
    config::REASONER_MODEL,
    error::{DeepSeekError, Result},
    services::TextOptions,
};

/// One stop sequence or several
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopSequences {
    One(String),
    Many(Vec<String>),
}

/// DeepSeek-specific option bag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextProviderOptions {
    /// End-user identifier for abuse monitoring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Temperature (0-2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// -2.0 to 2.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,

    /// -2.0 to 2.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopSequences>,

    /// Chain-of-thought output; always on for `deepseek-reasoner`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<bool>,
}

impl TextProviderOptions {
    #[must_use]
    pub fn thinking() -> Self {
        Self {
            thinking: Some(true),
            ..Self::default()
        }
    }

    /// Shape checks on the option bag
    ///
    /// Deliberately permissive: range and business rules are left to the API.
    ///
    /// # Errors
    ///
    /// Returns [`DeepSeekError::InvalidOptions`] when the model is missing
    pub fn validate(&self, model: &str) -> Result<()> {
        if model.trim().is_empty() {
            return Err(DeepSeekError::InvalidOptions(
                "model identifier is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Whether the request runs in thinking mode
#[must_use]
pub fn should_enable_thinking(model: &str, options: Option<&TextProviderOptions>) -> bool {
    model == REASONER_MODEL || options.and_then(|o| o.thinking).unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOptions {
    pub include_usage: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThinkingConfig {
    #[serde(rename = "type")]
    pub thinking_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraBody {
    pub thinking: ThinkingConfig,
}

impl ExtraBody {
    #[must_use]
    pub fn thinking_enabled() -> Self {
        Self {
            thinking: ThinkingConfig {
                thinking_type: "enabled".to_string(),
            },
        }
    }
}

/// Chat completion request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessageParam>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopSequences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<FunctionTool>>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_body: Option<ExtraBody>,
}

impl ChatCompletionRequest {
    /// Whether thinking mode is switched on
    #[must_use]
    pub fn thinking_enabled(&self) -> bool {
        self.extra_body.is_some()
    }

    /// Turn a streaming request into a single-shot JSON-mode request
    ///
    /// The schema instruction is appended to the first system message, or
    /// becomes the first message when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be pretty-printed
    pub fn into_structured(mut self, schema: &Value) -> Result<Self> {
        let instruction = format!(
            "You must respond with valid JSON that matches this exact schema:\n\n{}\n\n\
             Respond only with the JSON object, no additional text.",
            serde_json::to_string_pretty(schema)?
        );

        let system_index = self
            .messages
            .iter()
            .position(|msg| matches!(msg, ChatMessageParam::System { .. }));
        match system_index {
            Some(index) => {
                if let ChatMessageParam::System { content } = &mut self.messages[index] {
                    content.push_str("\n\n");
                    content.push_str(&instruction);
                }
            }
            None => self.messages.insert(
                0,
                ChatMessageParam::System {
                    content: instruction,
                },
            ),
        }

        self.stream = false;
        self.stream_options = None;
        self.response_format = Some(ResponseFormat {
            format_type: "json_object".to_string(),
        });
        Ok(self)
    }
}

/// Build the streaming request for a neutral chat request
///
/// # Errors
///
/// Returns an error if the option bag fails validation
pub fn map_text_options(options: &TextOptions) -> Result<ChatCompletionRequest> {
    let bag = options.model_options.as_ref();
    if let Some(bag) = bag {
        bag.validate(&options.model)?;
    }

    let mut messages = Vec::with_capacity(options.messages.len() + 1);
    if !options.system_prompts.is_empty() {
        messages.push(ChatMessageParam::System {
            content: options.system_prompts.join("\n"),
        });
    }
    messages.extend(convert_messages(&options.messages));

    let thinking = should_enable_thinking(&options.model, bag);
    debug!(
        model = %options.model,
        messages = messages.len(),
        tools = options.tools.len(),
        thinking,
        "Mapped chat request"
    );

    Ok(ChatCompletionRequest {
        model: options.model.clone(),
        messages,
        temperature: options.temperature.or_else(|| bag.and_then(|b| b.temperature)),
        max_tokens: options.max_tokens.or_else(|| bag.and_then(|b| b.max_tokens)),
        top_p: options.top_p.or_else(|| bag.and_then(|b| b.top_p)),
        frequency_penalty: bag.and_then(|b| b.frequency_penalty),
        presence_penalty: bag.and_then(|b| b.presence_penalty),
        stop: bag.and_then(|b| b.stop.clone()),
        user: bag.and_then(|b| b.user.clone()),
        tools: if options.tools.is_empty() {
            None
        } else {
            Some(convert_tools(&options.tools))
        },
        stream: true,
        stream_options: Some(StreamOptions {
            include_usage: true,
        }),
        response_format: None,
        extra_body: thinking.then(ExtraBody::thinking_enabled),
    })
}
