//! Neutral messages → DeepSeek chat messages

use serde_json::Value;
use tracing::debug;

use super::{
    ChatMessageParam, ContentPartParam, FunctionParam, ImageUrl, ToolCallParam, UserContent,
};
use crate::messages::{extract_text_content, normalize_content, ContentPart, ModelMessage};

/// Convert one neutral message to the provider schema
#[must_use]
pub fn convert_message(message: &ModelMessage) -> ChatMessageParam {
    match message {
        ModelMessage::Tool {
            content,
            tool_call_id,
        } => ChatMessageParam::Tool {
            tool_call_id: tool_call_id.clone(),
            content: match content {
                Some(Value::String(text)) => text.clone(),
                Some(other) => other.to_string(),
                None => Value::Null.to_string(),
            },
        },
        ModelMessage::Assistant {
            content,
            tool_calls,
        } => ChatMessageParam::Assistant {
            content: extract_text_content(content.as_ref()),
            tool_calls: tool_calls
                .iter()
                .map(|call| ToolCallParam {
                    id: call.id.clone(),
                    call_type: "function".to_string(),
                    function: FunctionParam {
                        name: call.function.name.clone(),
                        arguments: call.function.arguments.to_json_string(),
                    },
                })
                .collect(),
        },
        ModelMessage::User { content } => ChatMessageParam::User {
            content: convert_user_content(normalize_content(content.as_ref())),
        },
    }
}

/// Convert a message list, preserving order
#[must_use]
pub fn convert_messages(messages: &[ModelMessage]) -> Vec<ChatMessageParam> {
    messages.iter().map(convert_message).collect()
}

fn convert_user_content(parts: Vec<ContentPart>) -> UserContent {
    // A lone text part goes out as a bare string
    if let [ContentPart::Text { content }] = parts.as_slice() {
        return UserContent::Text(content.clone());
    }

    let converted: Vec<ContentPartParam> = parts
        .into_iter()
        .filter_map(|part| match part {
            ContentPart::Text { content } => Some(ContentPartParam::Text { text: content }),
            ContentPart::Image { source, metadata } => Some(ContentPartParam::ImageUrl {
                image_url: ImageUrl {
                    url: source.to_url(),
                    detail: metadata.and_then(|m| m.detail).unwrap_or_default(),
                },
            }),
            other => {
                debug!(part = ?other, "Dropping content part unsupported by DeepSeek");
                None
            }
        })
        .collect();

    if converted.is_empty() {
        UserContent::Text(String::new())
    } else {
        UserContent::Parts(converted)
    }
}
