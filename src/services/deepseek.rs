//! DeepSeek text adapter
//!
//! Talks to the OpenAI-compatible `/chat/completions` endpoint. Streaming
//! calls are reassembled by [`DeepSeekStreamHandler`]; structured output uses
//! a single JSON-mode request.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{
    config::ClientConfig,
    error::{DeepSeekError, Result},
    services::{
        adapters::options::{map_text_options, ChatCompletionRequest},
        streaming::{DeepSeekStreamHandler, SseDecoder, WireUsage},
        ChunkStream, StructuredOutputOptions, StructuredOutputResult, TextAdapter, TextOptions,
    },
};

/// Longest prefix of unparseable output quoted in errors
const SAMPLE_CHARS: usize = 200;

/// Single-shot chat completion response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub message: CompletionMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

/// Provider error envelope
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// DeepSeek chat adapter
pub struct DeepSeekTextAdapter {
    client: Client,
    config: ClientConfig,
    model: String,
}

impl DeepSeekTextAdapter {
    /// Create an adapter from a resolved config
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built from `config`
    pub fn new(config: ClientConfig, model: impl Into<String>) -> Result<Self> {
        let client = config.build_http_client()?;
        Ok(Self {
            client,
            config,
            model: model.into(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fill in the adapter's model when the request names none
    fn with_default_model(&self, mut options: TextOptions) -> TextOptions {
        if options.model.trim().is_empty() {
            options.model.clone_from(&self.model);
        }
        options
    }

    async fn send(
        client: &Client,
        url: &str,
        body: &ChatCompletionRequest,
    ) -> Result<reqwest::Response> {
        debug!(
            url,
            model = %body.model,
            stream = body.stream,
            messages = body.messages.len(),
            "Sending DeepSeek request"
        );

        let response = client.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &text));
        }

        Ok(response)
    }
}

/// Build an API error, preferring the provider's own message
fn api_error(status: u16, body: &str) -> DeepSeekError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string());
    DeepSeekError::Api { status, message }
}

/// First `SAMPLE_CHARS` characters, with `...` when cut
fn sample(text: &str) -> String {
    let mut prefix: String = text.chars().take(SAMPLE_CHARS).collect();
    if text.chars().nth(SAMPLE_CHARS).is_some() {
        prefix.push_str("...");
    }
    prefix
}

/// Parse a single-shot completion as a structured result
///
/// # Errors
///
/// Returns [`DeepSeekError::EmptyResponse`] without choices and
/// [`DeepSeekError::StructuredOutput`] when the content is not JSON
pub fn parse_structured_completion(completion: ChatCompletion) -> Result<StructuredOutputResult> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or(DeepSeekError::EmptyResponse)?;
    let raw_text = choice.message.content.unwrap_or_default();

    let data = serde_json::from_str(&raw_text).map_err(|_| DeepSeekError::StructuredOutput {
        sample: sample(&raw_text),
    })?;

    Ok(StructuredOutputResult {
        data,
        raw_text,
        reasoning: choice.message.reasoning_content,
    })
}

#[async_trait]
impl TextAdapter for DeepSeekTextAdapter {
    fn name(&self) -> &str {
        "deepseek"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn chat_stream(&self, options: TextOptions) -> ChunkStream {
        let client = self.client.clone();
        let url = self.config.chat_completions_url();
        let options = self.with_default_model(options);

        Box::pin(async_stream::stream! {
            let mut handler = DeepSeekStreamHandler::new(options.model.clone());

            let opened = match map_text_options(&options) {
                Ok(request) => Self::send(&client, &url, &request).await,
                Err(e) => Err(e),
            };
            let response = match opened {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, model = %options.model, "DeepSeek request failed");
                    if let Some(event) = handler.fail(&e) {
                        yield Ok(event);
                    }
                    yield Err(e);
                    return;
                }
            };

            let mut decoder = SseDecoder::new();
            let mut body = Box::pin(response.bytes_stream());
            let mut failure: Option<DeepSeekError> = None;

            'read: while let Some(next) = body.next().await {
                let bytes = match next {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        failure = Some(e.into());
                        break;
                    }
                };

                for event in decoder.feed(&bytes) {
                    if event.is_done_marker() {
                        break 'read;
                    }
                    match handler.process_event(&event) {
                        Ok(chunks) => {
                            for chunk in chunks {
                                yield Ok(chunk);
                            }
                        }
                        Err(e) => {
                            failure = Some(e);
                            break 'read;
                        }
                    }
                    if handler.is_finished() {
                        break 'read;
                    }
                }
            }

            if failure.is_none() && !handler.is_finished() {
                if let Some(event) = decoder.finish().filter(|event| !event.is_done_marker()) {
                    match handler.process_event(&event) {
                        Ok(chunks) => {
                            for chunk in chunks {
                                yield Ok(chunk);
                            }
                        }
                        Err(e) => failure = Some(e),
                    }
                }
            }

            if failure.is_none() && !handler.is_finished() {
                failure = Some(DeepSeekError::Stream {
                    message: "stream ended before a finish reason was received".to_string(),
                    code: None,
                });
            }

            if let Some(e) = failure {
                warn!(error = %e, id = handler.id(), "DeepSeek stream failed");
                if let Some(event) = handler.fail(&e) {
                    yield Ok(event);
                }
                yield Err(e);
            }
        })
    }

    async fn structured_output(
        &self,
        options: StructuredOutputOptions,
    ) -> Result<StructuredOutputResult> {
        let chat_options = self.with_default_model(options.chat_options);
        let request = map_text_options(&chat_options)?.into_structured(&options.output_schema)?;

        let url = self.config.chat_completions_url();
        let response = Self::send(&self.client, &url, &request).await?;
        let completion: ChatCompletion = response.json().await?;

        parse_structured_completion(completion).inspect_err(|e| {
            error!(error = %e, model = %chat_options.model, "Structured output failed");
        })
    }
}

/// Create a text adapter with an explicit API key
///
/// # Errors
///
/// Returns [`DeepSeekError::MissingApiKey`] if `api_key` is empty and
/// `DEEPSEEK_API_KEY` is unset, or an error if the HTTP client cannot be built
pub fn create_deepseek_text(
    model: impl Into<String>,
    api_key: impl Into<String>,
    base_url: Option<String>,
) -> Result<DeepSeekTextAdapter> {
    let config = ClientConfig::resolve(Some(api_key.into()), base_url, |name| {
        std::env::var(name).ok()
    })?;
    DeepSeekTextAdapter::new(config, model)
}

/// Create a text adapter from `DEEPSEEK_API_KEY` / `DEEPSEEK_BASE_URL`
///
/// # Errors
///
/// Returns [`DeepSeekError::MissingApiKey`] if `DEEPSEEK_API_KEY` is unset
pub fn deepseek_text(model: impl Into<String>) -> Result<DeepSeekTextAdapter> {
    DeepSeekTextAdapter::new(ClientConfig::from_env()?, model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ModelMessage;
    use serde_json::json;

    fn completion(content: Option<&str>, reasoning: Option<&str>) -> ChatCompletion {
        ChatCompletion {
            id: Some("chatcmpl-1".into()),
            model: Some("deepseek-chat".into()),
            choices: vec![CompletionChoice {
                message: CompletionMessage {
                    content: content.map(str::to_string),
                    reasoning_content: reasoning.map(str::to_string),
                },
                finish_reason: Some("stop".into()),
            }],
            usage: None,
        }
    }

    #[test]
    fn test_parse_structured_completion() {
        let result =
            parse_structured_completion(completion(Some(r#"{"name":"Ada"}"#), Some("easy")))
                .unwrap();
        assert_eq!(result.data, json!({"name": "Ada"}));
        assert_eq!(result.raw_text, r#"{"name":"Ada"}"#);
        assert_eq!(result.reasoning.as_deref(), Some("easy"));
    }

    #[test]
    fn test_structured_parse_failure_quotes_prefix() {
        let text = "x".repeat(500);
        let err = parse_structured_completion(completion(Some(&text), None)).unwrap_err();
        let DeepSeekError::StructuredOutput { sample } = &err else {
            panic!("Expected structured output error, got {err:?}");
        };
        assert_eq!(sample.len(), SAMPLE_CHARS + 3);
        assert!(sample.ends_with("..."));
        assert!(err.to_string().contains(&"x".repeat(SAMPLE_CHARS)));
    }

    #[test]
    fn test_short_sample_is_not_marked() {
        assert_eq!(sample("Sure! Here you go"), "Sure! Here you go");
        assert_eq!(sample(&"é".repeat(SAMPLE_CHARS)), "é".repeat(SAMPLE_CHARS));
    }

    #[test]
    fn test_missing_content_is_a_parse_failure() {
        let err = parse_structured_completion(completion(None, None)).unwrap_err();
        assert!(matches!(err, DeepSeekError::StructuredOutput { .. }));

        let err = parse_structured_completion(ChatCompletion::default()).unwrap_err();
        assert!(matches!(err, DeepSeekError::EmptyResponse));
    }

    #[test]
    fn test_api_error_prefers_provider_message() {
        let body = json!({
            "error": {"message": "Authentication Fails", "type": "authentication_error"}
        });
        let err = api_error(401, &body.to_string());
        assert!(matches!(
            &err,
            DeepSeekError::Api { status: 401, message } if message == "Authentication Fails"
        ));
        assert_eq!(err.code().as_deref(), Some("401"));

        let err = api_error(502, "Bad Gateway");
        assert!(matches!(&err, DeepSeekError::Api { message, .. } if message == "Bad Gateway"));
    }

    #[test]
    fn test_default_model_fills_empty_request_model() {
        let adapter =
            DeepSeekTextAdapter::new(ClientConfig::new("sk-test"), "deepseek-reasoner").unwrap();
        assert_eq!(adapter.name(), "deepseek");

        let filled =
            adapter.with_default_model(TextOptions::new("", vec![ModelMessage::user("hi")]));
        assert_eq!(filled.model, "deepseek-reasoner");

        let kept = adapter.with_default_model(TextOptions::new("deepseek-chat", vec![]));
        assert_eq!(kept.model, "deepseek-chat");
    }

    #[test]
    fn test_explicit_key_factory() {
        let adapter = create_deepseek_text(
            "deepseek-chat",
            "sk-explicit",
            Some("http://localhost:9999/".into()),
        )
        .unwrap();
        assert_eq!(adapter.model(), "deepseek-chat");
        assert_eq!(
            adapter.config().chat_completions_url(),
            "http://localhost:9999/chat/completions"
        );
    }
}
