//! DeepSeek summarization adapter
//!
//! A thin layer over [`DeepSeekTextAdapter`]: the text to summarize is sent as
//! the user message and the instructions as the system prompt.

use async_trait::async_trait;

use crate::{
    config::ClientConfig,
    error::Result,
    messages::ModelMessage,
    services::{
        collect_completion, ChunkStream, DeepSeekTextAdapter, SummarizationOptions,
        SummarizationResult, SummarizeAdapter, SummaryStyle, TextAdapter, TextOptions,
    },
};

const SUMMARY_TEMPERATURE: f32 = 0.3;

/// Build the summarization system prompt
#[must_use]
pub fn build_summarization_prompt(options: &SummarizationOptions) -> String {
    let mut prompt = String::from("You are a professional summarizer. ");

    prompt.push_str(match options.style {
        Some(SummaryStyle::BulletPoints) => "Provide a summary in bullet point format. ",
        Some(SummaryStyle::Paragraph) => "Provide a summary in paragraph format. ",
        Some(SummaryStyle::Concise) => "Provide a very concise summary in 1-2 sentences. ",
        None => "Provide a clear and concise summary. ",
    });

    if !options.focus.is_empty() {
        prompt.push_str(&format!(
            "Focus on the following aspects: {}. ",
            options.focus.join(", ")
        ));
    }

    if let Some(max_length) = options.max_length {
        prompt.push_str(&format!("Keep the summary under {max_length} tokens. "));
    }

    prompt
}

/// DeepSeek summarization adapter
pub struct DeepSeekSummarizeAdapter {
    text: DeepSeekTextAdapter,
}

impl DeepSeekSummarizeAdapter {
    /// Create an adapter from a resolved config
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built from `config`
    pub fn new(config: ClientConfig, model: impl Into<String>) -> Result<Self> {
        Ok(Self::from_text_adapter(DeepSeekTextAdapter::new(config, model)?))
    }

    #[must_use]
    pub const fn from_text_adapter(text: DeepSeekTextAdapter) -> Self {
        Self { text }
    }

    fn text_options(&self, options: &SummarizationOptions) -> TextOptions {
        let model = if options.model.trim().is_empty() {
            self.text.model().to_string()
        } else {
            options.model.clone()
        };

        TextOptions {
            max_tokens: options.max_length,
            ..TextOptions::new(model, vec![ModelMessage::user(options.text.as_str())])
                .with_system_prompt(build_summarization_prompt(options))
                .with_temperature(SUMMARY_TEMPERATURE)
        }
    }
}

#[async_trait]
impl SummarizeAdapter for DeepSeekSummarizeAdapter {
    fn name(&self) -> &str {
        self.text.name()
    }

    fn model(&self) -> &str {
        self.text.model()
    }

    async fn summarize(&self, options: SummarizationOptions) -> Result<SummarizationResult> {
        let completion = collect_completion(self.summarize_stream(options)).await?;
        Ok(SummarizationResult {
            id: completion.id,
            model: completion.model,
            summary: completion.content,
            usage: completion.usage,
        })
    }

    fn summarize_stream(&self, options: SummarizationOptions) -> ChunkStream {
        self.text.chat_stream(self.text_options(&options))
    }
}

/// Create a summarize adapter with an explicit API key
///
/// # Errors
///
/// Returns an error if no key can be resolved or the HTTP client cannot be built
pub fn create_deepseek_summarize(
    model: impl Into<String>,
    api_key: impl Into<String>,
    base_url: Option<String>,
) -> Result<DeepSeekSummarizeAdapter> {
    Ok(DeepSeekSummarizeAdapter::from_text_adapter(
        super::create_deepseek_text(model, api_key, base_url)?,
    ))
}

/// Create a summarize adapter from `DEEPSEEK_API_KEY` / `DEEPSEEK_BASE_URL`
///
/// # Errors
///
/// Returns [`crate::error::DeepSeekError::MissingApiKey`] if the key is unset
pub fn deepseek_summarize(model: impl Into<String>) -> Result<DeepSeekSummarizeAdapter> {
    DeepSeekSummarizeAdapter::new(ClientConfig::from_env()?, model)
}
