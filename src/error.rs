//! Error types for the DeepSeek adapters

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`DeepSeekError`]
pub type Result<T> = std::result::Result<T, DeepSeekError>;

/// Main error type for the DeepSeek adapters
#[derive(Debug, Error)]
pub enum DeepSeekError {
    /// No API key was supplied and the environment does not provide one
    #[error(
        "{env_var} is required. Please set it in your environment variables or use \
         create_deepseek_text with an explicit API key."
    )]
    MissingApiKey { env_var: &'static str },

    /// Client configuration is unusable (bad header value, bad proxy, ...)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Settings file parse error
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// Provider option bag failed its shape checks
    #[error("Invalid provider options: {0}")]
    InvalidOptions(String),

    /// Non-success HTTP status returned by the provider
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Failure while consuming a streamed response
    #[error("Stream error: {message}")]
    Stream {
        message: String,
        code: Option<String>,
    },

    /// Structured output was not valid JSON
    #[error("Failed to parse structured output as JSON. Content: {sample}")]
    StructuredOutput { sample: String },

    /// Provider returned a completion without any choice
    #[error("No choices in response")]
    EmptyResponse,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl DeepSeekError {
    /// Machine-readable code carried into `error` stream events
    #[must_use]
    pub fn code(&self) -> Option<String> {
        match self {
            Self::Api { status, .. } => Some(status.to_string()),
            Self::Stream { code, .. } => code.clone(),
            Self::Http(e) => e.status().map(|s| s.as_u16().to_string()),
            Self::MissingApiKey { .. } => Some("missing_api_key".to_string()),
            _ => None,
        }
    }
}

impl From<String> for DeepSeekError {
    fn from(s: String) -> Self {
        DeepSeekError::Other(s)
    }
}

impl From<&str> for DeepSeekError {
    fn from(s: &str) -> Self {
        DeepSeekError::Other(s.to_string())
    }
}
