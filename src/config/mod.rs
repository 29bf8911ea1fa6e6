//! Configuration for the DeepSeek adapters
//!
//! Values are resolved in layers, highest priority first:
//! 1. Explicit values (factory arguments, CLI flags)
//! 2. Environment variables (`DEEPSEEK_API_KEY`, `DEEPSEEK_BASE_URL`)
//! 3. Settings file (`<config dir>/deepseek/config.json`)
//!
//! The environment is read exactly once, through an injectable lookup, so the
//! adapters never touch process-wide state after construction.

pub mod models;
pub mod settings;

use std::{path::PathBuf, time::Duration};

use reqwest::{header, Client};

pub use self::{
    models::{
        Capability, Modality, ModelMeta, Pricing, DEEPSEEK_CHAT_MODELS, MODELS, REASONER_MODEL,
    },
    settings::Settings,
};
use crate::error::{DeepSeekError, Result};

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// Environment variable overriding the API base URL
pub const BASE_URL_ENV: &str = "DEEPSEEK_BASE_URL";

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";

/// Connection settings shared by every adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API key sent as a bearer token
    pub api_key: String,

    /// Custom API endpoint (optional)
    pub base_url: Option<String>,

    /// Overall request timeout
    pub timeout: Option<Duration>,

    /// HTTP proxy
    pub proxy: Option<String>,
}

impl ClientConfig {
    /// Create a config with an explicit API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            timeout: None,
            proxy: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Resolve the config from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`DeepSeekError::MissingApiKey`] if `DEEPSEEK_API_KEY` is unset
    pub fn from_env() -> Result<Self> {
        Self::resolve(None, None, |name| std::env::var(name).ok())
    }

    /// Resolve the config from explicit values, falling back to `lookup`
    ///
    /// Empty strings count as absent.
    ///
    /// # Errors
    ///
    /// Returns [`DeepSeekError::MissingApiKey`] if neither source has a key
    pub fn resolve<F>(api_key: Option<String>, base_url: Option<String>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let api_key = non_empty(api_key)
            .or_else(|| non_empty(lookup(API_KEY_ENV)))
            .ok_or(DeepSeekError::MissingApiKey {
                env_var: API_KEY_ENV,
            })?;
        let base_url = non_empty(base_url).or_else(|| non_empty(lookup(BASE_URL_ENV)));

        Ok(Self {
            api_key,
            base_url,
            timeout: None,
            proxy: None,
        })
    }

    /// Get the effective base URL (custom or default), without trailing slash
    #[must_use]
    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    /// Chat completion endpoint
    #[must_use]
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.effective_base_url())
    }

    /// Build an HTTP client carrying the bearer token
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not a valid header value, the proxy URL
    /// is malformed, or the TLS backend fails to initialize
    pub fn build_http_client(&self) -> Result<Client> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|_| DeepSeekError::InvalidConfig("Invalid API key format".to_string()))?,
        );

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(proxy) = &self.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| DeepSeekError::InvalidConfig(format!("Invalid proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }

        Ok(builder.build()?)
    }
}

/// Get the configuration directory path
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("deepseek")
}

/// Get the settings file path
#[must_use]
pub fn settings_path() -> PathBuf {
    config_dir().join("config.json")
}
