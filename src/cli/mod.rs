//! CLI argument parsing and command routing

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::{
    config::{self, API_KEY_ENV, BASE_URL_ENV},
    services::SummaryStyle,
};

/// DeepSeek chat adapter command line
#[derive(Debug, Parser)]
#[command(name = "deepseek")]
#[command(about = "Chat, summarize and generate JSON with DeepSeek models", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// API key
    #[arg(long, global = true, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// API base URL
    #[arg(long, global = true, env = BASE_URL_ENV)]
    pub base_url: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Stream a chat completion
    Chat {
        /// User message
        prompt: String,

        /// Model to use (defaults to the configured model)
        #[arg(short, long)]
        model: Option<String>,

        /// System prompt
        #[arg(short, long)]
        system: Option<String>,

        /// Enable thinking mode
        #[arg(long)]
        thinking: bool,

        #[arg(long)]
        temperature: Option<f32>,

        #[arg(long)]
        max_tokens: Option<u32>,
    },

    /// Summarize text (`-` reads stdin)
    Summarize {
        text: String,

        #[arg(short, long)]
        model: Option<String>,

        #[arg(long, value_enum)]
        style: Option<StyleArg>,

        /// Aspect to focus on (repeatable)
        #[arg(long)]
        focus: Vec<String>,

        /// Upper bound on summary tokens
        #[arg(long)]
        max_length: Option<u32>,
    },

    /// Generate JSON matching a schema
    Json {
        prompt: String,

        /// JSON schema file
        #[arg(long, value_name = "FILE")]
        schema: PathBuf,

        #[arg(short, long)]
        model: Option<String>,
    },

    /// List supported models
    Models,

    /// Show version information
    Version,
}

/// Summary style flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StyleArg {
    BulletPoints,
    Paragraph,
    Concise,
}

impl From<StyleArg> for SummaryStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::BulletPoints => Self::BulletPoints,
            StyleArg::Paragraph => Self::Paragraph,
            StyleArg::Concise => Self::Concise,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Settings file in effect
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config::settings_path)
    }

    /// Run the selected command
    ///
    /// # Errors
    ///
    /// Returns configuration, request and stream errors from the command
    pub async fn execute(self) -> crate::Result<()> {
        commands::execute(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat() {
        let cli = Cli::try_parse_from([
            "deepseek",
            "--api-key",
            "sk-test",
            "chat",
            "hello",
            "--thinking",
            "--max-tokens",
            "64",
        ])
        .unwrap();
        assert_eq!(cli.api_key.as_deref(), Some("sk-test"));
        match cli.command {
            Commands::Chat {
                prompt,
                thinking,
                max_tokens,
                model,
                ..
            } => {
                assert_eq!(prompt, "hello");
                assert!(thinking);
                assert_eq!(max_tokens, Some(64));
                assert!(model.is_none());
            }
            other => panic!("Expected chat, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_summarize_style() {
        let cli = Cli::try_parse_from([
            "deepseek",
            "summarize",
            "-",
            "--style",
            "bullet-points",
            "--focus",
            "cost",
            "--focus",
            "risk",
        ])
        .unwrap();
        let Commands::Summarize { style, focus, .. } = cli.command else {
            panic!("Expected summarize");
        };
        assert_eq!(style.map(SummaryStyle::from), Some(SummaryStyle::BulletPoints));
        assert_eq!(focus, vec!["cost", "risk"]);
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["deepseek"]).is_err());
    }
}
