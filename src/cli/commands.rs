//! Command execution

use std::io::{self, Read, Write};

use futures::StreamExt;
use serde_json::Value;
use tracing::debug;

use super::{Cli, Commands};
use crate::{
    config::{ClientConfig, Settings, MODELS},
    error::{DeepSeekError, Result},
    messages::ModelMessage,
    services::{
        DeepSeekSummarizeAdapter, DeepSeekTextAdapter, StreamChunk, StructuredOutputOptions,
        SummarizationOptions, SummarizeAdapter, TextAdapter, TextOptions, TextProviderOptions,
    },
};

pub(super) async fn execute(cli: Cli) -> Result<()> {
    let settings = Settings::load_from_path(&cli.settings_path())?;

    match cli.command {
        Commands::Models => {
            print_models();
            Ok(())
        }
        Commands::Version => {
            println!("deepseek-adapter version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Chat {
            prompt,
            model,
            system,
            thinking,
            temperature,
            max_tokens,
        } => {
            let config = client_config(cli.api_key, cli.base_url, &settings)?;
            let model = model.unwrap_or_else(|| settings.default_model.clone());
            let adapter = DeepSeekTextAdapter::new(config, model.clone())?;

            let mut options = TextOptions::new(model, vec![ModelMessage::user(prompt)]);
            if let Some(system) = system {
                options = options.with_system_prompt(system);
            }
            if thinking {
                options = options.with_model_options(TextProviderOptions {
                    thinking: Some(true),
                    ..TextProviderOptions::default()
                });
            }
            options.temperature = temperature;
            options.max_tokens = max_tokens;

            run_chat(&adapter, options, cli.verbose || settings.verbose).await
        }
        Commands::Summarize {
            text,
            model,
            style,
            focus,
            max_length,
        } => {
            let config = client_config(cli.api_key, cli.base_url, &settings)?;
            let model = model.unwrap_or_else(|| settings.default_model.clone());
            let adapter = DeepSeekSummarizeAdapter::new(config, model.clone())?;

            let result = adapter
                .summarize(SummarizationOptions {
                    model,
                    text: read_text(text)?,
                    max_length,
                    style: style.map(Into::into),
                    focus,
                })
                .await?;
            println!("{}", result.summary);
            debug!(usage = ?result.usage, "Summary complete");
            Ok(())
        }
        Commands::Json {
            prompt,
            schema,
            model,
        } => {
            let output_schema: Value = serde_json::from_str(&std::fs::read_to_string(&schema)?)?;
            let config = client_config(cli.api_key, cli.base_url, &settings)?;
            let model = model.unwrap_or_else(|| settings.default_model.clone());
            let adapter = DeepSeekTextAdapter::new(config, model.clone())?;

            let result = adapter
                .structured_output(StructuredOutputOptions {
                    chat_options: TextOptions::new(model, vec![ModelMessage::user(prompt)]),
                    output_schema,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&result.data)?);
            Ok(())
        }
    }
}

/// Flags and environment first, settings file second
fn client_config(
    api_key: Option<String>,
    base_url: Option<String>,
    settings: &Settings,
) -> Result<ClientConfig> {
    let config = ClientConfig::resolve(api_key, base_url, |name| std::env::var(name).ok())?;
    Ok(settings.apply_to(config))
}

async fn run_chat(
    adapter: &DeepSeekTextAdapter,
    options: TextOptions,
    verbose: bool,
) -> Result<()> {
    let mut stream = adapter.chat_stream(options);
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();

    while let Some(chunk) = stream.next().await {
        match chunk? {
            StreamChunk::Thinking { delta, .. } => {
                write!(stderr, "{delta}")?;
                stderr.flush()?;
            }
            StreamChunk::Content { delta, .. } => {
                write!(stdout, "{delta}")?;
                stdout.flush()?;
            }
            StreamChunk::ToolCall { tool_call, .. } => {
                writeln!(
                    stdout,
                    "\n[tool call] {}({})",
                    tool_call.function.name,
                    tool_call.function.arguments.to_json_string()
                )?;
            }
            StreamChunk::Done {
                usage,
                finish_reason,
                ..
            } => {
                writeln!(stdout)?;
                if verbose {
                    if let Some(usage) = usage {
                        eprintln!(
                            "[{finish_reason:?}] prompt={} completion={} total={}",
                            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
                        );
                    }
                }
            }
            // The stream yields the error itself right after this event
            StreamChunk::Error { .. } => {}
        }
    }

    Ok(())
}

fn print_models() {
    println!("{:<20} {:>10}  {:>8} {:>8}", "MODEL", "CONTEXT", "INPUT", "OUTPUT");
    for model in MODELS {
        println!(
            "{:<20} {:>10}  {:>8.3} {:>8.3}",
            model.name, model.context_window, model.pricing.input, model.pricing.output
        );
    }
}

fn read_text(text: String) -> Result<String> {
    if text != "-" {
        return Ok(text);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    if buffer.trim().is_empty() {
        return Err(DeepSeekError::InvalidOptions(
            "No text to summarize on stdin".to_string(),
        ));
    }
    Ok(buffer)
}
