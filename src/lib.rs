//! DeepSeek chat adapter
//!
//! Maps provider-neutral chat requests onto DeepSeek's OpenAI-compatible API
//! and reassembles its streamed responses (answer text, reasoning text and
//! tool calls) into neutral events.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::too_many_lines)]

pub mod cli;
pub mod config;
pub mod error;
pub mod messages;
pub mod services;

// Re-exports for convenience
pub use error::{DeepSeekError, Result};
pub use services::{
    create_deepseek_summarize, create_deepseek_text, deepseek_summarize, deepseek_text,
    DeepSeekSummarizeAdapter, DeepSeekTextAdapter, StreamChunk, SummarizeAdapter, TextAdapter,
    TextOptions,
};
