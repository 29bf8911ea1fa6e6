//! DeepSeek streaming handler
//!
//! Folds [`ChatCompletionChunk`]s into neutral [`StreamChunk`] events.
//! Reasoning and answer text are accumulated independently; tool-call
//! argument fragments are concatenated per provider index and only emitted,
//! in first-seen order, once a finish reason arrives.

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::{ChatCompletionChunk, SseEvent, ToolCallDelta};
use crate::{
    error::{DeepSeekError, Result},
    messages::{Role, ToolCall},
    services::{generate_id, ChunkError, FinishReason, StreamChunk, Usage},
};

const GENERIC_STREAM_ERROR: &str = "Unknown error occurred during streaming";

/// Lifecycle of one streamed response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Streaming,
    Finished,
    Failed,
}

/// Tool call being assembled from deltas
#[derive(Debug, Clone, Default)]
struct ToolCallBuilder {
    id: String,
    name: String,
    arguments: String,
}

impl ToolCallBuilder {
    fn apply(&mut self, delta: &ToolCallDelta) {
        if let Some(id) = delta.id.as_deref().filter(|id| !id.is_empty()) {
            self.id = id.to_string();
        }

        if let Some(function) = &delta.function {
            if let Some(name) = function.name.as_deref().filter(|name| !name.is_empty()) {
                self.name = name.to_string();
            }
            if let Some(arguments) = &function.arguments {
                self.arguments.push_str(arguments);
            }
        }
    }

    fn snapshot(&self) -> ToolCall {
        ToolCall::function(self.id.clone(), self.name.clone(), self.arguments.clone())
    }
}

/// Per-response reassembly state
#[derive(Debug)]
pub struct DeepSeekStreamHandler {
    state: StreamState,

    /// Local id until the provider supplies one
    id: String,
    id_from_provider: bool,

    /// Requested model; used when a chunk does not name one
    model: String,

    /// Captured once, shared by every event
    timestamp: i64,

    content: String,
    reasoning: String,

    /// Provider index -> builder, in first-seen order
    tool_calls: IndexMap<u32, ToolCallBuilder>,

    /// Latest usage reported on any chunk
    usage: Option<Usage>,
}

impl DeepSeekStreamHandler {
    /// Start a stream for `model` with a fresh local id and timestamp
    pub fn new(model: impl Into<String>) -> Self {
        Self::starting_at(
            model,
            generate_id("deepseek"),
            chrono::Utc::now().timestamp_millis(),
        )
    }

    /// Start a stream with a fixed id and timestamp
    pub fn starting_at(model: impl Into<String>, id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            state: StreamState::Streaming,
            id: id.into(),
            id_from_provider: false,
            model: model.into(),
            timestamp,
            content: String::new(),
            reasoning: String::new(),
            tool_calls: IndexMap::new(),
            usage: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> StreamState {
        self.state
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state != StreamState::Streaming
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Answer text accumulated so far
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Reasoning text accumulated so far
    #[must_use]
    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    /// Decode one SSE event and process it
    ///
    /// # Errors
    ///
    /// Returns a stream error when the payload is not a chat completion chunk
    /// or carries the provider's own error object
    pub fn process_event(&mut self, event: &SseEvent) -> Result<Vec<StreamChunk>> {
        let mut chunk: ChatCompletionChunk =
            serde_json::from_str(&event.data).map_err(|e| DeepSeekError::Stream {
                message: format!("Failed to parse stream chunk: {e}"),
                code: None,
            })?;

        if let Some(error) = chunk.error.take() {
            return Err(DeepSeekError::Stream {
                code: error.code_text(),
                message: error
                    .message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_STREAM_ERROR.to_string()),
            });
        }
        Ok(self.process_chunk(chunk))
    }

    /// Process one provider chunk and return the events it produces
    pub fn process_chunk(&mut self, chunk: ChatCompletionChunk) -> Vec<StreamChunk> {
        let mut events = Vec::new();
        if self.is_finished() {
            trace!("Ignoring chunk after stream end");
            return events;
        }

        if !self.id_from_provider {
            if let Some(id) = chunk.id.filter(|id| !id.is_empty()) {
                self.id = id;
                self.id_from_provider = true;
            }
        }
        if let Some(usage) = chunk.usage {
            self.usage = Some(usage.into());
        }

        let Some(choice) = chunk.choices.into_iter().next() else {
            trace!("Skipping chunk without choices");
            return events;
        };
        let model = chunk
            .model
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| self.model.clone());
        let delta = choice.delta;

        if let Some(fragment) = delta.reasoning_content.filter(|s| !s.is_empty()) {
            self.reasoning.push_str(&fragment);
            events.push(StreamChunk::Thinking {
                id: self.id.clone(),
                model: model.clone(),
                timestamp: self.timestamp,
                delta: fragment,
                content: self.reasoning.clone(),
            });
        }

        if let Some(fragment) = delta.content.filter(|s| !s.is_empty()) {
            self.content.push_str(&fragment);
            events.push(StreamChunk::Content {
                id: self.id.clone(),
                model: model.clone(),
                timestamp: self.timestamp,
                delta: fragment,
                content: self.content.clone(),
                role: Role::Assistant,
            });
        }

        for fragment in delta.tool_calls.iter().flatten() {
            self.tool_calls
                .entry(fragment.index)
                .or_default()
                .apply(fragment);
        }

        if let Some(reason) = choice.finish_reason {
            self.finish(&reason, model, &mut events);
        }

        events
    }

    fn finish(&mut self, reason: &str, model: String, events: &mut Vec<StreamChunk>) {
        let tool_invocation = reason == "tool_calls" || !self.tool_calls.is_empty();
        if tool_invocation {
            for (index, builder) in &self.tool_calls {
                events.push(StreamChunk::ToolCall {
                    id: self.id.clone(),
                    model: model.clone(),
                    timestamp: self.timestamp,
                    index: *index,
                    tool_call: builder.snapshot(),
                });
            }
        }

        let finish_reason = if tool_invocation {
            FinishReason::ToolCalls
        } else {
            FinishReason::Stop
        };
        debug!(
            id = %self.id,
            provider_reason = reason,
            tool_calls = self.tool_calls.len(),
            "Stream finished"
        );

        events.push(StreamChunk::Done {
            id: self.id.clone(),
            model,
            timestamp: self.timestamp,
            usage: self.usage,
            finish_reason,
        });
        self.state = StreamState::Finished;
    }

    /// Record a failure and build its `error` event
    ///
    /// Returns `None` once the stream is already terminal.
    pub fn fail(&mut self, error: &DeepSeekError) -> Option<StreamChunk> {
        if self.is_finished() {
            return None;
        }
        self.state = StreamState::Failed;

        let message = error.to_string();
        let message = if message.trim().is_empty() {
            GENERIC_STREAM_ERROR.to_string()
        } else {
            message
        };

        Some(StreamChunk::Error {
            id: self.id.clone(),
            model: self.model.clone(),
            timestamp: self.timestamp,
            error: ChunkError {
                message,
                code: error.code(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::streaming::{ChunkChoice, ChunkDelta, FunctionDelta, WireUsage};
    use pretty_assertions::assert_eq;

    fn handler() -> DeepSeekStreamHandler {
        DeepSeekStreamHandler::starting_at("deepseek-chat", "local-1", 1_700_000_000_000)
    }

    fn chunk(delta: ChunkDelta, finish_reason: Option<&str>) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: Some("chatcmpl-1".into()),
            model: Some("deepseek-chat".into()),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason: finish_reason.map(str::to_string),
            }],
            usage: None,
            error: None,
        }
    }

    fn content(text: &str) -> ChunkDelta {
        ChunkDelta {
            content: Some(text.into()),
            ..ChunkDelta::default()
        }
    }

    fn reasoning(text: &str) -> ChunkDelta {
        ChunkDelta {
            reasoning_content: Some(text.into()),
            ..ChunkDelta::default()
        }
    }

    fn tool_fragment(index: u32, id: Option<&str>, name: Option<&str>, args: &str) -> ChunkDelta {
        ChunkDelta {
            tool_calls: Some(vec![ToolCallDelta {
                index,
                id: id.map(str::to_string),
                call_type: id.map(|_| "function".to_string()),
                function: Some(FunctionDelta {
                    name: name.map(str::to_string),
                    arguments: Some(args.into()),
                }),
            }]),
            ..ChunkDelta::default()
        }
    }

    #[test]
    fn test_content_cumulative_is_prefix_sum() {
        let deltas = ["Hel", "lo", ", ", "wor", "ld", "!"];
        let mut h = handler();
        let mut expected = String::new();

        for delta in deltas {
            expected.push_str(delta);
            let events = h.process_chunk(chunk(content(delta), None));
            assert_eq!(events.len(), 1);
            match &events[0] {
                StreamChunk::Content {
                    delta: d,
                    content,
                    role,
                    ..
                } => {
                    assert_eq!(d, delta);
                    assert_eq!(content, &expected);
                    assert_eq!(*role, Role::Assistant);
                }
                other => panic!("Expected content, got {other:?}"),
            }
        }
        assert_eq!(h.content(), deltas.concat());
    }

    #[test]
    fn test_reasoning_then_answer() {
        let mut h = handler();
        let mut events = Vec::new();
        events.extend(h.process_chunk(chunk(reasoning("Step "), None)));
        events.extend(h.process_chunk(chunk(reasoning("1"), None)));
        events.extend(h.process_chunk(chunk(content("42"), Some("stop"))));

        assert_eq!(events.len(), 4);
        assert!(matches!(
            &events[0],
            StreamChunk::Thinking { delta, content, .. } if delta == "Step " && content == "Step "
        ));
        assert!(matches!(
            &events[1],
            StreamChunk::Thinking { delta, content, .. } if delta == "1" && content == "Step 1"
        ));
        assert!(matches!(
            &events[2],
            StreamChunk::Content { delta, content, .. } if delta == "42" && content == "42"
        ));
        assert!(matches!(
            &events[3],
            StreamChunk::Done {
                finish_reason: FinishReason::Stop,
                usage: None,
                ..
            }
        ));
        assert_eq!(h.state(), StreamState::Finished);
    }

    #[test]
    fn test_tool_call_fragments_are_concatenated() {
        let mut h = handler();
        let mut events = Vec::new();
        events.extend(h.process_chunk(chunk(
            tool_fragment(0, Some("call_1"), Some("get_weather"), r#"{"location":"#),
            None,
        )));
        events.extend(h.process_chunk(chunk(tool_fragment(0, None, None, r#""SF"}"#), None)));
        assert!(events.is_empty());

        events.extend(h.process_chunk(chunk(ChunkDelta::default(), Some("tool_calls"))));
        assert_eq!(events.len(), 2);
        match &events[0] {
            StreamChunk::ToolCall {
                index, tool_call, ..
            } => {
                assert_eq!(*index, 0);
                assert_eq!(tool_call.id, "call_1");
                assert_eq!(tool_call.function.name, "get_weather");
                assert_eq!(tool_call.function.arguments.to_json_string(), r#"{"location":"SF"}"#);
            }
            other => panic!("Expected tool call, got {other:?}"),
        }
        assert!(matches!(
            &events[1],
            StreamChunk::Done {
                finish_reason: FinishReason::ToolCalls,
                ..
            }
        ));
    }

    #[test]
    fn test_arguments_survive_every_split_point() {
        let arguments = r#"{"city":"São Paulo","units":"metric","days":3}"#;
        let boundaries: Vec<usize> = arguments
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(arguments.len()))
            .collect();

        for &split in &boundaries {
            let mut h = handler();
            h.process_chunk(chunk(
                tool_fragment(0, Some("call_9"), Some("forecast"), &arguments[..split]),
                None,
            ));
            h.process_chunk(chunk(tool_fragment(0, None, None, &arguments[split..]), None));
            let events = h.process_chunk(chunk(ChunkDelta::default(), Some("tool_calls")));

            let StreamChunk::ToolCall { tool_call, .. } = &events[0] else {
                panic!("Expected tool call at split {split}");
            };
            assert_eq!(tool_call.function.arguments.to_json_string(), arguments);
        }
    }

    #[test]
    fn test_single_character_fragments() {
        let arguments = r#"{"q":"rust async"}"#;
        let mut h = handler();
        h.process_chunk(chunk(tool_fragment(0, Some("call_1"), Some("search"), ""), None));
        for c in arguments.chars() {
            h.process_chunk(chunk(tool_fragment(0, None, None, &c.to_string()), None));
        }
        let events = h.process_chunk(chunk(ChunkDelta::default(), Some("tool_calls")));
        let StreamChunk::ToolCall { tool_call, .. } = &events[0] else {
            panic!("Expected tool call");
        };
        assert_eq!(tool_call.function.arguments.to_json_string(), arguments);
    }

    #[test]
    fn test_tool_calls_keep_first_seen_order() {
        let mut h = handler();
        h.process_chunk(chunk(tool_fragment(2, Some("call_b"), Some("second"), "{}"), None));
        h.process_chunk(chunk(tool_fragment(0, Some("call_a"), Some("first"), "{}"), None));
        let events = h.process_chunk(chunk(ChunkDelta::default(), Some("tool_calls")));

        let indices: Vec<u32> = events
            .iter()
            .filter_map(|event| match event {
                StreamChunk::ToolCall { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(indices, vec![2, 0]);
    }

    #[test]
    fn test_accumulated_tool_calls_override_stop_reason() {
        let mut h = handler();
        h.process_chunk(chunk(tool_fragment(0, Some("call_1"), Some("ping"), "{}"), None));
        let events = h.process_chunk(chunk(ChunkDelta::default(), Some("stop")));
        assert!(matches!(events[0], StreamChunk::ToolCall { .. }));
        assert!(matches!(
            events[1],
            StreamChunk::Done {
                finish_reason: FinishReason::ToolCalls,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_tool_call_id_does_not_overwrite() {
        let mut h = handler();
        h.process_chunk(chunk(tool_fragment(0, Some("call_1"), Some("ping"), ""), None));
        h.process_chunk(chunk(tool_fragment(0, Some(""), Some(""), "{}"), None));
        let events = h.process_chunk(chunk(ChunkDelta::default(), Some("tool_calls")));
        let StreamChunk::ToolCall { tool_call, .. } = &events[0] else {
            panic!("Expected tool call");
        };
        assert_eq!(tool_call.id, "call_1");
        assert_eq!(tool_call.function.name, "ping");
    }

    #[test]
    fn test_exactly_one_done_and_nothing_after() {
        let mut h = handler();
        let first = h.process_chunk(chunk(content("hi"), Some("stop")));
        assert_eq!(first.iter().filter(|e| e.is_terminal()).count(), 1);

        assert!(h.process_chunk(chunk(content("late"), Some("stop"))).is_empty());
        assert!(h.fail(&DeepSeekError::from("late failure")).is_none());
        assert_eq!(h.state(), StreamState::Finished);
        assert_eq!(h.content(), "hi");
    }

    #[test]
    fn test_failure_emits_single_error() {
        let mut h = handler();
        h.process_chunk(chunk(content("partial"), None));

        let event = h
            .fail(&DeepSeekError::Stream {
                message: "connection reset".into(),
                code: Some("ECONNRESET".into()),
            })
            .unwrap();
        match event {
            StreamChunk::Error { error, id, .. } => {
                assert_eq!(id, "chatcmpl-1");
                assert!(error.message.contains("connection reset"));
                assert_eq!(error.code.as_deref(), Some("ECONNRESET"));
            }
            other => panic!("Expected error, got {other:?}"),
        }

        assert_eq!(h.state(), StreamState::Failed);
        assert!(h.fail(&DeepSeekError::from("again")).is_none());
        assert!(h.process_chunk(chunk(content("more"), Some("stop"))).is_empty());
        assert_eq!(h.content(), "partial");
    }

    #[test]
    fn test_first_provider_id_wins_and_timestamp_is_fixed() {
        let mut h = handler();
        assert_eq!(h.id(), "local-1");

        let mut no_id = chunk(content("a"), None);
        no_id.id = None;
        let events = h.process_chunk(no_id);
        assert_eq!(events[0].id(), "local-1");

        let events = h.process_chunk(chunk(content("b"), None));
        assert_eq!(events[0].id(), "chatcmpl-1");

        let mut other_id = chunk(content("c"), Some("stop"));
        other_id.id = Some("chatcmpl-2".into());
        let events = h.process_chunk(other_id);
        assert!(events.iter().all(|e| e.id() == "chatcmpl-1"));
        assert!(events.iter().all(|e| e.timestamp() == 1_700_000_000_000));
    }

    #[test]
    fn test_chunks_without_choices_are_skipped() {
        let mut h = handler();
        let events = h.process_chunk(ChatCompletionChunk {
            id: Some("chatcmpl-1".into()),
            model: None,
            choices: vec![],
            usage: None,
            error: None,
        });
        assert!(events.is_empty());
        assert_eq!(h.state(), StreamState::Streaming);
    }

    #[test]
    fn test_empty_deltas_emit_nothing() {
        let mut h = handler();
        let events = h.process_chunk(chunk(
            ChunkDelta {
                role: Some("assistant".into()),
                content: Some(String::new()),
                reasoning_content: Some(String::new()),
                tool_calls: None,
            },
            None,
        ));
        assert!(events.is_empty());
    }

    #[test]
    fn test_usage_and_model_fallback() {
        let mut h = DeepSeekStreamHandler::starting_at("deepseek-reasoner", "local-1", 5);
        let mut last = chunk(content("ok"), Some("stop"));
        last.model = Some(String::new());
        last.usage = Some(WireUsage {
            prompt_tokens: Some(10),
            completion_tokens: Some(2),
            total_tokens: None,
        });

        let events = h.process_chunk(last);
        match events.last() {
            Some(StreamChunk::Done { model, usage, .. }) => {
                assert_eq!(model, "deepseek-reasoner");
                assert_eq!(
                    *usage,
                    Some(Usage {
                        prompt_tokens: 10,
                        completion_tokens: 2,
                        total_tokens: 0
                    })
                );
            }
            other => panic!("Expected done, got {other:?}"),
        }
    }

    #[test]
    fn test_process_event_rejects_garbage() {
        let mut h = handler();
        let event = SseEvent {
            data: "not json".into(),
            ..SseEvent::default()
        };
        let err = h.process_event(&event).unwrap_err();
        assert!(matches!(err, DeepSeekError::Stream { .. }));
        assert_eq!(h.state(), StreamState::Streaming);
    }

    #[test]
    fn test_process_event_surfaces_provider_error() {
        let mut h = handler();
        let event = SseEvent {
            data: serde_json::json!({
                "error": {
                    "message": "Rate limit reached for requests",
                    "type": "rate_limit_error",
                    "code": "rate_limit_exceeded"
                }
            })
            .to_string(),
            ..SseEvent::default()
        };

        let err = h.process_event(&event).unwrap_err();
        let DeepSeekError::Stream { message, code } = &err else {
            panic!("Expected stream error, got {err:?}");
        };
        assert_eq!(message, "Rate limit reached for requests");
        assert_eq!(code.as_deref(), Some("rate_limit_exceeded"));

        let StreamChunk::Error { error, .. } = h.fail(&err).unwrap() else {
            panic!("Expected error event");
        };
        assert!(error.message.contains("Rate limit reached for requests"));
        assert_eq!(error.code.as_deref(), Some("rate_limit_exceeded"));
    }
}
