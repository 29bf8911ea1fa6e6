//! Server-Sent Events decoder
//!
//! Incremental, byte-oriented: network chunks may end anywhere, including in
//! the middle of a UTF-8 sequence, so partial lines are kept as raw bytes
//! until their newline arrives.

/// A dispatched SSE event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// `event:` field, if any
    pub event_type: Option<String>,

    /// `data:` lines joined with `\n`
    pub data: String,

    /// `id:` field, if any
    pub id: Option<String>,
}

impl SseEvent {
    /// OpenAI-style end-of-stream sentinel
    #[must_use]
    pub fn is_done_marker(&self) -> bool {
        self.data.trim() == "[DONE]"
    }
}

/// Incremental SSE decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes after the last newline seen
    partial_line: Vec<u8>,

    /// Fields of the event being assembled
    event_type: Option<String>,
    id: Option<String>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns every event completed by them
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();
        let mut rest = bytes;

        while let Some(newline) = rest.iter().position(|&b| b == b'\n') {
            self.partial_line.extend_from_slice(&rest[..newline]);
            rest = &rest[newline + 1..];

            let line = std::mem::take(&mut self.partial_line);
            if let Some(event) = self.handle_line(&line) {
                events.push(event);
            }
        }
        self.partial_line.extend_from_slice(rest);

        events
    }

    /// Flush at end of input; a final event without its blank line is still
    /// dispatched
    pub fn finish(&mut self) -> Option<SseEvent> {
        if !self.partial_line.is_empty() {
            let line = std::mem::take(&mut self.partial_line);
            if let Some(event) = self.handle_line(&line) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn handle_line(&mut self, raw: &[u8]) -> Option<SseEvent> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.is_empty() {
            return self.dispatch();
        }

        let line = String::from_utf8_lossy(raw);
        if line.starts_with(':') {
            // comment / keepalive
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_ref(), ""),
        };
        match field {
            "data" => self.data_lines.push(value.to_string()),
            "event" => self.event_type = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event_type = self.event_type.take();
        let id = self.id.take();
        if self.data_lines.is_empty() {
            return None;
        }

        Some(SseEvent {
            event_type,
            data: std::mem::take(&mut self.data_lines).join("\n"),
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event: message\nid: 7\ndata: {\"a\":1}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type.as_deref(), Some("message"));
        assert_eq!(events[0].id.as_deref(), Some("7"));
        assert_eq!(events[0].data, r#"{"a":1}"#);
    }

    #[test]
    fn test_multi_line_data_and_crlf() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: line1\r\ndata: line2\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "line1\nline2");
    }

    #[test]
    fn test_event_split_across_feeds() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: par").is_empty());
        assert!(decoder.feed(b"tial\n").is_empty());
        let events = decoder.feed(b"\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "partial");
    }

    #[test]
    fn test_utf8_split_inside_character() {
        let payload = "data: héllo\n\n".as_bytes();
        // 'é' is two bytes; cut between them
        let cut = payload.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(&payload[..cut]).is_empty());
        let events = decoder.feed(&payload[cut..]);
        assert_eq!(events[0].data, "héllo");
    }

    #[test]
    fn test_comments_and_blank_events_are_ignored() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b": keep-alive\n\n\nevent: ping\n\ndata: x\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "x");
        assert!(events[0].event_type.is_none());
    }

    #[test]
    fn test_done_marker() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: [DONE]\n\n");
        assert!(events[0].is_done_marker());
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: tail").is_empty());
        let event = decoder.finish().unwrap();
        assert_eq!(event.data, "tail");
        assert!(decoder.finish().is_none());
    }
}
