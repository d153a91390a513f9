//! SSE Frame Decoder
//!
//! Turns the raw byte chunks of a streaming response into typed events.
//! Events are separated by a blank line (LF or CRLF) and carry one `data: <json>` line
//! whose `type` field selects the event kind.

use serde_json::Value;
use tracing::warn;

/// Kind assigned to frames that carry no `type` field.
pub const DEFAULT_KIND: &str = "message";

/// One application message delivered by the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamMessage {
    /// Value of the frame's `type` field
    pub kind: String,
    /// `content` for `data` frames, the whole frame otherwise
    pub payload: Value,
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Message(StreamMessage),
    /// The producer finished normally.
    End,
    /// The producer reported a failure.
    Error(String),
}

// == Frame Decoder ==
/// Incremental decoder for `data: <json>` event streams.
///
/// Bytes are buffered across chunks, so a frame (or a multi-byte character)
/// split between two reads is decoded once it is complete.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    terminal_kinds: Vec<String>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treats messages of the given kinds as the last frame of the stream:
    /// the message is delivered and followed by `StreamEvent::End`.
    pub fn with_terminal_kinds<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            buffer: Vec::new(),
            terminal_kinds: kinds.into_iter().map(Into::into).collect(),
        }
    }

    /// Feeds a chunk and returns every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some((pos, sep_len)) = find_event_boundary(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..pos + sep_len).collect();
            self.decode_block(&block[..pos], &mut events);
        }
        events
    }

    /// Decodes whatever is left once the byte stream has ended.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let rest = std::mem::take(&mut self.buffer);
        let mut events = Vec::new();
        self.decode_block(&rest, &mut events);
        events
    }

    /// Bytes buffered but not yet decoded.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn decode_block(&self, block: &[u8], events: &mut Vec<StreamEvent>) {
        let text = String::from_utf8_lossy(block);
        for line in text.lines() {
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data.is_empty() {
                continue;
            }

            match serde_json::from_str::<Value>(data) {
                Ok(value) => self.classify(value, events),
                Err(e) => warn!(error = %e, frame = data, "Failed to parse stream frame"),
            }
        }
    }

    fn classify(&self, value: Value, events: &mut Vec<StreamEvent>) {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_KIND)
            .to_string();

        match kind.as_str() {
            "data" => {
                let payload = value.get("content").cloned().unwrap_or(Value::Null);
                events.push(StreamEvent::Message(StreamMessage { kind, payload }));
            }
            "end" => events.push(StreamEvent::End),
            "error" => events.push(StreamEvent::Error(error_detail(&value))),
            _ => {
                let terminal = self.terminal_kinds.iter().any(|k| *k == kind);
                events.push(StreamEvent::Message(StreamMessage {
                    kind,
                    payload: value,
                }));
                if terminal {
                    events.push(StreamEvent::End);
                }
            }
        }
    }
}

/// Position and length of the first blank-line separator in `buffer`.
fn find_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|pos| (pos, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| (pos, 4));

    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if b.0 < a.0 { b } else { a }),
        (a, b) => a.or(b),
    }
}

fn error_detail(frame: &Value) -> String {
    ["detail", "error", "message"]
        .iter()
        .find_map(|field| frame.get(*field).and_then(Value::as_str))
        .unwrap_or("stream reported an error")
        .to_string()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_crlf_separated_frames() {
        let mut decoder = FrameDecoder::new();
        let mut events =
            decoder.push(b"data: {\"type\":\"data\",\"content\":\"a\"}\r\n\r\ndata: {\"type\":\"da");
        events.extend(
            decoder.push(b"ta\",\"content\":\"b\"}\r\n\r\ndata: {\"type\":\"end\"}\r\n\r\n"),
        );

        assert_eq!(
            events,
            vec![
                message("data", json!("a")),
                message("data", json!("b")),
                StreamEvent::End,
            ]
        );
        assert_eq!(decoder.pending(), 0);
    }

    fn message(kind: &str, payload: Value) -> StreamEvent {
        StreamEvent::Message(StreamMessage {
            kind: kind.to_string(),
            payload,
        })
    }

    #[test]
    fn test_decodes_data_end_and_error() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.push(
            b"data: {\"type\":\"data\",\"content\":\"Hel\"}\n\n\
              data: {\"type\":\"error\",\"detail\":\"model crashed\"}\n\n\
              data: {\"type\":\"end\"}\n\n",
        );

        assert_eq!(
            events,
            vec![
                message("data", json!("Hel")),
                StreamEvent::Error("model crashed".to_string()),
                StreamEvent::End,
            ]
        );
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut decoder = FrameDecoder::new();

        assert!(decoder.push(b"data: {\"type\":\"da").is_empty());
        assert!(decoder.push(b"ta\",\"content\":\"x\"}\n").is_empty());
        let events = decoder.push(b"\ndata: {\"type\":\"end\"}");

        assert_eq!(events, vec![message("data", json!("x"))]);
        assert_eq!(decoder.finish(), vec![StreamEvent::End]);
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        let frame = "data: {\"type\":\"data\",\"content\":\"안녕\"}\n\n".as_bytes();
        // Split inside the first Hangul syllable
        let split = frame.iter().position(|b| *b >= 0x80).unwrap() + 1;

        assert!(decoder.push(&frame[..split]).is_empty());
        let events = decoder.push(&frame[split..]);

        assert_eq!(events, vec![message("data", json!("안녕"))]);
    }

    #[test]
    fn test_malformed_frame_is_skipped() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.push(b"data: {not json\n\ndata: {\"type\":\"end\"}\n\n");
        assert_eq!(events, vec![StreamEvent::End]);
    }

    #[test]
    fn test_non_data_lines_ignored() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.push(b": keep-alive\n\nevent: ping\ndata: {\"type\":\"progress\",\"progress\":40}\n\n");

        assert_eq!(
            events,
            vec![message("progress", json!({"type": "progress", "progress": 40}))]
        );
    }

    #[test]
    fn test_untyped_frame_uses_default_kind() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.push(b"data: {\"value\":1}\n\n");
        assert_eq!(events, vec![message(DEFAULT_KIND, json!({"value": 1}))]);
    }

    #[test]
    fn test_terminal_kind_delivers_then_ends() {
        let mut decoder = FrameDecoder::with_terminal_kinds(["tester_complete"]);
        let events = decoder.push(b"data: {\"type\":\"tester_complete\",\"success_count\":3}\n\n");

        assert_eq!(
            events,
            vec![
                message(
                    "tester_complete",
                    json!({"type": "tester_complete", "success_count": 3})
                ),
                StreamEvent::End,
            ]
        );
    }

    #[test]
    fn test_error_detail_fallbacks() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.push(
            b"data: {\"type\":\"error\",\"error\":\"bad batch\"}\n\n\
              data: {\"type\":\"error\"}\n\n",
        );

        assert_eq!(
            events,
            vec![
                StreamEvent::Error("bad batch".to_string()),
                StreamEvent::Error("stream reported an error".to_string()),
            ]
        );
    }
}
