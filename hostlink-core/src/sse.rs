//! Incremental parser for the host's event-stream framing.
//!
//! The host emits a dialect of server-sent events with the field order
//! inverted: each `data: <payload>` line arrives *before* its
//! `event: <name>` line. Parsing is therefore driven by the `event:` line:
//! a `data:` line only parks its payload in a pending slot, and the next
//! `event:` line pairs the two and emits them. An `event:` line that
//! arrives with nothing parked emits nothing. Blank lines, comments, and
//! every other field are ignored; they do not clear the pending slot.
//!
//! Chunks come straight off the HTTP body, so a line may be split at any
//! byte. The parser carries the unterminated tail between calls and only
//! interprets complete lines, which makes the output independent of how
//! the transport chunks the bytes.

const DATA_PREFIX: &str = "data: ";
const EVENT_PREFIX: &str = "event: ";

/// A fully framed event: the `event:` name and its `data:` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name, e.g. `endpoint` or `message`.
    pub name: String,
    /// The payload line that preceded the name.
    pub data: String,
}

/// Streaming parser; feed it raw body chunks, collect framed events.
#[derive(Debug, Default)]
pub struct SseParser {
    buf: Vec<u8>,
    pending_data: Option<String>,
}

impl SseParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one transport chunk and returns every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line).into_owned();
            self.process_line(&line, &mut events);
        }
        events
    }

    fn process_line(&mut self, line: &str, out: &mut Vec<SseEvent>) {
        if let Some(data) = line.strip_prefix(DATA_PREFIX) {
            self.pending_data = Some(data.to_string());
        } else if let Some(name) = line.strip_prefix(EVENT_PREFIX) {
            if let Some(data) = self.pending_data.take() {
                out.push(SseEvent {
                    name: name.to_string(),
                    data,
                });
            }
        }
        // other fields carry no information in this dialect
    }
}
