//! Incremental decoder for the `text/event-stream` wire format.
//!
//! Bytes arrive in arbitrary chunks; the decoder buffers partial lines and
//! yields an [`SseEvent`] each time a blank line ends an event. A line or
//! event longer than [`MAX_EVENT_LEN`] is an error; the decoder drops what it
//! had buffered and can be fed again.

use super::SourceError;

/// Largest line or event body the decoder will buffer, in bytes.
pub const MAX_EVENT_LEN: usize = 64 * 1024;

/// One dispatched event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the `event:` field, if any.
    pub event: Option<String>,
    /// All `data:` lines joined with newlines.
    pub data: String,
    /// Value of the `id:` field, if any.
    pub id: Option<String>,
    /// Reconnection hint in milliseconds from the `retry:` field.
    pub retry: Option<u64>,
}

/// Stateful line decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    data_len: usize,
    id: Option<String>,
    retry: Option<u64>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and collect any events it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, SourceError> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = text.strip_suffix('\r').unwrap_or(text.as_ref());
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
            if self.data_len > MAX_EVENT_LEN {
                self.reset();
                return Err(SourceError::Stream(format!(
                    "event exceeds {} bytes",
                    MAX_EVENT_LEN
                )));
            }
        }

        if self.buffer.len() > MAX_EVENT_LEN {
            self.reset();
            return Err(SourceError::Stream(format!(
                "line exceeds {} bytes",
                MAX_EVENT_LEN
            )));
        }
        Ok(events)
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            // comment / keep-alive
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => {
                self.data_len += value.len() + 1;
                self.data.push(value.to_string());
            }
            "event" => self.event = Some(value.to_string()),
            "id" if !value.contains('\0') => self.id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse() {
                    self.retry = Some(ms);
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let retry = self.retry.take();
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        self.data_len = 0;
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event,
            data,
            id: self.id.clone(),
            retry,
        })
    }
}
