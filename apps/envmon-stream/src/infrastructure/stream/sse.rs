//! Server-Sent Events Framing
//!
//! Incremental decoding of a `text/event-stream` body into `data:` payloads.
//!
//! Body chunks arrive at arbitrary byte boundaries, so decoding happens in
//! two stages:
//!
//! 1. [`Utf8Decoder`] turns bytes into text, holding back a multi-byte
//!    sequence split across chunks until it is complete.
//! 2. [`SseFrameParser`] splits text into lines and keeps the trailing
//!    partial line for the next call.
//!
//! Only `data:` lines produce frames. Comment lines (`:keep-alive`) and the
//! other event fields are dropped.

/// Line prefix carrying an event payload.
const DATA_PREFIX: &str = "data:";

/// Line prefix marking a comment.
const COMMENT_PREFIX: char = ':';

/// Split `buffer` into complete `data:` payloads and the unterminated tail.
///
/// The tail is everything after the last `\n` and must be prepended to the
/// next buffer. Payloads are returned in arrival order.
#[must_use]
pub fn parse_frames(buffer: &str) -> (Vec<String>, String) {
    match buffer.rfind('\n') {
        Some(idx) => {
            let frames = buffer[..idx].split('\n').filter_map(data_payload).collect();
            (frames, buffer[idx + 1..].to_string())
        }
        None => (Vec::new(), buffer.to_string()),
    }
}

/// Extract the payload of a single line, if it is a `data:` line.
fn data_payload(line: &str) -> Option<String> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.starts_with(COMMENT_PREFIX) {
        return None;
    }
    let payload = line.strip_prefix(DATA_PREFIX)?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);
    Some(payload.to_string())
}

// =============================================================================
// Stateful Parser
// =============================================================================

/// Frame parser that owns the partial line between calls.
#[derive(Debug, Default, Clone)]
pub struct SseFrameParser {
    remainder: String,
}

impl SseFrameParser {
    /// Create an empty parser.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            remainder: String::new(),
        }
    }

    /// Append `text` and return every frame completed by it.
    pub fn feed(&mut self, text: &str) -> Vec<String> {
        let mut buffer = std::mem::take(&mut self.remainder);
        buffer.push_str(text);
        let (frames, remainder) = parse_frames(&buffer);
        self.remainder = remainder;
        frames
    }

    /// Text held back waiting for a line terminator.
    #[must_use]
    pub fn remainder(&self) -> &str {
        &self.remainder
    }
}

// =============================================================================
// UTF-8 Decoding
// =============================================================================

/// Incremental UTF-8 decoder.
///
/// Invalid sequences become U+FFFD; only a truncated sequence at the very end
/// of a chunk is carried over.
#[derive(Debug, Default, Clone)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Create an empty decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Decode as much of `pending + chunk` as possible.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut pos = 0;

        while pos < self.pending.len() {
            match std::str::from_utf8(&self.pending[pos..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    pos = self.pending.len();
                }
                Err(e) => {
                    let valid_up_to = pos + e.valid_up_to();
                    // valid_up_to marks a UTF-8 boundary by contract
                    out.push_str(&String::from_utf8_lossy(&self.pending[pos..valid_up_to]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            pos = valid_up_to + len;
                        }
                        None => {
                            pos = valid_up_to;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..pos);
        out
    }

    /// Flush any held-back bytes as replacement characters.
    pub fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }

    /// Number of bytes held back.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
