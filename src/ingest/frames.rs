//! Recovering newline-delimited frames from an arbitrarily chunked stream.
//!
//! The server writes one JSON record per line, but the transport hands us
//! chunks cut at arbitrary byte offsets. Two small state machines deal with
//! that:
//!
//! - [`Utf8Decoder`] turns byte chunks into text, holding back an incomplete
//!   multi-byte sequence until the next chunk completes it.
//! - [`FrameAssembler`] turns text chunks into complete lines, holding back
//!   the unterminated tail until a terminator (or end of stream) arrives.

/// Incremental UTF-8 decoder for byte chunks split at arbitrary offsets.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `carry + bytes` as forms complete characters.
    ///
    /// Invalid sequences become U+FFFD. A truncated sequence at the end is
    /// kept for the next call.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut buffered = std::mem::take(&mut self.carry);
        buffered.extend_from_slice(bytes);

        let mut out = String::with_capacity(buffered.len());
        let mut input = &buffered[..];
        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&input[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            input = &input[valid + bad..];
                        }
                        None => {
                            self.carry = input[valid..].to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Emit whatever is still held back. A dangling partial sequence at end
    /// of stream can never complete, so it decodes to U+FFFD.
    pub fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.carry);
        String::from_utf8_lossy(&rest).into_owned()
    }
}

/// Splits a chunked text stream into trimmed, non-empty lines.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    pending: String,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every line it completed, in order.
    ///
    /// Whitespace-only lines are dropped. The text after the last `\n`
    /// stays pending.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);

        let Some(last_newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };
        let tail = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, tail);

        complete
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Called once at end of stream: the producer may omit the final
    /// terminator, so a non-blank pending tail is emitted as a last frame.
    pub fn flush(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let trimmed = rest.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Length of the unterminated text currently held back.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
