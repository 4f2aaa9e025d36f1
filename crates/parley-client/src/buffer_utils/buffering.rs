use super::decoder::Utf8Decoder;

const RECORD_DELIMITER: &str = "\n\n";

/// Text buffer that cuts a decoded byte stream into blank-line delimited records
///
/// Partial records stay buffered until their delimiter arrives.
pub struct FrameBuffer {
    decoder: Utf8Decoder,
    text: String,
}

impl FrameBuffer {
    /// Create a new buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            decoder: Utf8Decoder::new(),
            text: String::with_capacity(capacity),
        }
    }

    /// Add raw bytes to the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        let decoded = self.decoder.decode(bytes);
        self.text.push_str(&decoded);
    }

    /// Extract the next complete record (without its delimiter)
    /// Returns None if no complete record is available
    pub fn next_record(&mut self) -> Option<String> {
        let end = self.text.find(RECORD_DELIMITER)?;
        let record = self.text[..end].to_string();
        self.text.drain(..end + RECORD_DELIMITER.len());
        Some(record)
    }

    /// Take whatever is left once the body has closed
    pub fn finish(&mut self) -> Option<String> {
        let tail = self.decoder.finish();
        self.text.push_str(&tail);

        let rest = std::mem::take(&mut self.text);
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    /// Buffered text length in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.decoder.pending_len() == 0
    }
}
