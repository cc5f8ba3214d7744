//! Line splitting of raw transport bytes
//!
//! The transceiver terminates every reply with `\r\n`. Reads from the
//! transport deliver arbitrary chunks, so bytes are accumulated here until a
//! terminator shows up.

use bytes::BytesMut;
use tracing::warn;

/// Longest partial line kept while waiting for a terminator
pub const MAX_LINE_LENGTH: usize = 1024;

/// Accumulates received bytes and yields complete lines
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: BytesMut,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(256),
        }
    }

    /// Add received data to the buffer
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        if self.buffer.len() > MAX_LINE_LENGTH && !self.buffer.iter().any(|&b| is_terminator(b)) {
            warn!(
                buffered = self.buffer.len(),
                "Discarding unterminated line longer than {} bytes", MAX_LINE_LENGTH
            );
            self.buffer.clear();
        }
    }

    /// Take the next complete, non-empty line (without terminator)
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            let end = self.buffer.iter().position(|&b| is_terminator(b))?;

            let line = self.buffer.split_to(end);

            let skip = self.buffer.iter().take_while(|&&b| is_terminator(b)).count();
            let _ = self.buffer.split_to(skip);

            if !line.is_empty() {
                return Some(String::from_utf8_lossy(&line).into_owned());
            }
        }
    }

    /// Number of buffered bytes
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

fn is_terminator(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_lines() {
        let mut lines = LineBuffer::new();
        lines.push(b"V 1.26 CUL868\r\nT09030");
        assert_eq!(lines.next_line().as_deref(), Some("V 1.26 CUL868"));
        assert_eq!(lines.next_line(), None);

        lines.push(b"04100\r\n");
        assert_eq!(lines.next_line().as_deref(), Some("T0903004100"));
        assert_eq!(lines.buffered_len(), 0);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let mut lines = LineBuffer::new();
        lines.push(b"\r\n\r\n\nF12340111\n\r\n");
        assert_eq!(lines.next_line().as_deref(), Some("F12340111"));
        assert_eq!(lines.next_line(), None);
    }

    #[test]
    fn test_overlong_garbage_dropped() {
        let mut lines = LineBuffer::new();
        lines.push(&[b'A'; MAX_LINE_LENGTH + 1]);
        assert_eq!(lines.buffered_len(), 0);

        lines.push(b"E0101\n");
        assert_eq!(lines.next_line().as_deref(), Some("E0101"));
    }
}
