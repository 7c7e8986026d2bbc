//! Line splitting over bytes that arrive in arbitrary chunks.

use bytes::{Bytes, BytesMut};

/// Accumulates raw bytes and hands out complete lines.
///
/// Lines are split on `\n`; the terminator (and a preceding `\r`, if any) is
/// stripped. A trailing partial line is kept until more bytes arrive, or
/// returned once after [`LineBuffer::finish`] has been called.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: BytesMut,
    /// Prefix of `buf` already known to contain no line feed.
    scanned: usize,
    finished: bool,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly read bytes.
    pub fn append(&mut self, bytes: &[u8]) {
        debug_assert!(!self.finished, "append after end of stream");
        self.buf.extend_from_slice(bytes);
    }

    /// Mark the end of the byte source.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Whether [`finish`](Self::finish) has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of buffered bytes not yet returned as lines.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Take the next complete line, if one is buffered.
    ///
    /// Returns `None` when more input is needed, or when the source is
    /// finished and every byte has been handed out.
    pub fn next_line(&mut self) -> Option<Bytes> {
        if let Some(offset) = self.buf[self.scanned..].iter().position(|&b| b == b'\n') {
            let end = self.scanned + offset;
            let mut line = self.buf.split_to(end + 1);
            line.truncate(end);
            self.scanned = 0;
            return Some(strip_cr(line));
        }

        self.scanned = self.buf.len();

        if self.finished && !self.buf.is_empty() {
            self.scanned = 0;
            return Some(strip_cr(self.buf.split()));
        }

        None
    }
}

fn strip_cr(mut line: BytesMut) -> Bytes {
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    line.freeze()
}
