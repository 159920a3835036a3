/// Longest line the device protocol produces, terminator excluded.
pub const MAX_LINE_LEN: usize = 80;

/// Incremental reassembler for carriage-return-terminated lines.
///
/// Fed one byte at a time as bytes drain from the serial peripheral; the
/// accumulation cursor survives across calls, so a line may arrive split
/// over any number of driver passes. A completed line is borrowed from the
/// internal buffer and stays valid until the next [`feed`](LineReader::feed).
pub struct LineReader {
    buf: [u8; MAX_LINE_LEN],
    len: usize,
}

impl LineReader {
    pub const fn new() -> Self {
        LineReader {
            buf: [0; MAX_LINE_LEN],
            len: 0,
        }
    }

    /// Consume one byte from the stream.
    ///
    /// Returns the completed line on a carriage return; the line may be
    /// empty. Once the buffer is one short of capacity, further bytes are
    /// dropped until the terminator, which still delivers the (truncated)
    /// line. A line that is not valid UTF-8 is discarded whole.
    pub fn feed(&mut self, byte: u8) -> Option<&str> {
        if byte == b'\r' {
            let len = self.len;
            self.len = 0;
            return core::str::from_utf8(&self.buf[..len]).ok();
        }
        if self.len < MAX_LINE_LEN - 1 {
            self.buf[self.len] = byte;
            self.len += 1;
        }
        None
    }
}

impl Default for LineReader {
    fn default() -> Self {
        LineReader::new()
    }
}
