//! Sliding window over a seed byte stream.

use std::io::{self, Read};

/// Fixed-capacity buffer exposing a block-sized window over a byte stream.
///
/// The backing buffer is larger than the window (16 blocks by convention) so
/// that single-byte advances are cheap: the window slides within the backing
/// store and the stream is only consulted when the lookahead shrinks below
/// two blocks. Keeping two blocks of lookahead means a matcher that wants to
/// confirm a pair of consecutive blocks can always see both without
/// re-reading.
#[derive(Debug)]
pub struct RollingBuffer<R> {
    reader: R,
    buf: Vec<u8>,
    window: usize,
    start: usize,
    filled: usize,
    eof: bool,
}

impl<R: Read> RollingBuffer<R> {
    /// Creates a buffer with a `window`-byte view and `capacity` bytes of
    /// backing storage, filling it from `reader`.
    ///
    /// # Panics
    ///
    /// Panics if `window` is zero or `capacity` is less than two windows.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::UnexpectedEof`] when the stream cannot supply
    /// even one full window; padded seed streams always can.
    pub fn new(reader: R, window: usize, capacity: usize) -> io::Result<Self> {
        assert!(window > 0, "window must be non-empty");
        assert!(
            capacity >= 2 * window,
            "backing capacity must hold at least two windows"
        );

        let mut buffer = Self {
            reader,
            buf: vec![0u8; capacity],
            window,
            start: 0,
            filled: 0,
            eof: false,
        };
        buffer.refill()?;
        if buffer.filled < window {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input ended before a full window",
            ));
        }
        Ok(buffer)
    }

    /// The current window, exactly one block.
    #[must_use]
    pub fn window(&self) -> &[u8] {
        &self.buf[self.start..self.start + self.window]
    }

    /// The current window extended to two blocks, when the stream still has
    /// that much data.
    #[must_use]
    pub fn double_window(&self) -> Option<&[u8]> {
        let end = self.start + 2 * self.window;
        (end <= self.filled).then(|| &self.buf[self.start..end])
    }

    /// First byte of the window (the byte that leaves on a one-byte advance).
    #[must_use]
    pub fn first_byte(&self) -> u8 {
        self.buf[self.start]
    }

    /// Last byte of the window (the byte that entered on the last advance).
    #[must_use]
    pub fn last_byte(&self) -> u8 {
        self.buf[self.start + self.window - 1]
    }

    /// Slides the window forward by `n` bytes, refilling the backing buffer
    /// from the stream as needed.
    ///
    /// Returns `false` once the stream is exhausted and no full window
    /// remains past the new position.
    pub fn advance(&mut self, n: usize) -> io::Result<bool> {
        debug_assert!(n >= 1 && n <= 2 * self.window, "advance step out of range");
        debug_assert!(self.start + n <= self.filled, "advance past buffered data");

        self.start += n;
        self.refill()?;
        Ok(self.filled - self.start >= self.window)
    }

    /// Tops the buffer up to keep at least two windows of lookahead, moving
    /// the live bytes to the front when space has run out behind them.
    fn refill(&mut self) -> io::Result<()> {
        if self.eof || self.filled - self.start >= 2 * self.window {
            return Ok(());
        }
        if self.start > 0 {
            self.buf.copy_within(self.start..self.filled, 0);
            self.filled -= self.start;
            self.start = 0;
        }
        while self.filled < self.buf.len() && !self.eof {
            match self.reader.read(&mut self.buf[self.filled..]) {
                Ok(0) => self.eof = true,
                Ok(read) => self.filled += read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn window_tracks_single_byte_advances() {
        let mut buffer = RollingBuffer::new(Cursor::new(b"abcdefgh".to_vec()), 4, 8).expect("new");
        assert_eq!(buffer.window(), b"abcd");
        assert_eq!(buffer.first_byte(), b'a');
        assert_eq!(buffer.last_byte(), b'd');

        assert!(buffer.advance(1).expect("advance"));
        assert_eq!(buffer.window(), b"bcde");
        assert!(buffer.advance(1).expect("advance"));
        assert_eq!(buffer.window(), b"cdef");
    }

    #[test]
    fn advance_reports_exhaustion() {
        let mut buffer = RollingBuffer::new(Cursor::new(b"abcdef".to_vec()), 4, 8).expect("new");
        assert!(buffer.advance(1).expect("advance")); // bcde
        assert!(buffer.advance(1).expect("advance")); // cdef
        assert!(!buffer.advance(1).expect("advance")); // def — short
    }

    #[test]
    fn refills_across_a_long_stream() {
        let data: Vec<u8> = (0u8..=255).collect();
        let mut buffer = RollingBuffer::new(Cursor::new(data.clone()), 4, 16).expect("new");
        for offset in 0..data.len() - 4 {
            assert_eq!(buffer.window(), &data[offset..offset + 4], "offset {offset}");
            assert!(buffer.advance(1).expect("advance"));
        }
        assert_eq!(buffer.window(), &data[252..]);
        assert!(!buffer.advance(1).expect("advance"));
    }

    #[test]
    fn double_window_needs_two_blocks_of_lookahead() {
        let mut buffer = RollingBuffer::new(Cursor::new(b"abcdefgh".to_vec()), 4, 8).expect("new");
        assert_eq!(buffer.double_window(), Some(b"abcdefgh".as_slice()));

        assert!(buffer.advance(1).expect("advance"));
        assert_eq!(buffer.double_window(), None);
    }

    #[test]
    fn block_sized_jumps_work() {
        let data: Vec<u8> = (0u8..64).collect();
        let mut buffer = RollingBuffer::new(Cursor::new(data.clone()), 4, 64).expect("new");
        assert!(buffer.advance(8).expect("advance"));
        assert_eq!(buffer.window(), &data[8..12]);
        assert!(buffer.advance(4).expect("advance"));
        assert_eq!(buffer.window(), &data[12..16]);
    }

    #[test]
    fn short_input_is_an_error() {
        let err = RollingBuffer::new(Cursor::new(b"ab".to_vec()), 4, 8).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
