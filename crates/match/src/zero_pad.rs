//! Zero padding for seed streams.

use std::io::{self, Read};

/// Number of zero bytes that stretch a `len`-byte seed to a whole number of
/// blocks, and to at least one block.
///
/// Block sums in the control file are computed over zero-padded blocks, so a
/// seed must be padded the same way before it is scanned.
#[must_use]
pub fn padding_for(len: u64, block_size: u64) -> u64 {
    if len < block_size {
        block_size - len
    } else {
        let remainder = len % block_size;
        if remainder == 0 {
            0
        } else {
            block_size - remainder
        }
    }
}

/// Reader adapter that appends a fixed number of zero bytes to its input.
#[derive(Debug)]
pub struct ZeroPaddedReader<R> {
    inner: R,
    padding: u64,
    inner_done: bool,
}

impl<R> ZeroPaddedReader<R> {
    /// Wraps `inner`, appending `padding` zeros once it is exhausted.
    pub fn new(inner: R, padding: u64) -> Self {
        Self {
            inner,
            padding,
            inner_done: false,
        }
    }
}

impl<R: Read> Read for ZeroPaddedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.inner_done {
            let read = self.inner.read(buf)?;
            if read > 0 {
                return Ok(read);
            }
            self.inner_done = true;
        }
        if self.padding == 0 {
            return Ok(0);
        }
        let zeros = buf.len().min(usize::try_from(self.padding).unwrap_or(usize::MAX));
        buf[..zeros].fill(0);
        self.padding -= zeros as u64;
        Ok(zeros)
    }
}
