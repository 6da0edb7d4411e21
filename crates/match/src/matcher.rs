//! Byte-by-byte seed scanning against the block index.

use std::io::Read;

use checksums::{Md4, RollingChecksum};
use controlfile::ControlFile;
use output::{OutputFileWriter, OutputResult};

use crate::buffer::RollingBuffer;
use crate::index::BlockIndex;

/// Scans a seed stream for target blocks, writing every verified hit.
///
/// The matcher keeps the weak sum rolling across one-byte advances and only
/// computes strong sums when the index reports candidates. After a verified
/// match the caller skips a whole block (or two) and the rolling state is
/// rebuilt from the new window on the next call.
pub struct BlockMatcher<'a> {
    control: &'a ControlFile,
    index: BlockIndex,
    weak: Option<RollingChecksum>,
    departing: u8,
}

impl<'a> BlockMatcher<'a> {
    /// Builds the matcher (and its index) for one control file.
    #[must_use]
    pub fn new(control: &'a ControlFile) -> Self {
        Self {
            control,
            index: BlockIndex::new(control),
            weak: None,
            departing: 0,
        }
    }

    /// Block size the matcher's windows must use.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.control.header().block_size as usize
    }

    /// Examines the current window and returns how many bytes the caller
    /// should advance the buffer by: 1 on a miss, one block after a single
    /// match, two blocks after a verified pair.
    ///
    /// Verified blocks are handed to `writer`; blocks it already holds are
    /// ignored there.
    pub fn next_match<R: Read>(
        &mut self,
        writer: &mut OutputFileWriter<'_>,
        buffer: &mut RollingBuffer<R>,
    ) -> OutputResult<usize> {
        let weak_len = usize::from(self.control.header().weak_len);
        let block_size = self.block_size();

        let rolling = match self.weak.take() {
            Some(mut rolling) => {
                rolling.roll(self.departing, buffer.last_byte());
                rolling
            }
            None => RollingChecksum::from_block(buffer.window()),
        };
        let weak = rolling.truncated(weak_len);
        self.weak = Some(rolling);

        let Some(candidates) = self.index.candidates(weak) else {
            self.departing = buffer.first_byte();
            return Ok(1);
        };

        let window = buffer.window();
        let strong = Md4::digest(window);
        // The tail of the double window, when the stream still has one more
        // block to look ahead into.
        let lookahead = buffer.double_window().map(|pair| &pair[block_size..]);
        let mut lookahead_weak = None;
        let mut lookahead_strong = None;

        let mut consumed = 0usize;
        for candidate in candidates {
            if !self.control.block_sum(candidate.block).matches_digest(&strong) {
                continue;
            }
            if let (Some(next_weak), Some(tail)) = (candidate.next_weak, lookahead) {
                let tail_weak = *lookahead_weak
                    .get_or_insert_with(|| RollingChecksum::from_block(tail).truncated(weak_len));
                if tail_weak == next_weak {
                    let tail_strong = *lookahead_strong.get_or_insert_with(|| Md4::digest(tail));
                    if self
                        .control
                        .block_sum(candidate.block + 1)
                        .matches_digest(&tail_strong)
                    {
                        tracing::trace!(block = candidate.block, "matched block pair");
                        writer.write_block(candidate.block, window)?;
                        writer.write_block(candidate.block + 1, tail)?;
                        consumed = consumed.max(2 * block_size);
                        continue;
                    }
                }
            }
            tracing::trace!(block = candidate.block, "matched single block");
            writer.write_block(candidate.block, window)?;
            consumed = consumed.max(block_size);
        }

        if consumed == 0 {
            self.departing = buffer.first_byte();
            Ok(1)
        } else {
            self.weak = None;
            Ok(consumed)
        }
    }
}
