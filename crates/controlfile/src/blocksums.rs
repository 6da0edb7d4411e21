//! The fixed-width binary block-sum table.

use std::io::{self, BufRead};

use crate::error::{ControlFileError, ControlFileResult};
use crate::header::Header;

/// Checksums of one target block.
///
/// The weak sum is stored as the low `weak_len` bytes of the packed rolling
/// value (big-endian on the wire); the strong sum is the first `strong_len`
/// bytes of the block's MD4. Both are computed over the zero-padded block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BlockSum {
    weak: u32,
    strong: Vec<u8>,
}

impl BlockSum {
    /// Creates a block-sum entry, used by parsers and producers.
    #[must_use]
    pub fn new(weak: u32, strong: Vec<u8>) -> Self {
        Self { weak, strong }
    }

    /// The stored (already truncated) weak sum.
    #[must_use]
    pub const fn weak(&self) -> u32 {
        self.weak
    }

    /// The stored truncated strong sum.
    #[must_use]
    pub fn strong(&self) -> &[u8] {
        &self.strong
    }

    /// Whether a full digest agrees with the stored truncated strong sum.
    #[must_use]
    pub fn matches_digest(&self, digest: &[u8]) -> bool {
        digest.len() >= self.strong.len() && self.strong == digest[..self.strong.len()]
    }
}

/// Reads exactly `num_blocks × (weak_len + strong_len)` bytes of records.
pub(crate) fn read_block_sums<R: BufRead>(
    reader: &mut R,
    header: &Header,
) -> ControlFileResult<Vec<BlockSum>> {
    let weak_len = usize::from(header.weak_len);
    let strong_len = usize::from(header.strong_len);
    let record = weak_len + strong_len;
    let expected = header.num_blocks() * record;

    let mut raw = vec![0u8; expected];
    let mut filled = 0;
    while filled < expected {
        match reader.read(&mut raw[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    if filled < expected {
        return Err(ControlFileError::TruncatedBlockSums {
            expected,
            actual: filled,
        });
    }

    let sums = raw
        .chunks_exact(record)
        .map(|chunk| {
            let weak = chunk[..weak_len]
                .iter()
                .fold(0u32, |acc, &byte| (acc << 8) | u32::from(byte));
            BlockSum::new(weak, chunk[weak_len..].to_vec())
        })
        .collect();
    Ok(sums)
}
