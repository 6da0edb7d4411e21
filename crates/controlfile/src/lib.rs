#![deny(unsafe_code)]

//! Parser and data model for `.zsync` control files.
//!
//! A control file is a short text header (`Key: value` lines terminated by an
//! empty line) followed by a fixed-width binary table of per-block checksums.
//! [`ControlFile::read`] consumes both from any [`BufRead`] — a local file or
//! an HTTP response body — and validates the sizes the header promises.

mod blocksums;
mod error;
mod header;

use std::io::BufRead;

pub use blocksums::BlockSum;
pub use error::{ControlFileError, ControlFileResult};
pub use header::{FileChecksum, Header};

/// A fully parsed control file, immutable after parse.
#[derive(Clone, Debug)]
pub struct ControlFile {
    header: Header,
    block_sums: Vec<BlockSum>,
}

impl ControlFile {
    /// Assembles a control file from already-parsed parts.
    ///
    /// # Panics
    ///
    /// Panics if the table length disagrees with the header's block count.
    #[must_use]
    pub fn new(header: Header, block_sums: Vec<BlockSum>) -> Self {
        assert_eq!(
            header.num_blocks(),
            block_sums.len(),
            "block sum table must cover every target block"
        );
        Self { header, block_sums }
    }

    /// Parses a control file from a byte stream.
    ///
    /// The reader must be buffered so that header bytes consumed past the
    /// separating empty line are handed on to the block-sum table parse.
    pub fn read<R: BufRead>(reader: &mut R) -> ControlFileResult<Self> {
        let header = Header::read(reader)?;
        let block_sums = blocksums::read_block_sums(reader, &header)?;
        Ok(Self { header, block_sums })
    }

    /// The parsed header.
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// All block sums, ordered by block index.
    #[must_use]
    pub fn block_sums(&self) -> &[BlockSum] {
        &self.block_sums
    }

    /// Checksums of block `index`.
    #[must_use]
    pub fn block_sum(&self, index: usize) -> &BlockSum {
        &self.block_sums[index]
    }
}
