//! Error type for the output writer.

use std::io;

use thiserror::Error;

/// Result alias for output-file operations.
pub type OutputResult<T> = Result<T, OutputError>;

/// Errors raised while assembling or committing the output file.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Reading or writing the temp file failed.
    #[error("I/O error on output file: {0}")]
    Io(#[from] io::Error),
    /// Bytes delivered over HTTP failed a block's strong-sum check.
    #[error("strong checksum mismatch for block {index}")]
    BlockChecksum {
        /// Index of the offending block.
        index: usize,
    },
    /// The reassembled file does not match the header's whole-file digest.
    #[error("whole-file {algorithm} digest does not match the control file")]
    FileChecksum {
        /// Digest algorithm named by the header.
        algorithm: &'static str,
    },
    /// `finish` was called before every block was recovered.
    #[error("output file incomplete: {missing} of {total} blocks still missing")]
    Incomplete {
        /// Blocks not yet written.
        missing: usize,
        /// Total blocks in the target.
        total: usize,
    },
    /// A range write did not line up with the blocks still missing.
    #[error("range write at offset {offset} does not line up with a missing block")]
    MisalignedRange {
        /// Offset of the stray byte.
        offset: u64,
    },
}
