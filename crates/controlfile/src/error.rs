//! Error type for control-file parsing.

use std::io;

use thiserror::Error;

/// Result alias for control-file parsing.
pub type ControlFileResult<T> = Result<T, ControlFileError>;

/// Errors raised while reading a `.zsync` control file.
#[derive(Debug, Error)]
pub enum ControlFileError {
    /// The underlying stream failed.
    #[error("I/O error reading control file: {0}")]
    Io(#[from] io::Error),
    /// A header line was not valid UTF-8.
    #[error("control file header is not valid UTF-8")]
    HeaderEncoding,
    /// A header line did not have the `Key: value` shape.
    #[error("malformed header line {line:?}")]
    MalformedHeaderLine {
        /// The offending line, as read.
        line: String,
    },
    /// A required header key was absent.
    #[error("missing required header key {key:?}")]
    MissingKey {
        /// The key that was expected.
        key: &'static str,
    },
    /// A header value could not be interpreted.
    #[error("invalid value {value:?} for header key {key:?}")]
    InvalidValue {
        /// The key whose value was rejected.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
    /// `Hash-Lengths` was present but outside the permitted ranges.
    #[error(
        "hash lengths {value:?} out of range (sequence matches 1-2, weak 2-4 bytes, strong 3-16 bytes)"
    )]
    InvalidHashLengths {
        /// The raw `Hash-Lengths` value.
        value: String,
    },
    /// The block size was zero or not an integer.
    #[error("block size must be a positive integer")]
    InvalidBlockSize,
    /// The binary block-sum table ended early.
    #[error("block sum table truncated: expected {expected} bytes, got {actual}")]
    TruncatedBlockSums {
        /// Bytes the header promised.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },
}
