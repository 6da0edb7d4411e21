//! Error taxonomy of the download engine.

use std::io;

use controlfile::ControlFileError;
use output::OutputError;
use thiserror::Error;
use transport::TransportError;

/// Result alias for engine operations.
pub type ZsyncResult<T> = Result<T, ZsyncError>;

/// Errors surfaced by a zsync run.
///
/// Seed read failures are the one recoverable condition and never appear
/// here; the engine logs them and moves on to the next seed.
#[derive(Debug, Error)]
pub enum ZsyncError {
    /// The control file does not exist, locally or remotely.
    #[error("control file not found: {uri}")]
    ControlFileNotFound {
        /// The URI the control file was requested from.
        uri: String,
    },
    /// The control file exists but could not be parsed.
    #[error("failed to parse control file: {0}")]
    ControlFile(#[from] ControlFileError),
    /// The header's target URL is relative and no base is known.
    #[error("target URL {url:?} is relative and no zsync file source is set to resolve it")]
    RelativeTargetUrl {
        /// The relative URL from the header.
        url: String,
    },
    /// The header's target URL cannot be interpreted at all.
    #[error("invalid target URL {url:?}: {source}")]
    InvalidTargetUrl {
        /// The URL from the header.
        url: String,
        /// The underlying parse failure.
        source: url::ParseError,
    },
    /// HTTP transfer failed: transport errors or unusable status codes.
    #[error("HTTP transfer failed: {0}")]
    Transport(#[from] TransportError),
    /// Writing or verifying the output file failed.
    #[error("output file error: {0}")]
    Output(#[from] OutputError),
    /// Filesystem work outside the output writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
