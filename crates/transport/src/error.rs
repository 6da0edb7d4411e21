//! Error type for the HTTP layer.

use std::io;

use thiserror::Error;

/// Result alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors raised while talking to the remote server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered 404.
    #[error("resource not found: {url}")]
    NotFound {
        /// The requested URL.
        url: String,
    },
    /// The server answered with a status the client cannot use.
    #[error("unexpected HTTP status {status} for {url}")]
    UnexpectedStatus {
        /// Status code received.
        status: u16,
        /// The requested URL.
        url: String,
    },
    /// The server challenged with 401 but no credentials are registered.
    #[error("server requires authentication and no credentials are registered for host {host:?}")]
    MissingCredentials {
        /// Host that issued the challenge.
        host: String,
    },
    /// A `Content-Range` header could not be parsed.
    #[error("invalid Content-Range header {value:?}")]
    InvalidContentRange {
        /// The raw header value.
        value: String,
    },
    /// A `multipart/byteranges` body was malformed.
    #[error("malformed multipart/byteranges response: {reason}")]
    Multipart {
        /// What was wrong with the body.
        reason: String,
    },
    /// The HTTP client failed below the status-code level.
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
    /// Reading a response body failed.
    #[error("I/O error reading response body: {0}")]
    Io(#[from] io::Error),
}
