#![deny(unsafe_code)]

//! HTTP layer for zsync downloads.
//!
//! The engine is single-threaded and blocking, so this crate wraps
//! [`reqwest`]'s blocking client behind the small contract the download
//! needs: a plain GET for the control file and one ranged GET for all
//! missing byte ranges, classified into the three response shapes servers
//! produce (200 ignoring ranges, 206 with a single range, and 206
//! `multipart/byteranges`). Basic-auth challenges are answered once per
//! request and remembered per host for the rest of the run.

mod client;
mod error;
mod multipart;
mod range;

pub use client::{Body, Credentials, HttpClient, RangeResponse};
pub use error::{TransportError, TransportResult};
pub use multipart::MultipartRanges;
pub use range::{format_range_header, ContentRange};
