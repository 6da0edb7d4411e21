#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Checksum primitives for zsync block matching.
//!
//! Two kinds of checksum cooperate during delta reconstruction:
//!
//! - [`RollingChecksum`] is the cheap Adler-style weak sum that can slide
//!   over an input one byte at a time, used to find candidate block offsets.
//! - [`Md4`] confirms candidates with a truncated strong digest and, together
//!   with [`Sha1`], verifies the fully reassembled file against the digest
//!   recorded in the control file.
//!
//! MD4 is used because it is what the zsync file format specifies; it is not
//! treated as cryptographically secure.

mod rolling;
mod strong;

pub use rolling::{weak_mask, RollingChecksum};
pub use strong::{Md4, Sha1};
