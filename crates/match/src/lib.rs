#![deny(unsafe_code)]

//! Block matching for zsync delta downloads.
//!
//! This crate finds target blocks inside local seed files:
//! - [`BlockIndex`] maps weak sums from the control file to candidate blocks
//! - [`RollingBuffer`] slides a block-sized window over a seed stream
//! - [`ZeroPaddedReader`] pads seeds the way the producer padded the target
//! - [`BlockMatcher`] drives the scan, confirming candidates with strong sums
//!   and writing verified blocks straight into the output file
//!
//! # Design
//!
//! The matcher probes the index with a cheaply-rolled weak sum at every byte
//! offset and pays for an MD4 only on bucket hits. When the producer asked
//! for two sequence matches, a hit is extended to the following block where
//! possible, letting the scan consume two blocks at once.

mod buffer;
mod index;
mod matcher;
mod zero_pad;

pub use buffer::RollingBuffer;
pub use index::BlockIndex;
pub use matcher::BlockMatcher;
pub use zero_pad::{padding_for, ZeroPaddedReader};
