#![deny(unsafe_code)]

//! Output-file assembly for zsync downloads.
//!
//! [`OutputFileWriter`] owns the on-disk image of the target while it is
//! being reconstructed: verified blocks arrive from seed scans via
//! [`OutputFileWriter::write_block`] and from HTTP range fetches via
//! [`OutputFileWriter::write_range`]. The writer tracks which blocks are
//! still missing, folds the whole-file digest in strict target order, and
//! atomically replaces the destination on [`OutputFileWriter::finish`].

mod error;
mod temp_guard;
mod writer;

pub use error::{OutputError, OutputResult};
pub use temp_guard::TempFileGuard;
pub use writer::{NullListener, OutputFileWriter, WriteListener};
