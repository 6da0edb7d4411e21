#![deny(unsafe_code)]

//! The zsync download engine.
//!
//! [`zsync`] reconstructs a target file described by a `.zsync` control file:
//! it parses the control file, scans local seed files for blocks the target
//! already shares with them, fetches only the still-missing byte ranges over
//! HTTP, verifies every block and the whole file against the control file's
//! checksums, and atomically replaces the output path.
//!
//! The engine is single-threaded and blocking end to end; all byte motion
//! happens on the caller's thread. Progress reporting goes through the
//! [`ZsyncObserver`] callbacks, which cannot influence the run.

mod client;
mod error;
mod events;
mod fetch;
mod options;

pub use client::{zsync, zsync_with_observers};
pub use error::{ZsyncError, ZsyncResult};
pub use events::ZsyncObserver;
pub use options::Options;
pub use transport::Credentials;
