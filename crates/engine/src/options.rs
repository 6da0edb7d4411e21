//! Caller-supplied options for a zsync run.

use std::collections::HashMap;
use std::path::PathBuf;

use transport::Credentials;
use url::Url;

/// Optional parameters to a zsync run.
///
/// The orchestrator snapshots the options at entry, so mutating a caller's
/// copy mid-run has no effect; the snapshot is also where run-scoped
/// augmentations land (the pre-existing output file joining the seed list,
/// the URL base learned from a remote control file).
#[derive(Clone, Debug, Default)]
pub struct Options {
    pub(crate) seed_files: Vec<PathBuf>,
    pub(crate) output_file: Option<PathBuf>,
    pub(crate) save_zsync_file: Option<PathBuf>,
    pub(crate) zsync_file_source: Option<Url>,
    pub(crate) credentials: HashMap<String, Credentials>,
}

impl Options {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a local file to scan for blocks already present (zsync `-i`).
    #[must_use]
    pub fn seed(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed_files.push(path.into());
        self
    }

    /// Overrides the output location (zsync `-o`); defaults to the header's
    /// filename resolved against the working directory.
    #[must_use]
    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Stores a copy of a remote control file at this path before parsing it
    /// (zsync `-k`).
    #[must_use]
    pub fn save_zsync_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_zsync_file = Some(path.into());
        self
    }

    /// Records where a local control file was originally downloaded from
    /// (zsync `-u`), the base for resolving a relative target URL.
    #[must_use]
    pub fn zsync_file_source(mut self, url: Url) -> Self {
        self.zsync_file_source = Some(url);
        self
    }

    /// Registers Basic credentials for one host (zsync `-A`).
    #[must_use]
    pub fn credentials(mut self, host: impl Into<String>, credentials: Credentials) -> Self {
        self.credentials.insert(host.into(), credentials);
        self
    }
}
