//! RAII guard for the temporary output file.

use std::path::{Path, PathBuf};

/// Removes the temp file on drop unless the operation succeeded.
///
/// The writer assembles the target in a sibling temp file; every exit path
/// that does not end in a committed rename must release it. Holding the path
/// in a guard makes that automatic for error returns and panics alike. Call
/// [`keep`](Self::keep) once the file has been moved over the final path.
///
/// Removal errors are ignored: the file may never have been created, or may
/// already have been renamed away.
#[derive(Debug)]
pub struct TempFileGuard {
    path: PathBuf,
    keep_on_drop: bool,
}

impl TempFileGuard {
    /// Creates a guard for the given temp file path.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            keep_on_drop: false,
        }
    }

    /// Marks the operation as successful so the file survives the guard.
    pub fn keep(&mut self) {
        self.keep_on_drop = true;
    }

    /// Path of the guarded temp file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if !self.keep_on_drop {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn removes_file_on_drop() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("partial.tmp");
        fs::write(&path, b"data").expect("write temp file");

        drop(TempFileGuard::new(path.clone()));
        assert!(!path.exists());
    }

    #[test]
    fn keep_preserves_file() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("partial.tmp");
        fs::write(&path, b"data").expect("write temp file");

        let mut guard = TempFileGuard::new(path.clone());
        guard.keep();
        drop(guard);
        assert!(path.exists());
    }

    #[test]
    fn tolerates_missing_file() {
        let dir = tempdir().expect("create temp dir");
        drop(TempFileGuard::new(dir.path().join("never-created.tmp")));
    }
}
