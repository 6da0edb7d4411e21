//! Sparse writer that assembles the target file block by block.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use checksums::{Md4, Sha1};
use controlfile::{ControlFile, FileChecksum};

use crate::error::{OutputError, OutputResult};
use crate::temp_guard::TempFileGuard;

/// Callback invoked as blocks are committed to the output file.
///
/// Listeners are write-only sinks: they cannot return errors into the writer.
pub trait WriteListener {
    /// Called after block `index` has been written and marked present.
    fn block_written(&mut self, index: usize, bytes: usize) {
        let _ = (index, bytes);
    }
}

/// Listener that ignores every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullListener;

impl WriteListener for NullListener {}

/// Streaming whole-file digest, chosen by the header.
enum FileHasher {
    Md4(Md4),
    Sha1(Sha1),
}

impl FileHasher {
    fn for_checksum(checksum: &FileChecksum) -> Self {
        match checksum {
            FileChecksum::Md4(_) => Self::Md4(Md4::new()),
            FileChecksum::Sha1(_) => Self::Sha1(Sha1::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md4(hasher) => hasher.update(data),
            Self::Sha1(hasher) => hasher.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            Self::Md4(hasher) => hasher.finalize().to_vec(),
            Self::Sha1(hasher) => hasher.finalize().to_vec(),
        }
    }
}

/// A block partially covered by range writes.
struct PartialBlock {
    data: Vec<u8>,
    filled: usize,
}

/// Maintains the on-disk image of the target while blocks are recovered from
/// seeds and HTTP ranges.
///
/// The writer owns a temp file truncated to the target length and a bitset
/// recording which blocks hold verified contents. Each block is written at
/// most once; the whole-file digest is folded strictly in ascending target
/// order regardless of write order, so it matches the producer's digest once
/// the last gap closes.
pub struct OutputFileWriter<'a> {
    control: &'a ControlFile,
    file: File,
    guard: TempFileGuard,
    dest: PathBuf,
    written: Vec<bool>,
    written_count: usize,
    partial: HashMap<usize, PartialBlock>,
    digest_cursor: usize,
    hasher: Option<FileHasher>,
    verified: bool,
    listener: Box<dyn WriteListener>,
}

impl<'a> OutputFileWriter<'a> {
    /// Creates a writer for `dest`, sized to the control file's target length.
    pub fn create(dest: impl Into<PathBuf>, control: &'a ControlFile) -> OutputResult<Self> {
        Self::with_listener(dest, control, Box::new(NullListener))
    }

    /// Like [`create`](Self::create), with a listener observing block writes.
    pub fn with_listener(
        dest: impl Into<PathBuf>,
        control: &'a ControlFile,
        listener: Box<dyn WriteListener>,
    ) -> OutputResult<Self> {
        let dest = dest.into();
        let temp = temp_path(&dest);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp)?;
        let guard = TempFileGuard::new(temp);
        file.set_len(control.header().length)?;

        let num_blocks = control.header().num_blocks();
        let mut writer = Self {
            control,
            file,
            guard,
            dest,
            written: vec![false; num_blocks],
            written_count: 0,
            partial: HashMap::new(),
            digest_cursor: 0,
            hasher: Some(FileHasher::for_checksum(&control.header().file_checksum)),
            verified: false,
            listener,
        };
        // A zero-length target is complete at creation; its digest is still
        // checked against the header.
        writer.fold_written_prefix()?;
        Ok(writer)
    }

    /// Block size from the control file, in bytes.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.control.header().block_size as usize
    }

    /// Length of the finished target file, in bytes.
    #[must_use]
    pub fn target_length(&self) -> u64 {
        self.control.header().length
    }

    /// Whether every target block holds verified contents.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.written_count == self.written.len()
    }

    /// Writes a block whose contents the caller has already verified.
    ///
    /// `data` must be a full (zero-padded) block; only the unpadded payload
    /// lands in the file. Writing an already-present block is a no-op.
    pub fn write_block(&mut self, index: usize, data: &[u8]) -> OutputResult<()> {
        assert!(index < self.written.len(), "block index out of range");
        assert_eq!(data.len(), self.block_size(), "block write must cover a full block");

        if self.written[index] {
            return Ok(());
        }
        let payload = self.payload_len(index);
        let offset = index as u64 * self.block_size() as u64;
        self.write_at(offset, &data[..payload])?;
        self.commit_block(index, payload)
    }

    /// Accepts bytes fetched over HTTP for `offset`.
    ///
    /// Ranges requested from the server start on block boundaries and bytes
    /// within each block arrive in order; a block is strong-sum-checked as
    /// soon as its payload is fully covered, and only then committed. Bytes
    /// for blocks already recovered from a seed are dropped (a server that
    /// ignores range requests re-sends them).
    pub fn write_range(&mut self, offset: u64, data: &[u8]) -> OutputResult<()> {
        let block_size = self.block_size() as u64;
        let length = self.target_length();

        let mut off = offset;
        let mut rest = data;
        while !rest.is_empty() {
            if off >= length {
                return Err(OutputError::MisalignedRange { offset: off });
            }
            let index = (off / block_size) as usize;
            let within = (off % block_size) as usize;
            let payload = self.payload_len(index);
            let take = rest.len().min(payload - within);

            if self.written[index] {
                // Duplicate delivery; nothing to do.
            } else {
                let complete = {
                    let slot = self.partial.entry(index).or_insert_with(|| PartialBlock {
                        data: vec![0u8; block_size as usize],
                        filled: 0,
                    });
                    if within != slot.filled {
                        return Err(OutputError::MisalignedRange { offset: off });
                    }
                    slot.data[within..within + take].copy_from_slice(&rest[..take]);
                    slot.filled += take;
                    slot.filled == payload
                };
                if complete {
                    if let Some(staged) = self.partial.remove(&index) {
                        self.commit_fetched_block(index, staged)?;
                    }
                }
            }

            off += take as u64;
            rest = &rest[take..];
        }
        Ok(())
    }

    /// Verifies a fully staged block against its stored strong sum, then
    /// commits it.
    fn commit_fetched_block(&mut self, index: usize, staged: PartialBlock) -> OutputResult<()> {
        let digest = Md4::digest(&staged.data);
        if !self.control.block_sum(index).matches_digest(&digest) {
            return Err(OutputError::BlockChecksum { index });
        }
        let payload = self.payload_len(index);
        let offset = index as u64 * self.block_size() as u64;
        self.write_at(offset, &staged.data[..payload])?;
        self.commit_block(index, payload)
    }

    fn commit_block(&mut self, index: usize, payload: usize) -> OutputResult<()> {
        self.written[index] = true;
        self.written_count += 1;
        self.listener.block_written(index, payload);
        self.fold_written_prefix()
    }

    /// Folds newly contiguous blocks into the whole-file digest and, once the
    /// cursor reaches the end, checks it against the header.
    fn fold_written_prefix(&mut self) -> OutputResult<()> {
        let num_blocks = self.written.len();
        let block_size = self.block_size();

        if self.digest_cursor < num_blocks && self.written[self.digest_cursor] {
            let mut scratch = vec![0u8; block_size];
            while self.digest_cursor < num_blocks && self.written[self.digest_cursor] {
                let payload = self.payload_len(self.digest_cursor);
                let offset = self.digest_cursor as u64 * block_size as u64;
                self.read_at(offset, &mut scratch[..payload])?;
                if let Some(hasher) = self.hasher.as_mut() {
                    hasher.update(&scratch[..payload]);
                }
                self.digest_cursor += 1;
            }
        }

        if self.digest_cursor == num_blocks && !self.verified {
            if let Some(hasher) = self.hasher.take() {
                let expected = self.control.header().file_checksum.as_bytes();
                if hasher.finalize() != expected {
                    return Err(OutputError::FileChecksum {
                        algorithm: self.control.header().file_checksum.algorithm(),
                    });
                }
                self.verified = true;
            }
        }
        Ok(())
    }

    /// Maximal runs of still-missing blocks as byte ranges clipped to the
    /// target length, ascending.
    #[must_use]
    pub fn missing_ranges(&self) -> Vec<Range<u64>> {
        let block_size = self.block_size() as u64;
        let length = self.target_length();
        let num_blocks = self.written.len();

        let mut ranges = Vec::new();
        let mut index = 0;
        while index < num_blocks {
            if self.written[index] {
                index += 1;
                continue;
            }
            let lo = index as u64 * block_size;
            while index < num_blocks && !self.written[index] {
                index += 1;
            }
            let hi = (index as u64 * block_size).min(length);
            ranges.push(lo..hi);
        }
        ranges
    }

    /// Commits the completed file: renames the temp file over the final path,
    /// falling back to a copy where the filesystem forbids the rename.
    pub fn finish(self) -> OutputResult<PathBuf> {
        let total = self.written.len();
        let missing = total - self.written_count;
        if missing > 0 {
            return Err(OutputError::Incomplete { missing, total });
        }
        debug_assert!(self.verified, "complete output always has a checked digest");

        let Self {
            file,
            mut guard,
            dest,
            ..
        } = self;
        drop(file);

        if let Err(rename_err) = fs::rename(guard.path(), &dest) {
            tracing::debug!(
                error = %rename_err,
                temp = %guard.path().display(),
                dest = %dest.display(),
                "atomic rename failed, copying instead"
            );
            fs::copy(guard.path(), &dest)?;
            let _ = fs::remove_file(guard.path());
        }
        guard.keep();
        Ok(dest)
    }

    /// Unpadded length of block `index`.
    fn payload_len(&self, index: usize) -> usize {
        let block_size = self.block_size() as u64;
        let start = index as u64 * block_size;
        block_size.min(self.target_length() - start) as usize
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> OutputResult<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> OutputResult<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }
}

/// Sibling temp path the target is assembled under.
fn temp_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".zsync.part");
    dest.with_file_name(name)
}
