//! Textual header of a control file.

use std::io::BufRead;

use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;

use crate::error::{ControlFileError, ControlFileResult};

/// Whole-file digest recorded in the header.
///
/// Older control files carry an MD4 digest, newer ones SHA-1; whichever the
/// header specifies is accepted and verified after reassembly.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FileChecksum {
    /// 128-bit MD4 digest of the target file.
    Md4([u8; 16]),
    /// 160-bit SHA-1 digest of the target file.
    Sha1([u8; 20]),
}

impl FileChecksum {
    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Md4(bytes) => bytes,
            Self::Sha1(bytes) => bytes,
        }
    }

    /// Name of the digest algorithm, as spelled in the header.
    #[must_use]
    pub const fn algorithm(&self) -> &'static str {
        match self {
            Self::Md4(_) => "MD4",
            Self::Sha1(_) => "SHA-1",
        }
    }
}

/// Parsed control-file header.
///
/// Immutable after parse; the block-sum table that follows it on the wire is
/// kept separately in [`crate::ControlFile`].
#[derive(Clone, Debug)]
pub struct Header {
    /// Value of the `zsync` version key.
    pub version: String,
    /// Producer software, when recorded.
    pub producer: Option<String>,
    /// Target filename hint used to derive the default output path.
    pub filename: String,
    /// Target URL, possibly relative to the control file's own location.
    pub url: String,
    /// Modification time of the target file, when recorded.
    pub mtime: Option<OffsetDateTime>,
    /// Length of the target file in bytes.
    pub length: u64,
    /// Block size used by the producer.
    pub block_size: u32,
    /// Number of consecutive block matches required by the producer (1 or 2).
    pub sequence_matches: u8,
    /// Stored weak-sum width in bytes (2 to 4).
    pub weak_len: u8,
    /// Stored strong-sum width in bytes (3 to 16).
    pub strong_len: u8,
    /// Whole-file digest to verify the reassembled target against.
    pub file_checksum: FileChecksum,
}

impl Header {
    /// Number of blocks in the target, `⌈length / block_size⌉`.
    #[must_use]
    pub fn num_blocks(&self) -> usize {
        self.length.div_ceil(u64::from(self.block_size)) as usize
    }

    /// Reads `Key: value` lines until the empty line that separates the
    /// header from the block-sum table.
    pub(crate) fn read<R: BufRead>(reader: &mut R) -> ControlFileResult<Self> {
        let mut version = None;
        let mut producer = None;
        let mut filename = None;
        let mut url = None;
        let mut mtime = None;
        let mut length = None;
        let mut block_size = None;
        let mut hash_lengths = None;
        let mut md4 = None;
        let mut sha1 = None;

        loop {
            let Some(line) = read_header_line(reader)? else {
                break;
            };
            if line.is_empty() {
                break;
            }
            let Some((key, value)) = line.split_once(':') else {
                return Err(ControlFileError::MalformedHeaderLine { line });
            };
            let value = value.trim();
            match key.trim() {
                "zsync" => version = Some(value.to_string()),
                "Producer" => producer = Some(value.to_string()),
                "Filename" => filename = Some(value.to_string()),
                "URL" => url = Some(value.to_string()),
                "MTime" => mtime = Some(parse_mtime(value)?),
                "Length" => length = Some(parse_u64("Length", value)?),
                "Blocksize" => block_size = Some(parse_block_size(value)?),
                "Hash-Lengths" => hash_lengths = Some(parse_hash_lengths(value)?),
                "MD4" => md4 = Some(parse_digest::<16>("MD4", value)?),
                "SHA-1" => sha1 = Some(parse_digest::<20>("SHA-1", value)?),
                // Unknown keys are ignored for forward compatibility.
                _ => {}
            }
        }

        let (sequence_matches, weak_len, strong_len) =
            hash_lengths.ok_or(ControlFileError::MissingKey {
                key: "Hash-Lengths",
            })?;
        let file_checksum = match (sha1, md4) {
            (Some(digest), _) => FileChecksum::Sha1(digest),
            (None, Some(digest)) => FileChecksum::Md4(digest),
            (None, None) => return Err(ControlFileError::MissingKey { key: "SHA-1" }),
        };

        Ok(Self {
            version: version.ok_or(ControlFileError::MissingKey { key: "zsync" })?,
            producer,
            filename: filename.ok_or(ControlFileError::MissingKey { key: "Filename" })?,
            url: url.ok_or(ControlFileError::MissingKey { key: "URL" })?,
            mtime,
            length: length.ok_or(ControlFileError::MissingKey { key: "Length" })?,
            block_size: block_size.ok_or(ControlFileError::MissingKey { key: "Blocksize" })?,
            sequence_matches,
            weak_len,
            strong_len,
            file_checksum,
        })
    }
}

/// Reads one LF-terminated line, or `None` at end of stream.
fn read_header_line<R: BufRead>(reader: &mut R) -> ControlFileResult<Option<String>> {
    let mut raw = Vec::new();
    if reader.read_until(b'\n', &mut raw)? == 0 {
        return Ok(None);
    }
    while matches!(raw.last(), Some(b'\n' | b'\r')) {
        raw.pop();
    }
    String::from_utf8(raw)
        .map(Some)
        .map_err(|_| ControlFileError::HeaderEncoding)
}

fn parse_u64(key: &'static str, value: &str) -> ControlFileResult<u64> {
    value.parse().map_err(|_| ControlFileError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_block_size(value: &str) -> ControlFileResult<u32> {
    match value.parse::<u32>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(ControlFileError::InvalidBlockSize),
    }
}

fn parse_hash_lengths(value: &str) -> ControlFileResult<(u8, u8, u8)> {
    let invalid = || ControlFileError::InvalidHashLengths {
        value: value.to_string(),
    };

    let mut parts = value.split(',').map(|part| part.trim().parse::<u8>());
    let sequence_matches = parts.next().and_then(Result::ok).ok_or_else(invalid)?;
    let weak_len = parts.next().and_then(Result::ok).ok_or_else(invalid)?;
    let strong_len = parts.next().and_then(Result::ok).ok_or_else(invalid)?;
    if parts.next().is_some()
        || !(1..=2).contains(&sequence_matches)
        || !(2..=4).contains(&weak_len)
        || !(3..=16).contains(&strong_len)
    {
        return Err(invalid());
    }
    Ok((sequence_matches, weak_len, strong_len))
}

fn parse_digest<const N: usize>(key: &'static str, value: &str) -> ControlFileResult<[u8; N]> {
    let invalid = || ControlFileError::InvalidValue {
        key,
        value: value.to_string(),
    };

    let bytes = hex::decode(value).map_err(|_| invalid())?;
    bytes.try_into().map_err(|_| invalid())
}

fn parse_mtime(value: &str) -> ControlFileResult<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc2822).map_err(|_| ControlFileError::InvalidValue {
        key: "MTime",
        value: value.to_string(),
    })
}
