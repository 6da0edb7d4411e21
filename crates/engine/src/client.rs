//! The orchestrator: from a control-file URI to a verified output file.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use controlfile::{ControlFile, Header};
use matching::{padding_for, BlockMatcher, RollingBuffer, ZeroPaddedReader};
use output::OutputFileWriter;
use transport::{HttpClient, TransportError};
use url::Url;

use crate::error::{ZsyncError, ZsyncResult};
use crate::events::{CountingReader, DispatchWriteListener, EventDispatcher};
use crate::fetch::fetch_missing;
use crate::options::Options;
use crate::ZsyncObserver;

/// Backing capacity of the seed scan window, in blocks.
const SCAN_LOOKBEHIND_BLOCKS: usize = 16;

/// Runs a zsync download without observers.
///
/// See [`zsync_with_observers`] for the full contract.
pub fn zsync(uri: &str, options: &Options) -> ZsyncResult<PathBuf> {
    zsync_with_observers(uri, options, Vec::new())
}

/// Runs a zsync download: reconstructs the file described by the control
/// file at `uri` from local seeds plus one ranged HTTP fetch, and returns
/// the path of the verified output file.
///
/// `uri` may be an `http(s)` URL or a local filesystem path. Options are
/// snapshotted at entry. Observers receive lifecycle and progress callbacks
/// but cannot influence the run.
pub fn zsync_with_observers(
    uri: &str,
    options: &Options,
    observers: Vec<Box<dyn ZsyncObserver>>,
) -> ZsyncResult<PathBuf> {
    let events = EventDispatcher::new(observers);
    let mut options = options.clone();

    events.zsync_started(uri);
    match run(uri, &mut options, &events) {
        Ok(path) => {
            tracing::info!(path = %path.display(), "zsync completed");
            events.zsync_completed(&path);
            Ok(path)
        }
        Err(error) => {
            tracing::debug!(%error, "zsync failed");
            events.zsync_failed(&error);
            Err(error)
        }
    }
}

fn run(uri: &str, options: &mut Options, events: &EventDispatcher) -> ZsyncResult<PathBuf> {
    let mut client = HttpClient::new(options.credentials.clone())?;

    let control = open_control_file(uri, options, &mut client, events)?;
    let header = control.header();
    tracing::debug!(
        filename = %header.filename,
        length = header.length,
        block_size = header.block_size,
        blocks = header.num_blocks(),
        "parsed control file"
    );

    let output_path = options
        .output_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(&header.filename));

    // An existing file at the output path is scanned first, ahead of any
    // caller-supplied seed.
    let mut seeds = Vec::with_capacity(options.seed_files.len() + 1);
    if output_path.exists() {
        seeds.push(output_path.clone());
    }
    seeds.extend(options.seed_files.iter().cloned());

    let target_url = resolve_target_url(&header.url, options)?;

    let listener = Box::new(DispatchWriteListener::new(events.clone()));
    let mut writer = OutputFileWriter::with_listener(&output_path, &control, listener)?;

    for seed in &seeds {
        if writer.is_complete() {
            break;
        }
        events.seed_started(seed);
        scan_seed(seed, &control, &mut writer, events)?;
    }

    if !writer.is_complete() {
        fetch_missing(&mut client, &target_url, &mut writer, events)?;
    }

    let path = writer.finish()?;
    apply_mtime(&path, header);
    Ok(path)
}

/// Opens and parses the control file, local or remote (step 1 and 2).
///
/// When `uri` is remote it becomes the base for resolving a relative target
/// URL, and the response is optionally written to the save path first.
fn open_control_file(
    uri: &str,
    options: &mut Options,
    client: &mut HttpClient,
    events: &EventDispatcher,
) -> ZsyncResult<ControlFile> {
    if let Ok(url) = Url::parse(uri) {
        match url.scheme() {
            "http" | "https" => {
                options.zsync_file_source = Some(url.clone());
                let body = match client.get(&url) {
                    Err(TransportError::NotFound { .. }) => {
                        return Err(ZsyncError::ControlFileNotFound {
                            uri: uri.to_string(),
                        })
                    }
                    other => other?,
                };
                if let Some(save_path) = options.save_zsync_file.clone() {
                    save_control_copy(body, &save_path)?;
                    return parse_local_control(&save_path, events);
                }
                let counting = events.clone();
                let mut reader =
                    BufReader::new(CountingReader::new(body, move |n| {
                        counting.control_file_read(n);
                    }));
                return Ok(ControlFile::read(&mut reader)?);
            }
            "file" => {
                if let Ok(path) = url.to_file_path() {
                    return parse_local_control(&path, events);
                }
            }
            // Anything else (including Windows drive letters parsing as a
            // scheme) is treated as a local path below.
            _ => {}
        }
    }
    parse_local_control(Path::new(uri), events)
}

fn save_control_copy(mut body: impl io::Read, save_path: &Path) -> ZsyncResult<()> {
    tracing::debug!(path = %save_path.display(), "saving control file copy");
    let mut file = File::create(save_path)?;
    io::copy(&mut body, &mut file)?;
    Ok(())
}

fn parse_local_control(path: &Path, events: &EventDispatcher) -> ZsyncResult<ControlFile> {
    let file = match File::open(path) {
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Err(ZsyncError::ControlFileNotFound {
                uri: path.display().to_string(),
            })
        }
        other => other?,
    };
    let counting = events.clone();
    let mut reader = BufReader::new(CountingReader::new(file, move |n| {
        counting.control_file_read(n);
    }));
    Ok(ControlFile::read(&mut reader)?)
}

/// Resolves the header's target URL, against the control file's own location
/// when relative (step 5).
fn resolve_target_url(raw: &str, options: &Options) -> ZsyncResult<Url> {
    match Url::parse(raw) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let Some(base) = options.zsync_file_source.as_ref() else {
                return Err(ZsyncError::RelativeTargetUrl {
                    url: raw.to_string(),
                });
            };
            base.join(raw).map_err(|source| ZsyncError::InvalidTargetUrl {
                url: raw.to_string(),
                source,
            })
        }
        Err(source) => Err(ZsyncError::InvalidTargetUrl {
            url: raw.to_string(),
            source,
        }),
    }
}

/// Scans one seed file, writing every matched block (step 7).
///
/// Seed I/O failures abandon this seed and are not fatal to the run; writer
/// failures are.
fn scan_seed(
    path: &Path,
    control: &ControlFile,
    writer: &mut OutputFileWriter<'_>,
    events: &EventDispatcher,
) -> ZsyncResult<()> {
    let block_size = u64::from(control.header().block_size);

    let file = match File::open(path) {
        Ok(file) => file,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "skipping unreadable seed");
            return Ok(());
        }
    };
    let seed_len = match file.metadata() {
        Ok(metadata) => metadata.len(),
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "skipping unreadable seed");
            return Ok(());
        }
    };

    let counting = events.clone();
    let counted = CountingReader::new(file, move |n| counting.seed_bytes_scanned(n));
    let padded = ZeroPaddedReader::new(counted, padding_for(seed_len, block_size));
    let mut buffer = match RollingBuffer::new(
        padded,
        block_size as usize,
        SCAN_LOOKBEHIND_BLOCKS * block_size as usize,
    ) {
        Ok(buffer) => buffer,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "skipping unreadable seed");
            return Ok(());
        }
    };

    let mut matcher = BlockMatcher::new(control);
    loop {
        let consumed = matcher.next_match(writer, &mut buffer)?;
        if writer.is_complete() {
            break;
        }
        match buffer.advance(consumed) {
            Ok(true) => {}
            Ok(false) => break,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "seed read failed, abandoning seed");
                break;
            }
        }
    }
    Ok(())
}

/// Propagates the header's modification time to the finished file.
fn apply_mtime(path: &Path, header: &Header) {
    let Some(mtime) = header.mtime else { return };
    let stamp = filetime::FileTime::from_unix_time(mtime.unix_timestamp(), 0);
    if let Err(error) = filetime::set_file_mtime(path, stamp) {
        tracing::warn!(path = %path.display(), %error, "failed to apply modification time");
    }
}
