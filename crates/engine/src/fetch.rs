//! Drives the ranged HTTP fetch for blocks no seed could supply.

use std::io::{self, Read};

use output::OutputFileWriter;
use transport::{HttpClient, RangeResponse, TransportError};
use url::Url;

use crate::error::ZsyncResult;
use crate::events::EventDispatcher;

/// Read granularity for response bodies.
const CHUNK_LEN: usize = 32 * 1024;

/// Requests the writer's missing ranges in one GET and streams the response
/// into the writer.
///
/// Handles the three response shapes: a 200 that replays the entire file
/// (bytes for blocks already recovered are dropped by the writer), a 206 with
/// a single range, and a 206 `multipart/byteranges` body.
pub(crate) fn fetch_missing(
    client: &mut HttpClient,
    url: &Url,
    writer: &mut OutputFileWriter<'_>,
    events: &EventDispatcher,
) -> ZsyncResult<()> {
    let ranges = writer.missing_ranges();
    debug_assert!(!ranges.is_empty(), "nothing to fetch for a complete file");
    tracing::debug!(url = %url, ranges = ranges.len(), "fetching missing ranges");

    match client.get_ranges(url, &ranges)? {
        RangeResponse::Full(mut body) => {
            tracing::debug!("server ignored the range request, streaming the full file");
            let length = writer.target_length();
            stream_into(writer, &mut body, 0, length, events)
        }
        RangeResponse::Partial { range, mut body } => {
            stream_into(writer, &mut body, range.start, range.len(), events)
        }
        RangeResponse::MultiPart(mut parts) => {
            loop {
                let Some(range) = parts.next_part()? else {
                    return Ok(());
                };
                stream_into(writer, &mut parts, range.start, range.len(), events)?;
            }
        }
    }
}

/// Copies exactly `expected` body bytes into the writer starting at `offset`.
fn stream_into<R: Read>(
    writer: &mut OutputFileWriter<'_>,
    body: &mut R,
    offset: u64,
    expected: u64,
    events: &EventDispatcher,
) -> ZsyncResult<()> {
    let mut buf = [0u8; CHUNK_LEN];
    let mut received = 0u64;
    while received < expected {
        let cap = buf
            .len()
            .min(usize::try_from(expected - received).unwrap_or(usize::MAX));
        let read = body.read(&mut buf[..cap]).map_err(TransportError::from)?;
        if read == 0 {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("response body ended after {received} of {expected} bytes"),
            ))
            .into());
        }
        writer.write_range(offset + received, &buf[..read])?;
        events.range_received(offset + received, read);
        events.bytes_downloaded(read as u64);
        received += read as u64;
    }
    Ok(())
}
