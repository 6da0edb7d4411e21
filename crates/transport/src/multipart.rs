//! Streaming reader for `multipart/byteranges` response bodies.

use std::io::{self, BufRead, Read};

use crate::error::{TransportError, TransportResult};
use crate::range::ContentRange;

/// Iterates the parts of a `multipart/byteranges` body.
///
/// [`next_part`](Self::next_part) positions the stream at the body of the
/// next part and returns its `Content-Range`; the part's bytes are then read
/// through the [`Read`] implementation, which stops at the part boundary.
/// Part headers may end lines with CRLF or bare LF; both are accepted.
pub struct MultipartRanges<R> {
    inner: R,
    delimiter: String,
    terminator: String,
    pending: u64,
    finished: bool,
}

impl<R: BufRead> MultipartRanges<R> {
    /// Wraps a response body using the boundary from its `Content-Type`.
    pub fn new(inner: R, boundary: &str) -> Self {
        Self {
            inner,
            delimiter: format!("--{boundary}"),
            terminator: format!("--{boundary}--"),
            pending: 0,
            finished: false,
        }
    }

    /// Advances past any unread body bytes and boundary framing to the next
    /// part, returning its `Content-Range`, or `None` after the terminator.
    pub fn next_part(&mut self) -> TransportResult<Option<ContentRange>> {
        if self.finished {
            return Ok(None);
        }
        self.skip_pending()?;

        loop {
            let Some(line) = self.read_line()? else {
                return Err(TransportError::Multipart {
                    reason: "body ended without a closing boundary".to_string(),
                });
            };
            if line == self.terminator {
                self.finished = true;
                return Ok(None);
            }
            if line == self.delimiter {
                break;
            }
            // Preamble or the blank line that separates parts; skip it.
        }

        let mut content_range = None;
        loop {
            let Some(line) = self.read_line()? else {
                return Err(TransportError::Multipart {
                    reason: "part headers are unterminated".to_string(),
                });
            };
            if line.is_empty() {
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                if key.trim().eq_ignore_ascii_case("content-range") {
                    content_range = Some(ContentRange::parse(value)?);
                }
            }
        }

        let Some(range) = content_range else {
            return Err(TransportError::Multipart {
                reason: "part carries no Content-Range header".to_string(),
            });
        };
        self.pending = range.len();
        Ok(Some(range))
    }

    /// Reads one header/boundary line, tolerating CRLF and LF endings.
    fn read_line(&mut self) -> TransportResult<Option<String>> {
        let mut raw = Vec::new();
        if self.inner.read_until(b'\n', &mut raw)? == 0 {
            return Ok(None);
        }
        while matches!(raw.last(), Some(b'\n' | b'\r')) {
            raw.pop();
        }
        String::from_utf8(raw)
            .map(Some)
            .map_err(|_| TransportError::Multipart {
                reason: "part header is not valid UTF-8".to_string(),
            })
    }

    /// Discards body bytes of the current part the caller did not read.
    fn skip_pending(&mut self) -> TransportResult<()> {
        while self.pending > 0 {
            let available = self.inner.fill_buf()?;
            if available.is_empty() {
                return Err(TransportError::Multipart {
                    reason: "part body ended early".to_string(),
                });
            }
            let take = available
                .len()
                .min(usize::try_from(self.pending).unwrap_or(usize::MAX));
            self.inner.consume(take);
            self.pending -= take as u64;
        }
        Ok(())
    }
}

impl<R: BufRead> Read for MultipartRanges<R> {
    /// Reads body bytes of the current part, stopping at the part boundary.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending == 0 || buf.is_empty() {
            return Ok(0);
        }
        let cap = buf
            .len()
            .min(usize::try_from(self.pending).unwrap_or(usize::MAX));
        let read = self.inner.read(&mut buf[..cap])?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "multipart part body ended early",
            ));
        }
        self.pending -= read as u64;
        Ok(read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn body(line_ending: &str) -> Vec<u8> {
        let e = line_ending;
        format!(
            "--BOUND{e}\
             Content-Type: application/octet-stream{e}\
             Content-Range: bytes 0-3/10{e}\
             {e}\
             ABCD{e}\
             --BOUND{e}\
             Content-Range: bytes 8-9/10{e}\
             {e}\
             IJ{e}\
             --BOUND--{e}"
        )
        .into_bytes()
    }

    fn collect_parts(body: Vec<u8>) -> Vec<(ContentRange, Vec<u8>)> {
        let mut stream = MultipartRanges::new(Cursor::new(body), "BOUND");
        let mut parts = Vec::new();
        while let Some(range) = stream.next_part().expect("next part") {
            let mut data = vec![0u8; range.len() as usize];
            stream.read_exact(&mut data).expect("part body");
            parts.push((range, data));
        }
        parts
    }

    #[test]
    fn iterates_parts_with_crlf_headers() {
        let parts = collect_parts(body("\r\n"));
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].0, ContentRange { start: 0, end: 4, total: Some(10) });
        assert_eq!(parts[0].1, b"ABCD");
        assert_eq!(parts[1].0, ContentRange { start: 8, end: 10, total: Some(10) });
        assert_eq!(parts[1].1, b"IJ");
    }

    #[test]
    fn iterates_parts_with_lf_headers() {
        let parts = collect_parts(body("\n"));
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].1, b"ABCD");
        assert_eq!(parts[1].1, b"IJ");
    }

    #[test]
    fn unread_part_bytes_are_skipped() {
        let mut stream = MultipartRanges::new(Cursor::new(body("\r\n")), "BOUND");
        // Read the first part's range but none of its body.
        stream.next_part().expect("first part").expect("some");
        let second = stream.next_part().expect("second part").expect("some");
        assert_eq!(second.start, 8);
        let mut data = Vec::new();
        stream.read_to_end(&mut data).expect("read");
        assert_eq!(data, b"IJ");
        assert!(stream.next_part().expect("terminator").is_none());
    }

    #[test]
    fn part_without_content_range_is_rejected() {
        let body = b"--BOUND\r\nContent-Type: text/plain\r\n\r\nXX\r\n--BOUND--\r\n".to_vec();
        let mut stream = MultipartRanges::new(Cursor::new(body), "BOUND");
        let err = stream.next_part().unwrap_err();
        assert!(matches!(err, TransportError::Multipart { .. }));
    }

    #[test]
    fn missing_terminator_is_rejected() {
        let body = b"--BOUND\r\nContent-Range: bytes 0-1/2\r\n\r\nAB\r\n".to_vec();
        let mut stream = MultipartRanges::new(Cursor::new(body), "BOUND");
        stream.next_part().expect("first part");
        let mut data = [0u8; 2];
        stream.read_exact(&mut data).expect("body");
        let err = stream.next_part().unwrap_err();
        assert!(matches!(err, TransportError::Multipart { .. }));
    }
}
