//! Byte-range header formatting and parsing.

use std::fmt::Write as _;
use std::ops::Range;

use crate::error::{TransportError, TransportResult};

/// Formats half-open byte ranges as an HTTP `Range` header value.
///
/// The wire form uses inclusive last-byte positions:
/// `[0, 4)` and `[8, 10)` become `bytes=0-3,8-9`.
///
/// # Panics
///
/// Panics if `ranges` is empty or contains an empty range; callers derive the
/// list from missing blocks, which are never empty.
#[must_use]
pub fn format_range_header(ranges: &[Range<u64>]) -> String {
    assert!(!ranges.is_empty(), "a Range header needs at least one range");

    let mut value = String::from("bytes=");
    for (position, range) in ranges.iter().enumerate() {
        assert!(range.start < range.end, "byte ranges must be non-empty");
        if position > 0 {
            value.push(',');
        }
        let _ = write!(value, "{}-{}", range.start, range.end - 1);
    }
    value
}

/// A parsed `Content-Range: bytes lo-hi/total` header.
///
/// `end` is exclusive, converted from the wire's inclusive last byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ContentRange {
    /// First byte position covered by the response part.
    pub start: u64,
    /// One past the last byte position covered.
    pub end: u64,
    /// Complete length of the resource, when the server knows it.
    pub total: Option<u64>,
}

impl ContentRange {
    /// Parses a `Content-Range` header value.
    pub fn parse(value: &str) -> TransportResult<Self> {
        let invalid = || TransportError::InvalidContentRange {
            value: value.to_string(),
        };

        let spec = value.trim().strip_prefix("bytes").ok_or_else(invalid)?.trim_start();
        let (span, total) = spec.split_once('/').ok_or_else(invalid)?;
        let (start, last) = span.split_once('-').ok_or_else(invalid)?;
        let start: u64 = start.trim().parse().map_err(|_| invalid())?;
        let last: u64 = last.trim().parse().map_err(|_| invalid())?;
        if last < start {
            return Err(invalid());
        }
        let total = match total.trim() {
            "*" => None,
            text => Some(text.parse().map_err(|_| invalid())?),
        };

        Ok(Self {
            start,
            end: last + 1,
            total,
        })
    }

    /// Number of bytes the part covers.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Whether the part covers no bytes; cannot occur for parsed headers.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_single_and_multiple_ranges() {
        assert_eq!(format_range_header(&[0..10]), "bytes=0-9");
        assert_eq!(format_range_header(&[0..4, 8..10]), "bytes=0-3,8-9");
        assert_eq!(
            format_range_header(&[4..8, 12..16, 20..21]),
            "bytes=4-7,12-15,20-20"
        );
    }

    #[test]
    fn parses_well_formed_content_range() {
        let range = ContentRange::parse("bytes 0-499/1234").expect("parse");
        assert_eq!(range.start, 0);
        assert_eq!(range.end, 500);
        assert_eq!(range.total, Some(1234));
        assert_eq!(range.len(), 500);
    }

    #[test]
    fn parses_unknown_total_length() {
        let range = ContentRange::parse("bytes 4-7/*").expect("parse");
        assert_eq!(range.start, 4);
        assert_eq!(range.end, 8);
        assert_eq!(range.total, None);
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let range = ContentRange::parse("  bytes 8-9/10 ").expect("parse");
        assert_eq!((range.start, range.end), (8, 10));
    }

    #[test]
    fn rejects_malformed_values() {
        for value in [
            "items 0-4/10",
            "bytes 0-4",
            "bytes x-4/10",
            "bytes 4-0/10",
            "bytes 0-4/ten",
        ] {
            assert!(
                ContentRange::parse(value).is_err(),
                "{value:?} should be rejected"
            );
        }
    }
}
