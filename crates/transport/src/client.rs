//! Blocking HTTP client with per-host basic-auth caching.

use std::collections::{HashMap, HashSet};
use std::io::BufReader;
use std::ops::Range;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{CONTENT_RANGE, CONTENT_TYPE, RANGE};
use reqwest::StatusCode;
use url::Url;

use crate::error::{TransportError, TransportResult};
use crate::multipart::MultipartRanges;
use crate::range::{format_range_header, ContentRange};

/// How long to wait for the TCP connection; transfers themselves may take
/// arbitrarily long and stream without a deadline.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Username and password for one host's Basic challenge.
#[derive(Clone, Debug)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials for [`HttpClient`]'s per-host map.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The username sent in the Basic header.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password sent in the Basic header.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Buffered response body.
pub type Body = BufReader<Response>;

/// Shape of the server's answer to a ranged GET.
pub enum RangeResponse {
    /// 200 — the server ignored the ranges; the body is the whole file,
    /// starting at offset zero.
    Full(Body),
    /// 206 with a single range described by its `Content-Range`.
    Partial {
        /// The byte span the body covers.
        range: ContentRange,
        /// The part's body.
        body: Body,
    },
    /// 206 `multipart/byteranges`; parts carry their own `Content-Range`.
    MultiPart(MultipartRanges<Body>),
}

/// Blocking HTTP client for control-file and range fetches.
///
/// Authentication follows the zsync convention: the first request to a host
/// is sent bare so the server can challenge it; a 401 is answered with Basic
/// credentials at most once per request; hosts that accepted Basic are
/// remembered for the run, and later **https** requests to them send
/// credentials preemptively. Plain-http requests never do, leaving the server
/// room to redirect to https first.
pub struct HttpClient {
    client: Client,
    credentials: HashMap<String, Credentials>,
    basic_hosts: HashSet<String>,
}

impl HttpClient {
    /// Creates a client with the given per-host credential map.
    pub fn new(credentials: HashMap<String, Credentials>) -> TransportResult<Self> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            client,
            credentials,
            basic_hosts: HashSet::new(),
        })
    }

    /// Fetches `url`, returning the response body for any 2xx status.
    ///
    /// 404 becomes [`TransportError::NotFound`] so callers can distinguish a
    /// missing control file from other failures.
    pub fn get(&mut self, url: &Url) -> TransportResult<Body> {
        let response = self.send(url, None)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            Err(TransportError::NotFound {
                url: url.to_string(),
            })
        } else if status.is_success() {
            Ok(BufReader::new(response))
        } else {
            Err(TransportError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            })
        }
    }

    /// Issues one GET for the given byte ranges and classifies the response.
    pub fn get_ranges(
        &mut self,
        url: &Url,
        ranges: &[Range<u64>],
    ) -> TransportResult<RangeResponse> {
        let header = format_range_header(ranges);
        tracing::debug!(url = %url, ranges = ranges.len(), "requesting byte ranges");
        let response = self.send(url, Some(&header))?;

        let status = response.status();
        if status == StatusCode::OK {
            Ok(RangeResponse::Full(BufReader::new(response)))
        } else if status == StatusCode::PARTIAL_CONTENT {
            let content_type = header_string(&response, CONTENT_TYPE.as_str());
            if let Some(boundary) = multipart_boundary(&content_type) {
                Ok(RangeResponse::MultiPart(MultipartRanges::new(
                    BufReader::new(response),
                    &boundary,
                )))
            } else {
                let value = header_string(&response, CONTENT_RANGE.as_str());
                let range = ContentRange::parse(&value)?;
                Ok(RangeResponse::Partial {
                    range,
                    body: BufReader::new(response),
                })
            }
        } else if status == StatusCode::NOT_FOUND {
            Err(TransportError::NotFound {
                url: url.to_string(),
            })
        } else {
            Err(TransportError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            })
        }
    }

    /// Sends a GET, handling the 401 challenge dance.
    fn send(&mut self, url: &Url, range: Option<&str>) -> TransportResult<Response> {
        let host = url.host_str().unwrap_or_default().to_string();
        let preemptive = url.scheme() == "https" && self.basic_hosts.contains(&host);

        let mut request = self.request(url, range);
        if preemptive {
            if let Some(credentials) = self.credentials.get(&host) {
                request = request.basic_auth(credentials.username(), Some(credentials.password()));
            }
        }

        let response = request.send()?;
        if response.status() != StatusCode::UNAUTHORIZED || preemptive {
            return Ok(response);
        }

        let Some(credentials) = self.credentials.get(&host) else {
            return Err(TransportError::MissingCredentials { host });
        };
        tracing::debug!(%host, "retrying with basic credentials after 401");
        let retry = self
            .request(url, range)
            .basic_auth(credentials.username(), Some(credentials.password()))
            .send()?;
        if retry.status() != StatusCode::UNAUTHORIZED {
            self.basic_hosts.insert(host);
        }
        Ok(retry)
    }

    fn request(&self, url: &Url, range: Option<&str>) -> RequestBuilder {
        let mut request = self.client.get(url.clone());
        if let Some(range) = range {
            request = request.header(RANGE, range);
        }
        request
    }
}

fn header_string(response: &Response, name: &str) -> String {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Extracts the boundary parameter from a `multipart/byteranges` media type.
pub(crate) fn multipart_boundary(content_type: &str) -> Option<String> {
    let (kind, params) = content_type.split_once(';')?;
    if !kind.trim().eq_ignore_ascii_case("multipart/byteranges") {
        return None;
    }
    for param in params.split(';') {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("boundary") {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_extracted_from_content_type() {
        assert_eq!(
            multipart_boundary("multipart/byteranges; boundary=THIS_STRING_SEPARATES"),
            Some("THIS_STRING_SEPARATES".to_string())
        );
        assert_eq!(
            multipart_boundary("multipart/byteranges; charset=binary; boundary=\"quoted\""),
            Some("quoted".to_string())
        );
        assert_eq!(
            multipart_boundary("Multipart/ByteRanges; BOUNDARY=upper"),
            Some("upper".to_string())
        );
    }

    #[test]
    fn non_multipart_media_types_have_no_boundary() {
        assert_eq!(multipart_boundary("application/octet-stream"), None);
        assert_eq!(
            multipart_boundary("application/octet-stream; boundary=x"),
            None
        );
        assert_eq!(multipart_boundary("multipart/byteranges"), None);
        assert_eq!(multipart_boundary("multipart/byteranges; boundary="), None);
    }
}
