//! Minimal HTTP fixture serving a control file and ranged target data.
//!
//! One connection handles one request and closes, which keeps the server a
//! plain accept loop on a background thread.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// Boundary used for multipart/byteranges responses.
pub const BOUNDARY: &str = "zsyncfixture";

/// Whether the server honors `Range` headers or replays the full body.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RangeHandling {
    Honor,
    Ignore,
}

/// Counters shared with the serving thread.
#[derive(Default)]
pub struct Counters {
    /// GETs seen for the data path.
    pub data_requests: AtomicUsize,
    /// Payload bytes served from the data path.
    pub data_bytes: AtomicUsize,
    /// `Range` header of the most recent data request.
    pub last_range: Mutex<Option<String>>,
}

pub struct TestServer {
    base: String,
    pub counters: Arc<Counters>,
}

impl TestServer {
    /// URL of the served control file.
    pub fn control_url(&self) -> String {
        format!("{}/file.zsync", self.base)
    }

    /// URL of the served target data.
    pub fn data_url(&self) -> String {
        format!("{}/file", self.base)
    }
}

/// Starts the fixture server.
///
/// `control` is served at `/file.zsync` (404 when `None`); `data` is served
/// at `/file`, honoring or ignoring ranges per `ranges`.
pub fn spawn_server(control: Option<Vec<u8>>, data: Vec<u8>, ranges: RangeHandling) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind fixture server");
    let port = listener.local_addr().expect("local addr").port();
    let counters = Arc::new(Counters::default());

    let thread_counters = Arc::clone(&counters);
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let _ = serve_connection(stream, control.as_deref(), &data, ranges, &thread_counters);
        }
    });

    TestServer {
        base: format!("http://127.0.0.1:{port}"),
        counters,
    }
}

fn serve_connection(
    mut stream: TcpStream,
    control: Option<&[u8]>,
    data: &[u8],
    ranges: RangeHandling,
    counters: &Counters,
) -> io::Result<()> {
    let Some((path, range)) = read_request(&mut stream)? else {
        return Ok(());
    };

    match path.as_str() {
        "/file.zsync" => match control {
            Some(bytes) => write_response(&mut stream, "200 OK", &[], bytes),
            None => write_response(&mut stream, "404 Not Found", &[], b"no such file"),
        },
        "/file" => {
            counters.data_requests.fetch_add(1, Ordering::SeqCst);
            *counters.last_range.lock().expect("lock") = range.clone();

            match (range, ranges) {
                (Some(value), RangeHandling::Honor) => {
                    let spans = parse_range_header(&value);
                    serve_ranges(&mut stream, data, &spans, counters)
                }
                _ => {
                    counters.data_bytes.fetch_add(data.len(), Ordering::SeqCst);
                    write_response(&mut stream, "200 OK", &[], data)
                }
            }
        }
        _ => write_response(&mut stream, "404 Not Found", &[], b"no such file"),
    }
}

fn serve_ranges(
    stream: &mut TcpStream,
    data: &[u8],
    spans: &[(u64, u64)],
    counters: &Counters,
) -> io::Result<()> {
    let payload: usize = spans.iter().map(|&(lo, hi)| (hi - lo + 1) as usize).sum();
    counters.data_bytes.fetch_add(payload, Ordering::SeqCst);

    if let [(lo, hi)] = spans {
        let body = &data[*lo as usize..=*hi as usize];
        let content_range = format!("bytes {lo}-{hi}/{}", data.len());
        write_response(
            stream,
            "206 Partial Content",
            &[("Content-Range", content_range)],
            body,
        )
    } else {
        let mut body = Vec::new();
        for &(lo, hi) in spans {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Type: application/octet-stream\r\n\
                     Content-Range: bytes {lo}-{hi}/{}\r\n\r\n",
                    data.len()
                )
                .as_bytes(),
            );
            body.extend_from_slice(&data[lo as usize..=hi as usize]);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        let content_type = format!("multipart/byteranges; boundary={BOUNDARY}");
        write_response(
            stream,
            "206 Partial Content",
            &[("Content-Type", content_type)],
            &body,
        )
    }
}

/// Reads the request head, returning the path and any `Range` header.
fn read_request(stream: &mut TcpStream) -> io::Result<Option<(String, Option<String>)>> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line)? == 0 {
        return Ok(None);
    }
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();

    let mut range = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            if key.trim().eq_ignore_ascii_case("range") {
                range = Some(value.trim().to_string());
            }
        }
    }
    Ok(Some((path, range)))
}

fn write_response(
    stream: &mut TcpStream,
    status: &str,
    headers: &[(&str, String)],
    body: &[u8],
) -> io::Result<()> {
    let mut head = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n",
        body.len()
    );
    for (key, value) in headers {
        head.push_str(&format!("{key}: {value}\r\n"));
    }
    head.push_str("\r\n");
    stream.write_all(head.as_bytes())?;
    stream.write_all(body)?;
    stream.flush()
}

/// Parses `bytes=lo-hi,lo-hi` into inclusive spans.
fn parse_range_header(value: &str) -> Vec<(u64, u64)> {
    value
        .strip_prefix("bytes=")
        .unwrap_or(value)
        .split(',')
        .filter_map(|span| {
            let (lo, hi) = span.trim().split_once('-')?;
            Some((lo.parse().ok()?, hi.parse().ok()?))
        })
        .collect()
}
