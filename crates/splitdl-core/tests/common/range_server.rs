//! Minimal HTTP/1.1 server that supports HEAD and Range GET for integration tests.
//!
//! Serves a single static body. Every request is recorded so tests can assert
//! which ranges were fetched (or that nothing was fetched at all).

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// If false, omit `Accept-Ranges: bytes` even if ranges work (or claim it when they don't).
    pub advertise_ranges: bool,
    /// If false, HEAD omits `Content-Length`.
    pub report_length: bool,
    /// If set, every GET is answered with this status and an empty body.
    pub get_status: Option<u16>,
    /// If set, GET bodies are cut after this many bytes while declaring the full length.
    pub truncate_body_at: Option<usize>,
    /// If set, ranged GETs starting at or after this offset get a 500.
    pub fail_ranges_from: Option<u64>,
    /// If set, GET bodies are sent in 16 KiB pieces with this pause between them.
    pub chunk_delay: Option<Duration>,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            support_ranges: true,
            advertise_ranges: true,
            report_length: true,
            get_status: None,
            truncate_body_at: None,
            fail_ranges_from: None,
            chunk_delay: None,
        }
    }
}

/// One request as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub method: String,
    /// `(start, end_inclusive)` from `Range: bytes=X-Y`.
    pub range: Option<(u64, u64)>,
}

pub struct RangeServer {
    pub url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl RangeServer {
    pub fn requests(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn get_ranges(&self) -> Vec<(u64, u64)> {
        let mut ranges: Vec<(u64, u64)> = self
            .requests()
            .into_iter()
            .filter(|s| s.method == "GET")
            .filter_map(|s| s.range)
            .collect();
        ranges.sort_unstable();
        ranges
    }

    pub fn get_count(&self) -> usize {
        self.requests().iter().filter(|s| s.method == "GET").count()
    }
}

/// Starts a server in a background thread serving `body` at `/<name>`.
/// The server runs until the process exits.
pub fn start(body: Vec<u8>, name: &str) -> RangeServer {
    start_with_options(body, name, RangeServerOptions::default())
}

/// Like `start` but allows customizing server behavior.
pub fn start_with_options(body: Vec<u8>, name: &str, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_srv = Arc::clone(&seen);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let seen = Arc::clone(&seen_srv);
            thread::spawn(move || handle(stream, &body, opts, &seen));
        }
    });
    RangeServer {
        url: format!("http://127.0.0.1:{}/{}", port, name),
        seen,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    body: &[u8],
    opts: RangeServerOptions,
    seen: &Mutex<Vec<Seen>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, range) = parse_request(request);
    seen.lock().unwrap().push(Seen {
        method: method.to_ascii_uppercase(),
        range,
    });
    let total = body.len() as u64;
    let accept_ranges = if opts.advertise_ranges {
        "Accept-Ranges: bytes\r\n"
    } else {
        ""
    };

    if method.eq_ignore_ascii_case("HEAD") {
        let length = if opts.report_length {
            format!("Content-Length: {}\r\n", total)
        } else {
            String::new()
        };
        let response = format!(
            "HTTP/1.1 200 OK\r\n{}{}Connection: close\r\n\r\n",
            length, accept_ranges
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if method.eq_ignore_ascii_case("GET") {
        let failing_range = match (opts.fail_ranges_from, range) {
            (Some(from), Some((start, _))) => start >= from,
            _ => false,
        };
        let forced = if failing_range { Some(500) } else { opts.get_status };
        if let Some(code) = forced {
            let response = format!(
                "HTTP/1.1 {} Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                code
            );
            let _ = stream.write_all(response.as_bytes());
            return;
        }
        let (status, slice) = match range {
            Some((start, end_incl)) if opts.support_ranges => {
                let end_incl = end_incl.min(total.saturating_sub(1));
                if start > end_incl {
                    ("416 Range Not Satisfiable", &body[0..0])
                } else {
                    ("206 Partial Content", &body[start as usize..=end_incl as usize])
                }
            }
            _ => ("200 OK", body),
        };
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
            status,
            slice.len(),
            accept_ranges
        );
        let _ = stream.write_all(response.as_bytes());
        let sent = match opts.truncate_body_at {
            Some(cut) => &slice[..cut.min(slice.len())],
            None => slice,
        };
        match opts.chunk_delay {
            Some(delay) => {
                for piece in sent.chunks(16 * 1024) {
                    if stream.write_all(piece).is_err() {
                        break;
                    }
                    thread::sleep(delay);
                }
            }
            None => {
                let _ = stream.write_all(sent);
            }
        }
        return;
    }
    let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nConnection: close\r\n\r\n");
}

/// Returns (method, optional (start, end_inclusive) for Range: bytes=X-Y).
fn parse_request(request: &str) -> (&str, Option<(u64, u64)>) {
    let mut method = "";
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            method = line.split_whitespace().next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if value.to_lowercase().starts_with("bytes=") {
                    let part = value[6..].trim();
                    if let Some((a, b)) = part.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end = b.trim();
                        let end_incl = if end.is_empty() {
                            u64::MAX
                        } else {
                            end.parse::<u64>().unwrap_or(0)
                        };
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    (method, range)
}
