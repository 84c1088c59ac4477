//! HTTP HEAD / metadata probing.
//!
//! Uses the curl crate (libcurl) to learn the authoritative `Content-Length`
//! and whether the server advertises `Accept-Ranges: bytes`.

mod parse;

use std::str;
use std::time::Duration;

use crate::error::DownloadError;

pub(crate) use parse::parse_status_line;

/// What the probe learned about the remote resource. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub url: String,
    /// Authoritative length in bytes, always > 0.
    pub total_size: u64,
    /// True if the server sent `Accept-Ranges: bytes`.
    pub supports_ranges: bool,
}

/// Performs a HEAD request with a hard `timeout` and validates the answer.
///
/// Follows redirects; only the final response's headers are considered.
/// Fails with [`DownloadError::Probe`] on transport errors, on a status other
/// than 200/206, or when no positive length is reported.
/// Blocks the current thread.
pub fn probe(url: &str, timeout: Duration) -> Result<ResourceDescriptor, DownloadError> {
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, timeout)
        .map_err(|e| DownloadError::Probe(format!("invalid request for {}: {}", url, e)))?;

    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(|e| DownloadError::Probe(e.to_string()))?;
        transfer
            .perform()
            .map_err(|e| DownloadError::Probe(format!("network error: {}", e)))?;
    }

    let head = parse::parse_headers(&headers);
    let status = match head.status {
        Some(code) => code,
        None => easy
            .response_code()
            .map_err(|e| DownloadError::Probe(e.to_string()))?,
    };
    descriptor_from_head(url, status, head.content_length, head.accept_ranges)
}

fn configure(easy: &mut curl::easy::Easy, url: &str, timeout: Duration) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.nobody(true)?; // HEAD request
    easy.follow_location(true)?;
    easy.timeout(timeout)?;
    Ok(())
}

fn descriptor_from_head(
    url: &str,
    status: u32,
    content_length: Option<u64>,
    accept_ranges: bool,
) -> Result<ResourceDescriptor, DownloadError> {
    if status != 200 && status != 206 {
        return Err(DownloadError::Probe(format!("server returned status {}", status)));
    }
    match content_length {
        Some(total_size) if total_size > 0 => Ok(ResourceDescriptor {
            url: url.to_string(),
            total_size,
            supports_ranges: accept_ranges,
        }),
        _ => Err(DownloadError::Probe("cannot determine file size".to_string())),
    }
}
