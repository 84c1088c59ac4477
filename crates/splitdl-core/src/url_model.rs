//! Destination filename derivation from the request URL.

use percent_encoding::percent_decode_str;
use std::path::PathBuf;

use crate::error::DownloadError;

/// Name used when the URL path has no usable last segment.
pub const FALLBACK_FILENAME: &str = "downloaded.file";

/// Derives the local filename from the last non-empty path segment of `url`
/// (percent-decoded, query ignored). Falls back to [`FALLBACK_FILENAME`].
///
/// Fails with [`DownloadError::Probe`] if `url` is not an absolute http(s) URL.
pub fn filename_from_url(url: &str) -> Result<PathBuf, DownloadError> {
    let parsed =
        url::Url::parse(url).map_err(|e| DownloadError::Probe(format!("invalid URL: {}", e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(DownloadError::Probe(format!(
            "invalid URL: unsupported scheme {}",
            parsed.scheme()
        )));
    }

    let name = parsed
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .last()
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .map(|s| sanitize(&s))
        .filter(|s| !s.is_empty() && s != "." && s != "..");

    Ok(PathBuf::from(
        name.unwrap_or_else(|| FALLBACK_FILENAME.to_string()),
    ))
}

/// Replaces path separators, NUL and control characters with `_` so a
/// decoded segment can never escape the working directory.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c == '/' || c == '\\' || c == '\0' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}
