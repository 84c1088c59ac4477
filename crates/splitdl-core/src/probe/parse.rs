//! Parse HTTP response header lines collected by curl.

/// Key fields of the final response in a header stream.
#[derive(Debug, Default)]
pub(crate) struct HeadResult {
    pub status: Option<u32>,
    pub content_length: Option<u64>,
    pub accept_ranges: bool,
}

/// Status code from a line such as `HTTP/1.1 206 Partial Content`.
pub(crate) fn parse_status_line(line: &str) -> Option<u32> {
    let mut parts = line.split_whitespace();
    let proto = parts.next()?;
    if !proto.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

/// Parse collected header lines. With redirects curl reports several
/// responses back to back; each status line starts a fresh block so only the
/// last response wins.
pub(crate) fn parse_headers(lines: &[String]) -> HeadResult {
    let mut out = HeadResult::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(code) = parse_status_line(line) {
            out = HeadResult {
                status: Some(code),
                ..HeadResult::default()
            };
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                out.content_length = value.parse::<u64>().ok();
            }
            if name.eq_ignore_ascii_case("accept-ranges") {
                out.accept_ranges = value.eq_ignore_ascii_case("bytes");
            }
        }
    }

    out
}
