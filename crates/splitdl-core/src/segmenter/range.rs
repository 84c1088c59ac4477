//! Segment type and range planning.

/// A single segment: byte range `[start, end]` (inclusive), fetched by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Position in the plan; also used to label errors and logs.
    pub index: usize,
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (inclusive).
    pub end: u64,
}

impl Segment {
    /// Length of this segment in bytes.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// HTTP Range header value: `bytes=start-end`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// Plans the segments covering `[resume_offset, total_size - 1]`.
///
/// Every segment but the last gets `remaining / workers` bytes; the last one
/// ends at `total_size - 1` and absorbs the remainder. Returns an empty plan
/// when there is nothing left to fetch or `workers` is 0. When fewer bytes
/// remain than workers, one segment per remaining byte is produced.
pub fn plan_segments(total_size: u64, resume_offset: u64, workers: usize) -> Vec<Segment> {
    if workers == 0 || resume_offset >= total_size {
        return Vec::new();
    }

    let remaining = total_size - resume_offset;
    let count = (workers as u64).min(remaining);
    let part = remaining / count;

    let mut out = Vec::with_capacity(count as usize);
    for i in 0..count {
        let start = resume_offset + i * part;
        let end = if i + 1 == count {
            total_size - 1
        } else {
            start + part - 1
        };
        out.push(Segment {
            index: i as usize,
            start,
            end,
        });
    }

    out
}
