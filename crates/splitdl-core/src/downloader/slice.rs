//! Maps response body bytes onto one segment's file offsets.
//!
//! A `206` body starts at the segment start. A `200` body is the whole
//! resource from byte 0, so the segment's leading bytes are skipped. Either
//! way exactly `segment.len()` bytes are accepted.

use crate::error::DownloadError;
use crate::segmenter::Segment;

#[derive(Debug)]
pub(crate) struct SliceCursor {
    segment: Segment,
    /// Body bytes still to discard before the slice starts.
    skip: u64,
    /// Slice bytes accepted so far.
    written: u64,
    started: bool,
}

impl SliceCursor {
    pub(crate) fn new(segment: Segment) -> Self {
        Self {
            segment,
            skip: 0,
            written: 0,
            started: false,
        }
    }

    pub(crate) fn is_started(&self) -> bool {
        self.started
    }

    /// Validate the response status before the first body byte.
    pub(crate) fn begin(&mut self, status: u32) -> Result<(), DownloadError> {
        self.started = true;
        match status {
            206 => Ok(()),
            200 => {
                self.skip = self.segment.start;
                if self.skip > 0 {
                    tracing::debug!(
                        segment = self.segment.index,
                        skip = self.skip,
                        "server ignored Range, skipping leading bytes"
                    );
                }
                Ok(())
            }
            other => Err(DownloadError::Server {
                segment: self.segment.index,
                status: other,
            }),
        }
    }

    /// Returns the absolute offset and the part of `data` to write, if any.
    pub(crate) fn take<'a>(&mut self, data: &'a [u8]) -> Option<(u64, &'a [u8])> {
        let mut data = data;
        if self.skip > 0 {
            let skipped = self.skip.min(data.len() as u64);
            self.skip -= skipped;
            data = &data[skipped as usize..];
        }
        let want = self.remaining().min(data.len() as u64) as usize;
        if want == 0 {
            return None;
        }
        let offset = self.segment.start + self.written;
        self.written += want as u64;
        Some((offset, &data[..want]))
    }

    pub(crate) fn remaining(&self) -> u64 {
        self.segment.len() - self.written
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn written(&self) -> u64 {
        self.written
    }
}
