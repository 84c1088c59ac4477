//! Single-segment HTTP Range GET streamed to storage.

use std::cell::{Cell, RefCell};
use std::str;

use crate::error::DownloadError;
use crate::probe::parse_status_line;
use crate::segmenter::Segment;

use super::slice::SliceCursor;
use super::FetchContext;

/// How a segment worker ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentOutcome {
    Completed,
    /// Stopped because another worker had already failed.
    Cancelled,
}

/// Downloads one segment: GET with `Range: bytes=start-end`, each body chunk
/// written at its absolute offset, the shared counter bumped and published.
///
/// Checks the failure flag before starting and between chunks; a read that
/// is already in flight is never interrupted.
pub(crate) fn fetch_segment(ctx: &FetchContext, segment: &Segment) -> Result<SegmentOutcome, DownloadError> {
    if ctx.signals.is_failed() {
        return Ok(SegmentOutcome::Cancelled);
    }

    let cursor = RefCell::new(SliceCursor::new(*segment));
    let status = Cell::new(0u32);
    let failure: RefCell<Option<DownloadError>> = RefCell::new(None);
    let cancelled = Cell::new(false);

    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, ctx, segment).map_err(|e| DownloadError::network(segment.index, e))?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|line| {
                if let Ok(s) = str::from_utf8(line) {
                    if let Some(code) = parse_status_line(s.trim_end()) {
                        status.set(code);
                    }
                }
                true
            })
            .map_err(|e| DownloadError::network(segment.index, e))?;
        transfer
            .write_function(|data| {
                Ok(accept_chunk(ctx, &cursor, &status, &failure, &cancelled, data))
            })
            .map_err(|e| DownloadError::network(segment.index, e))?;
        transfer.perform()
    };

    if let Some(err) = failure.into_inner() {
        return Err(err);
    }
    if cancelled.get() {
        return Ok(SegmentOutcome::Cancelled);
    }

    let mut cursor = cursor.into_inner();
    match performed {
        // A 200 body runs past our slice; we stopped it on purpose.
        Err(e) if e.is_write_error() && cursor.is_complete() => {}
        Err(e) => return Err(DownloadError::network(segment.index, e)),
        Ok(()) => {}
    }
    if !cursor.is_started() {
        cursor.begin(status.get())?;
    }
    if !cursor.is_complete() {
        return Err(DownloadError::network(
            segment.index,
            format!(
                "body ended after {} of {} bytes",
                cursor.written(),
                segment.len()
            ),
        ));
    }
    Ok(SegmentOutcome::Completed)
}

fn configure(easy: &mut curl::easy::Easy, ctx: &FetchContext, segment: &Segment) -> Result<(), curl::Error> {
    easy.url(&ctx.url)?;
    easy.follow_location(true)?;
    easy.connect_timeout(ctx.request_timeout)?;
    // Stall timeout instead of a wall-clock limit: large bodies may take long,
    // but a transfer making no progress for the whole window fails.
    easy.low_speed_limit(1)?;
    easy.low_speed_time(ctx.request_timeout)?;
    easy.buffer_size(ctx.chunk_size)?;

    let mut list = curl::easy::List::new();
    list.append(&format!("Range: {}", segment.range_header_value()))?;
    easy.http_headers(list)?;
    Ok(())
}

/// Curl write callback body. Returns `data.len()` to continue, 0 to stop the transfer.
fn accept_chunk(
    ctx: &FetchContext,
    cursor: &RefCell<SliceCursor>,
    status: &Cell<u32>,
    failure: &RefCell<Option<DownloadError>>,
    cancelled: &Cell<bool>,
    data: &[u8],
) -> usize {
    let mut cursor = cursor.borrow_mut();
    if !cursor.is_started() {
        if let Err(e) = cursor.begin(status.get()) {
            failure.replace(Some(e));
            return 0;
        }
    }
    if cursor.is_complete() {
        return 0;
    }
    if ctx.signals.is_failed() {
        cancelled.set(true);
        return 0;
    }
    if let Some((offset, part)) = cursor.take(data) {
        if let Err(e) = ctx.storage.write_at(offset, part) {
            failure.replace(Some(DownloadError::io(
                format!(
                    "cannot write {} bytes at offset {} of {}",
                    part.len(),
                    offset,
                    ctx.storage.path().display()
                ),
                e,
            )));
            return 0;
        }
        let total = ctx.signals.add_bytes(part.len() as u64);
        ctx.progress.publish(total);
    }
    data.len()
}
