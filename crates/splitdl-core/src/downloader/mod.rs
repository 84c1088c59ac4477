//! Segmented downloader: one OS thread per segment, all writing into the same
//! destination file at disjoint offsets.
//!
//! Any worker error sets the shared failure flag and is pushed to an error
//! queue. Siblings notice the flag before starting and between chunks; the
//! caller drains the queue after every worker has been joined.

mod segment;
mod signals;
mod slice;

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use crate::error::DownloadError;
use crate::progress::ProgressPublisher;
use crate::segmenter::Segment;
use crate::storage::StorageWriter;

pub use signals::RunSignals;

use segment::{fetch_segment, SegmentOutcome};

/// Everything a segment worker shares with its siblings.
pub struct FetchContext {
    pub url: String,
    pub storage: StorageWriter,
    pub signals: Arc<RunSignals>,
    pub progress: ProgressPublisher,
    /// Connect timeout and stall window for each ranged GET.
    pub request_timeout: Duration,
    /// Largest body chunk handed to storage at once.
    pub chunk_size: usize,
}

/// Runs every segment concurrently and waits for all of them.
/// Returns the collected errors; empty means every segment completed.
pub fn download_segments(ctx: FetchContext, segments: &[Segment]) -> Vec<DownloadError> {
    let ctx = Arc::new(ctx);
    let (err_tx, err_rx) = mpsc::channel::<DownloadError>();
    let mut errors = Vec::new();

    let mut handles = Vec::with_capacity(segments.len());
    for segment in segments.iter().copied() {
        let worker_ctx = Arc::clone(&ctx);
        let tx = err_tx.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("segment-{}", segment.index))
            .spawn(move || run_worker(&worker_ctx, segment, &tx));
        match spawned {
            Ok(handle) => handles.push((segment.index, handle)),
            Err(e) => {
                ctx.signals.mark_failed();
                errors.push(DownloadError::io(
                    format!("cannot spawn worker for segment {}", segment.index),
                    e,
                ));
            }
        }
    }
    drop(err_tx);

    for (index, handle) in handles {
        if handle.join().is_err() {
            ctx.signals.mark_failed();
            errors.push(DownloadError::network(index, "worker panicked"));
        }
    }

    errors.extend(err_rx.try_iter());
    errors
}

fn run_worker(ctx: &FetchContext, segment: Segment, errors: &mpsc::Sender<DownloadError>) {
    tracing::debug!(
        segment = segment.index,
        start = segment.start,
        end = segment.end,
        "segment fetch starting"
    );
    match fetch_segment(ctx, &segment) {
        Ok(SegmentOutcome::Completed) => {
            tracing::debug!(segment = segment.index, bytes = segment.len(), "segment complete");
        }
        Ok(SegmentOutcome::Cancelled) => {
            tracing::debug!(segment = segment.index, "segment stopped after failure elsewhere");
        }
        Err(e) => {
            if ctx.signals.mark_failed() {
                tracing::warn!(segment = segment.index, url = %ctx.url, "first failure: {}", e);
            } else {
                tracing::warn!(segment = segment.index, url = %ctx.url, "{}", e);
            }
            let _ = errors.send(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every request with `206` and `body`; returns the URL and a connection counter.
    fn serve_partial(body: Vec<u8>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/seg.bin", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_srv = Arc::clone(&hits);
        std::thread::spawn(move || {
            for mut stream in listener.incoming().flatten() {
                hits_srv.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let head = format!(
                    "HTTP/1.1 206 Partial Content\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(&body);
            }
        });
        (url, hits)
    }

    fn context(url: &str, storage: StorageWriter, signals: &Arc<RunSignals>) -> FetchContext {
        FetchContext {
            url: url.to_string(),
            storage,
            signals: Arc::clone(signals),
            progress: ProgressPublisher::detached(),
            request_timeout: Duration::from_secs(5),
            chunk_size: 16 * 1024,
        }
    }

    fn seg(index: usize, start: u64, end: u64) -> Segment {
        Segment { index, start, end }
    }

    #[test]
    fn set_failure_flag_cancels_before_any_request() {
        let (url, hits) = serve_partial(vec![7u8; 100]);
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageWriter::open(&dir.path().join("out.bin"), false, 1000)
            .unwrap()
            .writer;
        let signals = Arc::new(RunSignals::new(0));
        signals.mark_failed();

        let ctx = context(&url, storage, &signals);
        let outcome = fetch_segment(&ctx, &seg(0, 0, 99)).unwrap();
        assert_eq!(outcome, SegmentOutcome::Cancelled);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(signals.bytes(), 0);
    }

    #[test]
    fn completed_segment_lands_at_its_offset() {
        let body: Vec<u8> = (0u8..100).collect();
        let (url, hits) = serve_partial(body.clone());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let storage = StorageWriter::open(&path, false, 1000).unwrap().writer;
        let signals = Arc::new(RunSignals::new(0));

        let ctx = context(&url, storage, &signals);
        let outcome = fetch_segment(&ctx, &seg(1, 100, 199)).unwrap();
        assert_eq!(outcome, SegmentOutcome::Completed);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(signals.bytes(), 100);
        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(&on_disk[100..], &body[..]);
    }

    #[test]
    fn write_failure_is_fatal_io_error() {
        let (url, _hits) = serve_partial(vec![1u8; 100]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ro.bin");
        std::fs::write(&path, b"").unwrap();
        let storage = StorageWriter::read_only(&path).unwrap();
        let signals = Arc::new(RunSignals::new(0));

        let errors = download_segments(context(&url, storage, &signals), &[seg(0, 0, 99)]);
        assert!(matches!(errors.as_slice(), [DownloadError::Io { .. }]), "{:?}", errors);
        assert!(signals.is_failed());
        assert_eq!(signals.bytes(), 0);
    }
}
