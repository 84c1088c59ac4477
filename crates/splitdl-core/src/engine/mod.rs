//! Download orchestration for a single URL.
//!
//! Phases: Probing -> Opening -> Planning -> Fetching -> Draining -> Done | Failed.
//! The orchestrator issues no I/O of its own beyond the probe and the open; it
//! waits on the fetchers, drains their errors, and alone decides the outcome.
//! A failed download leaves its partial file on disk for a later resume.

mod console;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::SplitdlConfig;
use crate::downloader::{download_segments, FetchContext, RunSignals};
use crate::error::{DownloadError, DownloadFailure};
use crate::probe::{self, ResourceDescriptor};
use crate::progress::{spawn_aggregator, ConsoleSink, ProgressView};
use crate::segmenter::{plan_segments, Segment};
use crate::storage::StorageWriter;
use crate::url_model;

pub use console::{Console, OutputMode};

/// Parsed inputs for one download.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    /// Destination path; derived from the URL when `None`.
    pub destination: Option<PathBuf>,
    pub resume: bool,
    pub workers: usize,
}

/// Fixed facts about a run once planning is done. Never mutated by workers.
#[derive(Debug, Clone)]
pub struct DownloadSession {
    pub filename: PathBuf,
    pub resume_offset: u64,
    pub total_size: u64,
    pub workers: usize,
    pub started: Instant,
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub total_size: u64,
    pub resume_offset: u64,
    /// Bytes fetched over the network in this run.
    pub bytes_fetched: u64,
    /// Fetchers actually used; 1 when the server does not advertise ranges.
    pub workers: usize,
    pub segments: usize,
    /// The file already held every byte; nothing was fetched.
    pub already_complete: bool,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Probing,
    Opening,
    Planning,
    Fetching,
    Draining,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Probing => "probing",
            Phase::Opening => "opening",
            Phase::Planning => "planning",
            Phase::Fetching => "fetching",
            Phase::Draining => "draining",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

fn enter(url: &str, phase: Phase) {
    tracing::debug!(url, %phase, "download phase");
}

/// Print every error, log the failure and build the terminal result.
fn fail(
    console: &Console,
    url: &str,
    filename: Option<&Path>,
    errors: Vec<DownloadError>,
) -> DownloadFailure {
    enter(url, Phase::Failed);
    for e in &errors {
        console.report_error(url, filename, e);
    }
    tracing::error!(url, errors = errors.len(), "download failed");
    DownloadFailure {
        url: url.to_string(),
        filename: filename.map(Path::to_path_buf),
        errors,
    }
}

/// Downloads `request.url` to its destination using concurrent ranged GETs.
///
/// Blocks until every fetcher has finished. On failure all collected errors
/// have already been printed to `console` and the partial file is kept.
pub fn run_download(
    request: &DownloadRequest,
    cfg: &SplitdlConfig,
    console: &Console,
) -> Result<DownloadOutcome, DownloadFailure> {
    let url = request.url.as_str();

    enter(url, Phase::Probing);
    let destination = match &request.destination {
        Some(path) => path.clone(),
        None => url_model::filename_from_url(url).map_err(|e| fail(console, url, None, vec![e]))?,
    };
    let resource = probe::probe(url, cfg.probe_timeout())
        .map_err(|e| fail(console, url, Some(destination.as_path()), vec![e]))?;
    tracing::info!(
        url,
        total = resource.total_size,
        ranges = resource.supports_ranges,
        "probed resource"
    );

    enter(url, Phase::Opening);
    let opened = StorageWriter::open(&destination, request.resume, cfg.max_unique_attempts)
        .map_err(|e| fail(console, url, Some(destination.as_path()), vec![e]))?;

    enter(url, Phase::Planning);
    let workers = effective_workers(&resource, request.workers);
    if opened.resume_offset > resource.total_size {
        tracing::warn!(
            path = %opened.path.display(),
            local = opened.resume_offset,
            remote = resource.total_size,
            "local file is larger than the remote resource"
        );
    }
    let segments = plan_segments(resource.total_size, opened.resume_offset, workers);
    let session = DownloadSession {
        filename: opened.path.clone(),
        resume_offset: opened.resume_offset,
        total_size: resource.total_size,
        workers,
        started: Instant::now(),
    };
    tracing::info!(
        path = %session.filename.display(),
        resume_offset = session.resume_offset,
        workers = session.workers,
        segments = segments.len(),
        "planned download"
    );
    console.announce(&session.filename, url, session.resume_offset, session.total_size);

    if segments.is_empty() {
        enter(url, Phase::Done);
        tracing::info!(path = %session.filename.display(), "already complete, nothing to fetch");
        console.complete(&session.filename);
        return Ok(outcome(&session, &segments, 0, true));
    }

    enter(url, Phase::Fetching);
    let errors = fetch_all(&resource, &session, &segments, opened.writer.clone(), cfg, console);

    enter(url, Phase::Draining);
    let mut errors = errors;
    if errors.is_empty() {
        if let Err(e) = opened.writer.sync() {
            errors.push(DownloadError::io(
                format!("cannot sync {}", session.filename.display()),
                e,
            ));
        }
    }
    if !errors.is_empty() {
        return Err(fail(console, url, Some(session.filename.as_path()), errors));
    }

    enter(url, Phase::Done);
    let fetched = session.total_size - session.resume_offset;
    tracing::info!(
        path = %session.filename.display(),
        bytes = fetched,
        elapsed_ms = session.started.elapsed().as_millis() as u64,
        "download complete"
    );
    console.complete(&session.filename);
    Ok(outcome(&session, &segments, fetched, false))
}

/// Runs the fetchers and the aggregator; returns once the final progress line is drawn.
fn fetch_all(
    resource: &ResourceDescriptor,
    session: &DownloadSession,
    segments: &[Segment],
    storage: StorageWriter,
    cfg: &SplitdlConfig,
    console: &Console,
) -> Vec<DownloadError> {
    let signals = Arc::new(RunSignals::new(session.resume_offset));
    let display_name = session
        .filename
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| session.filename.display().to_string());
    let sink = ConsoleSink::new(
        console.clone(),
        display_name,
        cfg.min_bar_width,
        cfg.max_filename_width,
    );
    let view = ProgressView {
        total_bytes: session.total_size,
        baseline: session.resume_offset,
        started: session.started,
        interval: cfg.progress_interval(),
    };
    let progress = spawn_aggregator(view, Arc::clone(&signals), sink);

    let ctx = FetchContext {
        url: resource.url.clone(),
        storage,
        signals: Arc::clone(&signals),
        progress: progress.publisher(),
        request_timeout: cfg.request_timeout(),
        chunk_size: cfg.chunk_size,
    };
    // Returns only after every worker has been joined.
    let errors = download_segments(ctx, segments);

    let observed = progress.finish(signals.bytes());
    tracing::debug!(observed, total = session.total_size, "progress finished");
    errors
}

/// A server without `Accept-Ranges: bytes` gets a single stream.
fn effective_workers(resource: &ResourceDescriptor, requested: usize) -> usize {
    if resource.supports_ranges || requested <= 1 {
        return requested;
    }
    tracing::warn!(
        url = %resource.url,
        requested,
        "server does not advertise byte ranges, using a single segment"
    );
    1
}

fn outcome(
    session: &DownloadSession,
    segments: &[Segment],
    bytes_fetched: u64,
    already_complete: bool,
) -> DownloadOutcome {
    DownloadOutcome {
        path: session.filename.clone(),
        total_size: session.total_size,
        resume_offset: session.resume_offset,
        bytes_fetched,
        workers: session.workers,
        segments: segments.len(),
        already_complete,
        elapsed: session.started.elapsed(),
    }
}
