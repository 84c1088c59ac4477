//! Progress aggregation for one download.
//!
//! Fetchers publish the cumulative byte count through a bounded queue and
//! never block on it: when the queue is full the update is dropped, since only
//! the latest value matters. A single aggregator thread owns the progress
//! line, redraws at most once per interval, and always draws a final line
//! when told to finish or when every publisher is gone.

mod human;
mod render;
mod stats;

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::downloader::RunSignals;
use crate::engine::{Console, OutputMode};

pub use human::{format_bytes, format_duration, format_speed, truncate_filename};
pub use render::{render_bar_line, render_log_line, BarLayout};
pub use stats::ProgressStats;

/// Capacity of the update queue between fetchers and the aggregator.
pub const UPDATE_QUEUE_CAPACITY: usize = 1000;

enum ProgressEvent {
    Update(u64),
    Finish,
}

/// Where the aggregator draws. The only thing allowed to touch the progress line.
pub trait ProgressSink: Send {
    fn draw(&mut self, stats: &ProgressStats, last: bool);
}

/// Cheap handle given to each fetcher.
#[derive(Clone)]
pub struct ProgressPublisher {
    tx: SyncSender<ProgressEvent>,
}

impl ProgressPublisher {
    /// Best-effort publish of the new cumulative total; drops the update if the queue is full.
    pub fn publish(&self, cumulative: u64) {
        match self.tx.try_send(ProgressEvent::Update(cumulative)) {
            Ok(()) | Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Publisher with no aggregator behind it; every update is discarded.
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        let (tx, _rx) = mpsc::sync_channel(1);
        Self { tx }
    }
}

/// Fixed parameters of one aggregator run.
#[derive(Debug, Clone, Copy)]
pub struct ProgressView {
    pub total_bytes: u64,
    /// Bytes already on disk at start; the first value shown.
    pub baseline: u64,
    pub started: Instant,
    /// Minimum delay between two intermediate draws.
    pub interval: Duration,
}

impl ProgressView {
    fn stats(&self, bytes_done: u64) -> ProgressStats {
        ProgressStats {
            bytes_done,
            total_bytes: self.total_bytes,
            baseline: self.baseline,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        }
    }
}

/// Owner side of a running aggregator thread.
pub struct ProgressHandle {
    tx: SyncSender<ProgressEvent>,
    join: JoinHandle<u64>,
}

impl ProgressHandle {
    pub fn publisher(&self) -> ProgressPublisher {
        ProgressPublisher {
            tx: self.tx.clone(),
        }
    }

    /// Push `final_value` (blocking, never dropped), ask for the final line
    /// and wait for it. Returns the last value the aggregator observed.
    pub fn finish(self, final_value: u64) -> u64 {
        let _ = self.tx.send(ProgressEvent::Update(final_value));
        let _ = self.tx.send(ProgressEvent::Finish);
        drop(self.tx);
        self.join.join().unwrap_or_else(|_| {
            tracing::error!("progress aggregator panicked");
            final_value
        })
    }
}

/// Spawn the aggregator thread drawing into `sink`.
pub fn spawn_aggregator<S>(view: ProgressView, signals: Arc<RunSignals>, sink: S) -> ProgressHandle
where
    S: ProgressSink + 'static,
{
    let (tx, rx) = mpsc::sync_channel(UPDATE_QUEUE_CAPACITY);
    let join = std::thread::spawn(move || {
        let mut sink = sink;
        run_aggregator(rx, view, &signals, &mut sink)
    });
    ProgressHandle { tx, join }
}

/// Aggregator loop. Observed values never go backwards even when updates
/// from different fetchers arrive out of order.
fn run_aggregator(
    rx: Receiver<ProgressEvent>,
    view: ProgressView,
    signals: &RunSignals,
    sink: &mut dyn ProgressSink,
) -> u64 {
    let mut current = view.baseline;
    let mut last_draw: Option<Instant> = None;

    loop {
        match rx.recv() {
            Ok(ProgressEvent::Update(value)) => {
                current = current.max(value);
                if signals.is_failed() {
                    continue;
                }
                let now = Instant::now();
                let throttled = last_draw
                    .map(|t| now.duration_since(t) < view.interval)
                    .unwrap_or(false);
                if throttled && current < view.total_bytes {
                    continue;
                }
                last_draw = Some(now);
                sink.draw(&view.stats(current), false);
            }
            Ok(ProgressEvent::Finish) | Err(_) => {
                sink.draw(&view.stats(current), true);
                return current;
            }
        }
    }
}

/// Draws onto the console: a `\r`-redrawn bar on a terminal, log lines otherwise.
pub struct ConsoleSink {
    console: Console,
    filename: String,
    min_bar_width: usize,
    max_filename_width: usize,
}

impl ConsoleSink {
    pub fn new(console: Console, filename: String, min_bar_width: usize, max_filename_width: usize) -> Self {
        Self {
            console,
            filename,
            min_bar_width,
            max_filename_width,
        }
    }
}

impl ProgressSink for ConsoleSink {
    fn draw(&mut self, stats: &ProgressStats, last: bool) {
        match self.console.mode() {
            OutputMode::Terminal => {
                let layout = BarLayout {
                    width: self.console.width(),
                    min_bar_width: self.min_bar_width,
                    max_filename_width: self.max_filename_width,
                };
                let line = render_bar_line(&layout, &self.filename, stats);
                let end = if last { "\n" } else { "" };
                self.console.print(&format!("\r{}{}", line, end));
            }
            OutputMode::Plain => {
                self.console
                    .print(&format!("{}\n", render_log_line(&self.filename, stats)));
            }
        }
    }
}
