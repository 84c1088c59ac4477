//! Progress snapshot math (percent, rate, ETA).

/// Snapshot of download progress handed to a renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressStats {
    /// Bytes on disk so far, resumed bytes included.
    pub bytes_done: u64,
    /// Total file size in bytes.
    pub total_bytes: u64,
    /// Bytes that were already present when this run started.
    pub baseline: u64,
    /// Elapsed time since the run started (seconds).
    pub elapsed_secs: f64,
}

impl ProgressStats {
    /// Whole percent complete, floored and clamped to 100.
    pub fn percent(&self) -> u32 {
        if self.total_bytes == 0 {
            return 100;
        }
        let pct = self.bytes_done as u128 * 100 / self.total_bytes as u128;
        pct.min(100) as u32
    }

    /// Rate of this run in bytes per second (0 if elapsed is 0).
    /// Resumed bytes are excluded so a resume does not report a burst.
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done.saturating_sub(self.baseline) as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining; `Some(0.0)` once done, `None` while the rate is unknown.
    pub fn eta_secs(&self) -> Option<f64> {
        if self.bytes_done >= self.total_bytes {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some((self.total_bytes - self.bytes_done) as f64 / rate)
    }
}
