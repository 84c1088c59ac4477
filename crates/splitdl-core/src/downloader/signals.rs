//! Per-download shared counters. One instance per run, shared by `Arc`, so
//! concurrent downloads never see each other's state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug)]
pub struct RunSignals {
    bytes: AtomicU64,
    failed: AtomicBool,
}

impl RunSignals {
    /// `initial_bytes` is what is already on disk (the resume offset).
    pub fn new(initial_bytes: u64) -> Self {
        Self {
            bytes: AtomicU64::new(initial_bytes),
            failed: AtomicBool::new(false),
        }
    }

    /// Adds `n` and returns the new cumulative total.
    pub fn add_bytes(&self, n: u64) -> u64 {
        self.bytes.fetch_add(n, Ordering::Relaxed) + n
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Sets the failure flag; returns true only for the first caller.
    pub fn mark_failed(&self) -> bool {
        !self.failed.swap(true, Ordering::AcqRel)
    }

    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }
}
