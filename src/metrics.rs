// Performance metrics module
//
// Provides lightweight counters for scans, exports and soft deletes

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Session performance metrics
///
/// Uses atomic operations for thread-safe metric tracking without locks.
/// One instance is shared by a [`FilterSession`](crate::session::FilterSession)
/// and logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Scans and exports started
    pub runs_started: AtomicUsize,

    /// Scans that ran to completion
    pub scans_completed: AtomicUsize,

    /// Exports that ran to completion
    pub exports_completed: AtomicUsize,

    /// Runs stopped by a cancellation request
    pub runs_cancelled: AtomicUsize,

    /// Runs aborted by an error
    pub runs_failed: AtomicUsize,

    /// Candidates pulled from the enumerator across all runs
    pub candidates_visited: AtomicU64,

    /// Survivors produced by completed runs
    pub matches_found: AtomicU64,

    /// Entries removed through soft delete
    pub entries_deleted: AtomicU64,

    /// Total worker time in milliseconds
    pub total_run_time_ms: AtomicU64,

    /// Application start time
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            runs_started: AtomicUsize::new(0),
            scans_completed: AtomicUsize::new(0),
            exports_completed: AtomicUsize::new(0),
            runs_cancelled: AtomicUsize::new(0),
            runs_failed: AtomicUsize::new(0),
            candidates_visited: AtomicU64::new(0),
            matches_found: AtomicU64::new(0),
            entries_deleted: AtomicU64::new(0),
            total_run_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_run_started(&self) {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed scan with its counters
    pub fn record_scan_completed(&self, visited: u64, matched: u64, elapsed: Duration) {
        self.scans_completed.fetch_add(1, Ordering::Relaxed);
        self.record_work(visited, matched, elapsed);
    }

    /// Record a completed export with its counters
    pub fn record_export_completed(&self, visited: u64, lines: u64, elapsed: Duration) {
        self.exports_completed.fetch_add(1, Ordering::Relaxed);
        self.record_work(visited, lines, elapsed);
    }

    pub fn record_run_cancelled(&self, visited: u64) {
        self.runs_cancelled.fetch_add(1, Ordering::Relaxed);
        self.candidates_visited.fetch_add(visited, Ordering::Relaxed);
    }

    pub fn record_run_failed(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_entries_deleted(&self, count: usize) {
        self.entries_deleted
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    fn record_work(&self, visited: u64, matched: u64, elapsed: Duration) {
        self.candidates_visited.fetch_add(visited, Ordering::Relaxed);
        self.matches_found.fetch_add(matched, Ordering::Relaxed);
        self.total_run_time_ms
            .fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Candidates evaluated per second of worker time
    pub fn throughput_per_sec(&self) -> f64 {
        let ms = self.total_run_time_ms.load(Ordering::Relaxed);
        if ms == 0 {
            return 0.0;
        }
        self.candidates_visited.load(Ordering::Relaxed) as f64 * 1000.0 / ms as f64
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Performance Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Runs: {} started, {} scans completed, {} exports completed, {} cancelled, {} failed",
            self.runs_started.load(Ordering::Relaxed),
            self.scans_completed.load(Ordering::Relaxed),
            self.exports_completed.load(Ordering::Relaxed),
            self.runs_cancelled.load(Ordering::Relaxed),
            self.runs_failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Candidates: {} visited, {} matched ({:.0}/s)",
            self.candidates_visited.load(Ordering::Relaxed),
            self.matches_found.load(Ordering::Relaxed),
            self.throughput_per_sec()
        );
        tracing::info!(
            "Total run time: {:.2}s, soft-deleted entries: {}",
            self.total_run_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.entries_deleted.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
