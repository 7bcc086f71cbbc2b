use super::enumerator::combinations;
use super::filter::FilterSnapshot;
use crate::models::{Combination, PageBuilder, PageEntry, TOTAL_COMBINATIONS};
use crate::rules::RuleError;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;

/// Progress is recomputed whenever `visited & PROGRESS_MASK == 0`.
pub const PROGRESS_MASK: u64 = 0xFFFF;

/// Errors that abort a scan or export
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Rule evaluation failed: {0}")]
    Rule(#[from] RuleError),

    #[error("Failed to write results: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker terminated unexpectedly: {0}")]
    Worker(String),
}

/// How a run ended when it did not fail.
///
/// Cancellation is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome<T> {
    Completed(T),
    Cancelled { visited: u64 },
}

impl<T> ScanOutcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Cancelled { .. } => None,
        }
    }
}

/// Buckets and counters produced by a completed scan.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub buckets: Vec<Vec<PageEntry>>,
    pub matched: usize,
    pub visited: u64,
    pub elapsed: Duration,
}

/// Percentage of the combination space visited, in `0..=100`.
pub fn progress_percent(visited: u64) -> u8 {
    (visited.saturating_mul(100) / TOTAL_COMBINATIONS).min(100) as u8
}

/// Counters returned by [`drive`]
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DriveStats {
    pub visited: u64,
    pub matched: u64,
}

/// Pull every combination through `snapshot`, handing survivors to `on_match`.
///
/// Cancellation is checked before each candidate. `on_progress` is called with the
/// recomputed percentage every 65,536 candidates. An error from `on_match` aborts
/// the run.
pub(crate) fn drive<P, M>(
    snapshot: &FilterSnapshot,
    cancel: &watch::Receiver<bool>,
    mut on_progress: P,
    mut on_match: M,
) -> Result<ScanOutcome<DriveStats>, ScanError>
where
    P: FnMut(u8),
    M: FnMut(Combination) -> Result<(), ScanError>,
{
    let mut stats = DriveStats::default();

    for combo in combinations() {
        if *cancel.borrow() {
            return Ok(ScanOutcome::Cancelled {
                visited: stats.visited,
            });
        }

        stats.visited += 1;
        if stats.visited & PROGRESS_MASK == 0 {
            on_progress(progress_percent(stats.visited));
        }

        if !snapshot.excludes(&combo) {
            on_match(combo)?;
            stats.matched += 1;
        }
    }

    Ok(ScanOutcome::Completed(stats))
}

/// Run a full scan, collecting survivors into page buckets.
///
/// Blocking; call it from a worker thread. The returned buckets are handed to
/// [`PageStore::install`](crate::models::PageStore::install) by the caller.
pub fn run_scan<P>(
    snapshot: &FilterSnapshot,
    cancel: &watch::Receiver<bool>,
    on_progress: P,
) -> Result<ScanOutcome<ScanResult>, ScanError>
where
    P: FnMut(u8),
{
    let started = Instant::now();
    let mut builder = PageBuilder::new();

    let outcome = drive(snapshot, cancel, on_progress, |combo| {
        builder.push(combo);
        Ok(())
    })?;

    Ok(match outcome {
        ScanOutcome::Completed(stats) => ScanOutcome::Completed(ScanResult {
            matched: builder.matched(),
            buckets: builder.into_buckets(),
            visited: stats.visited,
            elapsed: started.elapsed(),
        }),
        ScanOutcome::Cancelled { visited } => ScanOutcome::Cancelled { visited },
    })
}
