use super::filter::FilterSnapshot;
use super::scan::{ScanError, ScanOutcome, drive};
use std::io::Write;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Counters from a completed export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportResult {
    pub lines: u64,
    pub visited: u64,
    pub elapsed: Duration,
}

/// Stream every surviving combination to `sink`, one `a,b,c,d,e,f\n` line each.
///
/// Nothing is buffered beyond what `sink` itself buffers. On cancellation the
/// sink is flushed and whatever was written stays written.
pub fn run_export<W, P>(
    snapshot: &FilterSnapshot,
    sink: &mut W,
    cancel: &watch::Receiver<bool>,
    on_progress: P,
) -> Result<ScanOutcome<ExportResult>, ScanError>
where
    W: Write,
    P: FnMut(u8),
{
    let started = Instant::now();

    let outcome = drive(snapshot, cancel, on_progress, |combo| {
        writeln!(sink, "{}", combo)?;
        Ok(())
    })?;
    sink.flush()?;

    Ok(match outcome {
        ScanOutcome::Completed(stats) => ScanOutcome::Completed(ExportResult {
            lines: stats.matched,
            visited: stats.visited,
            elapsed: started.elapsed(),
        }),
        ScanOutcome::Cancelled { visited } => ScanOutcome::Cancelled { visited },
    })
}
