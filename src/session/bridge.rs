// WorkerBridge - Hands blocking scan/export work to tokio and routes results back
//
// The scan loop is CPU-bound and runs for seconds, so it goes to the blocking pool.
// Everything the worker has to say (progress, final result) travels back through a
// single unbounded mpsc queue that only the session reads. The worker never touches
// session or view state directly.

use super::SessionRunId;
use crate::models::RunKind;
use crate::services::{ExportResult, ScanError, ScanOutcome, ScanResult};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// What a worker reports
#[derive(Debug)]
pub enum WorkerEvent {
    /// Recomputed progress percentage
    Progress(u8),

    /// Final message of a scan; carries the page buckets on completion
    ScanFinished(Result<ScanOutcome<ScanResult>, ScanError>),

    /// Final message of an export
    ExportFinished(Result<ScanOutcome<ExportResult>, ScanError>),
}

impl WorkerEvent {
    /// The final message for a run of `kind` that failed with `error`
    pub fn failed(kind: RunKind, error: ScanError) -> Self {
        match kind {
            RunKind::Scan => Self::ScanFinished(Err(error)),
            RunKind::Export => Self::ExportFinished(Err(error)),
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

/// A worker event tagged with the run that produced it
///
/// The session drops messages whose run id is not the active run.
#[derive(Debug)]
pub struct WorkerMessage {
    pub run_id: SessionRunId,
    pub event: WorkerEvent,
}

/// Sending half given to a running worker
#[derive(Clone)]
pub struct WorkerReporter {
    run_id: SessionRunId,
    tx: mpsc::UnboundedSender<WorkerMessage>,
}

impl WorkerReporter {
    /// Queue a progress update. Never blocks; a closed queue is ignored.
    pub fn progress(&self, percent: u8) {
        self.send(WorkerEvent::Progress(percent));
    }

    fn send(&self, event: WorkerEvent) {
        if self
            .tx
            .send(WorkerMessage {
                run_id: self.run_id,
                event,
            })
            .is_err()
        {
            tracing::debug!("Worker queue closed, dropping message for run {}", self.run_id);
        }
    }
}

/// Spawns workers on the tokio blocking pool
///
/// # Example
/// ```ignore
/// let (bridge, mut rx) = WorkerBridge::new(tokio::runtime::Handle::current());
///
/// bridge.spawn_worker(1, RunKind::Scan, move |reporter| {
///     WorkerEvent::ScanFinished(run_scan(&snapshot, &cancel_rx, |p| reporter.progress(p)))
/// });
///
/// while let Some(message) = rx.recv().await {
///     // apply message...
/// }
/// ```
pub struct WorkerBridge {
    /// Handle to the tokio runtime for spawning tasks
    tokio_handle: tokio::runtime::Handle,

    /// Sending half of the worker queue; cloned into every reporter
    tx: mpsc::UnboundedSender<WorkerMessage>,
}

impl WorkerBridge {
    /// Create a bridge and the receiving half of its queue
    ///
    /// # Arguments
    /// * `tokio_handle` - Handle to the runtime whose blocking pool runs the workers
    pub fn new(
        tokio_handle: tokio::runtime::Handle,
    ) -> (Self, mpsc::UnboundedReceiver<WorkerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tokio_handle, tx }, rx)
    }

    /// Run `job` on the blocking pool and queue the event it returns
    ///
    /// Exactly one final event is queued per worker: the job's return value, or a
    /// `ScanError::Worker` failure if the job panicked. The returned handle resolves
    /// after that event has been queued.
    pub fn spawn_worker<F>(&self, run_id: SessionRunId, kind: RunKind, job: F) -> JoinHandle<()>
    where
        F: FnOnce(WorkerReporter) -> WorkerEvent + Send + 'static,
    {
        let reporter = WorkerReporter {
            run_id,
            tx: self.tx.clone(),
        };
        let job_reporter = reporter.clone();

        self.tokio_handle.spawn(async move {
            let event = match tokio::task::spawn_blocking(move || job(job_reporter)).await {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!("Worker for run {} terminated: {}", run_id, e);
                    WorkerEvent::failed(kind, ScanError::Worker(e.to_string()))
                }
            };
            reporter.send(event);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_worker_messages_arrive_in_order() {
        let (bridge, mut rx) = WorkerBridge::new(tokio::runtime::Handle::current());

        let handle = bridge.spawn_worker(7, RunKind::Scan, |reporter| {
            reporter.progress(10);
            reporter.progress(20);
            WorkerEvent::ScanFinished(Ok(ScanOutcome::Cancelled { visited: 3 }))
        });
        handle.await.unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.run_id, 7);
        assert!(matches!(first.event, WorkerEvent::Progress(10)));
        assert!(matches!(rx.recv().await.unwrap().event, WorkerEvent::Progress(20)));

        let last = rx.recv().await.unwrap();
        assert!(last.event.is_final());
        assert!(matches!(
            last.event,
            WorkerEvent::ScanFinished(Ok(ScanOutcome::Cancelled { visited: 3 }))
        ));
    }

    #[tokio::test]
    async fn test_panicking_worker_reports_failure() {
        let (bridge, mut rx) = WorkerBridge::new(tokio::runtime::Handle::current());

        let handle = bridge.spawn_worker(1, RunKind::Export, |_reporter| {
            panic!("boom");
        });
        handle.await.unwrap();

        let message = rx.recv().await.unwrap();
        assert!(matches!(
            message.event,
            WorkerEvent::ExportFinished(Err(ScanError::Worker(_)))
        ));
    }

    #[test]
    fn test_failed_event_matches_kind() {
        let scan = WorkerEvent::failed(RunKind::Scan, ScanError::Worker("x".into()));
        let export = WorkerEvent::failed(RunKind::Export, ScanError::Worker("x".into()));
        assert!(matches!(scan, WorkerEvent::ScanFinished(Err(_))));
        assert!(matches!(export, WorkerEvent::ExportFinished(Err(_))));
        assert!(!WorkerEvent::Progress(1).is_final());
    }
}
