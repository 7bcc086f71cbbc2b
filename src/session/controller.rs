// Filter session - the interactive context
//
// Owns the condition list, the page store and the active run. All mutations of
// session data happen here, on the caller's task; workers only send messages.

use super::bridge::{WorkerBridge, WorkerEvent, WorkerMessage};
use super::{SessionError, SessionRunId};
use crate::metrics::Metrics;
use crate::models::{
    DeleteSummary, FilterConfig, PageStore, PageView, RuleInstance, RunKind, RunOutcome,
};
use crate::rules::{RuleParameters, RuleRegistry};
use crate::services::{ExportResult, FilterSnapshot, ScanError, ScanOutcome, ScanResult};
use crate::services::{run_export, run_scan};
use crate::state::StateManager;
use camino::Utf8PathBuf;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Bookkeeping for the one run that may be in flight
struct ActiveRun {
    id: SessionRunId,
    kind: RunKind,
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    /// Page shown before a rescan, restored (clamped) when it completes
    requested_page: usize,
    export_path: Option<Utf8PathBuf>,
}

/// Headless filter session
///
/// Coordinates between:
/// - [`RuleRegistry`] (rule lookup and instantiation)
/// - [`PageStore`] (scan results and soft deletes)
/// - [`StateManager`] (published view state and change events)
/// - [`WorkerBridge`] (scan/export workers on the blocking pool)
///
/// Only one scan or export runs at a time. Starting a run cancels and joins the
/// previous one first. Worker messages are applied when the caller awaits
/// [`wait_for_idle`](Self::wait_for_idle) or calls
/// [`process_pending`](Self::process_pending).
///
/// # Example
/// ```ignore
/// let mut session = FilterSession::new(registry, state_manager, metrics, handle);
/// session.add_condition("SumOutsideRange", &RuleParameters::new())?;
/// session.start_scan().await?;
/// session.wait_for_idle().await;
/// let page = session.next_page()?;
/// ```
pub struct FilterSession {
    registry: RuleRegistry,
    conditions: Vec<RuleInstance>,
    store: PageStore,
    state_manager: Arc<StateManager>,
    metrics: Arc<Metrics>,
    bridge: WorkerBridge,
    worker_rx: mpsc::UnboundedReceiver<WorkerMessage>,
    active: Option<ActiveRun>,
    next_run_id: SessionRunId,
    last_error: Option<ScanError>,
}

impl FilterSession {
    /// Create a new session
    ///
    /// # Arguments
    /// * `registry` - Registered rules, with the draw history already loaded
    /// * `state_manager` - Shared view state
    /// * `metrics` - Shared counters
    /// * `tokio_handle` - Runtime whose blocking pool runs the workers
    pub fn new(
        registry: RuleRegistry,
        state_manager: Arc<StateManager>,
        metrics: Arc<Metrics>,
        tokio_handle: tokio::runtime::Handle,
    ) -> Self {
        let (bridge, worker_rx) = WorkerBridge::new(tokio_handle);
        Self {
            registry,
            conditions: Vec::new(),
            store: PageStore::new(),
            state_manager,
            metrics,
            bridge,
            worker_rx,
            active: None,
            next_run_id: 1,
            last_error: None,
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn state_manager(&self) -> &Arc<StateManager> {
        &self.state_manager
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Read-only access to the scan results
    pub fn store(&self) -> &PageStore {
        &self.store
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Kind of the run in flight, if any
    pub fn active_run(&self) -> Option<RunKind> {
        self.active.as_ref().map(|run| run.kind)
    }

    /// The error of the most recent failed run, if it has not been taken yet
    pub fn take_last_error(&mut self) -> Option<ScanError> {
        self.last_error.take()
    }

    // ---------------------------------------------------------------------
    // Conditions
    // ---------------------------------------------------------------------

    pub fn conditions(&self) -> &[RuleInstance] {
        &self.conditions
    }

    /// Append a condition for rule `key`: declared defaults, then `overrides`
    ///
    /// # Returns
    /// The index of the new condition
    pub fn add_condition(
        &mut self,
        key: &str,
        overrides: &RuleParameters,
    ) -> Result<usize, SessionError> {
        let instance = self
            .registry
            .instantiate(key, overrides)
            .ok_or_else(|| SessionError::UnknownRule(key.to_string()))?;

        tracing::info!("Added condition: {}", instance.summary());
        self.conditions.push(instance);
        self.publish_conditions();
        Ok(self.conditions.len() - 1)
    }

    pub fn remove_condition(&mut self, index: usize) -> Result<RuleInstance, SessionError> {
        if index >= self.conditions.len() {
            return Err(SessionError::NoSuchCondition(index));
        }
        let removed = self.conditions.remove(index);
        tracing::info!("Removed condition: {}", removed.summary());
        self.publish_conditions();
        Ok(removed)
    }

    pub fn set_condition_enabled(&mut self, index: usize, enabled: bool) -> Result<(), SessionError> {
        self.condition_mut(index)?.enabled = enabled;
        self.publish_conditions();
        Ok(())
    }

    /// Change one parameter of a condition. Values are not validated; rules fall
    /// back to their defaults on bad input.
    pub fn set_condition_parameter(
        &mut self,
        index: usize,
        name: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        let condition = self.condition_mut(index)?;
        condition.parameters.set(name, value);
        tracing::debug!("Updated condition {}: {}", index, condition.summary());
        Ok(())
    }

    /// Replace the condition list with the entries of `config`
    ///
    /// Entries naming an unknown rule are skipped with a warning.
    ///
    /// # Returns
    /// The number of conditions loaded
    pub fn load_conditions(&mut self, config: &FilterConfig) -> usize {
        self.conditions.clear();

        for entry in &config.conditions {
            match self.registry.instantiate(&entry.rule, &entry.parameters) {
                Some(mut instance) => {
                    instance.enabled = entry.enabled;
                    self.conditions.push(instance);
                }
                None => tracing::warn!("Skipping unknown rule '{}' in filter config", entry.rule),
            }
        }

        tracing::info!(
            "Loaded {} of {} configured conditions",
            self.conditions.len(),
            config.conditions.len()
        );
        self.publish_conditions();
        self.conditions.len()
    }

    fn condition_mut(&mut self, index: usize) -> Result<&mut RuleInstance, SessionError> {
        self.conditions
            .get_mut(index)
            .ok_or(SessionError::NoSuchCondition(index))
    }

    fn publish_conditions(&self) {
        let enabled = self.conditions.iter().filter(|c| c.enabled).count();
        self.state_manager
            .set_conditions(self.conditions.len(), enabled);
    }

    // ---------------------------------------------------------------------
    // Runs
    // ---------------------------------------------------------------------

    /// Start a full rescan
    ///
    /// Cancels and joins any run in flight, clears the results and the
    /// soft-delete set, then scans with a snapshot of the enabled conditions.
    pub async fn start_scan(&mut self) -> Result<SessionRunId, SessionError> {
        self.cancel_and_join().await;

        let requested_page = self.store.current_page();
        self.store.reset();

        let snapshot = FilterSnapshot::capture(&self.conditions, self.store.removed_signatures());
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let run_id = self.allocate_run_id();

        tracing::info!(
            "Starting scan {} with {} active rules",
            run_id,
            snapshot.rules().len()
        );
        self.state_manager.start_run(RunKind::Scan);
        self.metrics.record_run_started();

        let handle = self.bridge.spawn_worker(run_id, RunKind::Scan, move |reporter| {
            WorkerEvent::ScanFinished(run_scan(&snapshot, &cancel_rx, |percent| {
                reporter.progress(percent)
            }))
        });

        self.active = Some(ActiveRun {
            id: run_id,
            kind: RunKind::Scan,
            cancel_tx,
            handle,
            requested_page,
            export_path: None,
        });
        Ok(run_id)
    }

    /// Stream the filtered sequence to `path`
    ///
    /// Uses the current conditions and the current soft-delete set; the results
    /// in the page store are left untouched. The file is created before the run
    /// starts, so an unwritable path fails here with [`SessionError::Export`].
    pub async fn start_export(
        &mut self,
        path: impl Into<Utf8PathBuf>,
    ) -> Result<SessionRunId, SessionError> {
        let path = path.into();
        self.cancel_and_join().await;

        let file = File::create(&path)?;
        let mut sink = BufWriter::new(file);

        let snapshot = FilterSnapshot::capture(&self.conditions, self.store.removed_signatures());
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let run_id = self.allocate_run_id();

        tracing::info!(
            "Starting export {} to {} with {} active rules, {} soft-deleted",
            run_id,
            path,
            snapshot.rules().len(),
            snapshot.removed_count()
        );
        self.state_manager.start_run(RunKind::Export);
        self.metrics.record_run_started();

        let handle = self.bridge.spawn_worker(run_id, RunKind::Export, move |reporter| {
            WorkerEvent::ExportFinished(run_export(&snapshot, &mut sink, &cancel_rx, |percent| {
                reporter.progress(percent)
            }))
        });

        self.active = Some(ActiveRun {
            id: run_id,
            kind: RunKind::Export,
            cancel_tx,
            handle,
            requested_page: self.store.current_page(),
            export_path: Some(path),
        });
        Ok(run_id)
    }

    /// Request cancellation of the run in flight. Does not wait.
    pub fn cancel(&self) {
        if let Some(run) = &self.active {
            tracing::info!("Cancellation requested for run {}", run.id);
            let _ = run.cancel_tx.send(true);
        }
    }

    /// Apply worker messages until the active run has reported its result
    ///
    /// # Returns
    /// The outcome of the run, or `None` if nothing was running
    pub async fn wait_for_idle(&mut self) -> Option<RunOutcome> {
        self.active.as_ref()?;

        while self.active.is_some() {
            match self.worker_rx.recv().await {
                Some(message) => self.apply_message(message),
                None => {
                    // the bridge holds a sender, so this only happens on teardown
                    self.abandon_active("worker queue closed");
                }
            }
        }

        self.state_manager.read(|state| state.last_outcome)
    }

    /// Apply every queued worker message without waiting
    ///
    /// # Returns
    /// The number of messages applied, including discarded stale ones
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.worker_rx.try_recv() {
            self.apply_message(message);
            applied += 1;
        }
        applied
    }

    async fn cancel_and_join(&mut self) {
        let Some(run) = self.active.as_mut() else {
            return;
        };

        tracing::info!("Cancelling run {} before starting a new one", run.id);
        let _ = run.cancel_tx.send(true);
        if let Err(e) = (&mut run.handle).await {
            tracing::error!("Worker task for run {} failed to join: {}", run.id, e);
        }

        // The final message is queued before the worker task completes
        self.process_pending();
        if self.active.is_some() {
            self.abandon_active("worker exited without reporting");
        }
    }

    fn allocate_run_id(&mut self) -> SessionRunId {
        let id = self.next_run_id;
        self.next_run_id += 1;
        id
    }

    fn abandon_active(&mut self, reason: &str) {
        if let Some(run) = self.active.take() {
            tracing::warn!("Abandoning run {}: {}", run.id, reason);
            self.metrics.record_run_failed();
            self.state_manager
                .finish_run(RunOutcome::Failed(run.kind), Some(reason.to_string()));
        }
    }

    fn apply_message(&mut self, message: WorkerMessage) {
        let is_current = self
            .active
            .as_ref()
            .is_some_and(|run| run.id == message.run_id);
        if !is_current {
            tracing::debug!("Discarding stale message from run {}", message.run_id);
            return;
        }

        match message.event {
            WorkerEvent::Progress(percent) => {
                self.state_manager.set_progress(percent);
            }
            WorkerEvent::ScanFinished(result) => {
                if let Some(run) = self.active.take() {
                    self.finish_scan(run, result);
                }
            }
            WorkerEvent::ExportFinished(result) => {
                if let Some(run) = self.active.take() {
                    self.finish_export(run, result);
                }
            }
        }
    }

    fn finish_scan(&mut self, run: ActiveRun, result: Result<ScanOutcome<ScanResult>, ScanError>) {
        match result {
            Ok(ScanOutcome::Completed(result)) => {
                tracing::info!(
                    "Scan {} completed: {} matches in {} pages ({:.2}s)",
                    run.id,
                    result.matched,
                    result.buckets.len(),
                    result.elapsed.as_secs_f64()
                );
                self.metrics.record_scan_completed(
                    result.visited,
                    result.matched as u64,
                    result.elapsed,
                );
                let view = self.store.install(result.buckets, run.requested_page);
                self.state_manager.publish_page(&view);
                self.state_manager
                    .finish_run(RunOutcome::Completed(RunKind::Scan), None);
            }
            Ok(ScanOutcome::Cancelled { visited }) => {
                tracing::info!("Scan {} cancelled after {} candidates", run.id, visited);
                self.metrics.record_run_cancelled(visited);
                self.discard_results();
                self.state_manager
                    .finish_run(RunOutcome::Cancelled(RunKind::Scan), None);
            }
            Err(e) => {
                tracing::error!("Scan {} failed: {}", run.id, e);
                self.metrics.record_run_failed();
                self.discard_results();
                self.state_manager
                    .finish_run(RunOutcome::Failed(RunKind::Scan), Some(e.to_string()));
                self.last_error = Some(e);
            }
        }
    }

    /// A scan that did not complete leaves no results behind, published or stored
    fn discard_results(&mut self) {
        self.store.reset();
        self.state_manager.reset();
    }

    fn finish_export(
        &mut self,
        run: ActiveRun,
        result: Result<ScanOutcome<ExportResult>, ScanError>,
    ) {
        let path = run.export_path.unwrap_or_default();
        match result {
            Ok(ScanOutcome::Completed(result)) => {
                tracing::info!(
                    "Export {} completed: {} lines written to {} ({:.2}s)",
                    run.id,
                    result.lines,
                    path,
                    result.elapsed.as_secs_f64()
                );
                self.metrics
                    .record_export_completed(result.visited, result.lines, result.elapsed);
                self.state_manager.record_export(path, result.lines);
                self.state_manager
                    .finish_run(RunOutcome::Completed(RunKind::Export), None);
            }
            Ok(ScanOutcome::Cancelled { visited }) => {
                tracing::info!(
                    "Export {} cancelled after {} candidates; partial file left at {}",
                    run.id,
                    visited,
                    path
                );
                self.metrics.record_run_cancelled(visited);
                self.state_manager
                    .finish_run(RunOutcome::Cancelled(RunKind::Export), None);
            }
            Err(e) => {
                tracing::error!("Export {} to {} failed: {}", run.id, path, e);
                self.metrics.record_run_failed();
                self.state_manager
                    .finish_run(RunOutcome::Failed(RunKind::Export), Some(e.to_string()));
                self.last_error = Some(e);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Paging
    // ---------------------------------------------------------------------

    /// The current page, whether or not a run is active
    pub fn page_view(&self) -> PageView {
        self.store.view()
    }

    pub fn show_page(&mut self, index: usize) -> Result<PageView, SessionError> {
        self.ensure_idle()?;
        let view = self.store.show_page(index);
        self.state_manager.publish_page(&view);
        Ok(view)
    }

    pub fn next_page(&mut self) -> Result<PageView, SessionError> {
        self.ensure_idle()?;
        let view = self.store.next_page();
        self.state_manager.publish_page(&view);
        Ok(view)
    }

    pub fn prev_page(&mut self) -> Result<PageView, SessionError> {
        self.ensure_idle()?;
        let view = self.store.prev_page();
        self.state_manager.publish_page(&view);
        Ok(view)
    }

    /// Jump to a 1-based page number typed by the user
    pub fn go_to_page(&mut self, input: &str) -> Result<PageView, SessionError> {
        self.ensure_idle()?;
        let view = self.store.go_to_page(input);
        self.state_manager.publish_page(&view);
        Ok(view)
    }

    /// Flag a visible entry for deletion. Returns `false` for an empty slot.
    pub fn set_marked(&mut self, position: usize, marked: bool) -> Result<bool, SessionError> {
        self.ensure_idle()?;
        let found = self.store.set_marked(position, marked);
        if found {
            self.state_manager.publish_page(&self.store.view());
        }
        Ok(found)
    }

    pub fn toggle_marked(&mut self, position: usize) -> Result<bool, SessionError> {
        self.ensure_idle()?;
        let found = self.store.toggle_marked(position);
        if found {
            self.state_manager.publish_page(&self.store.view());
        }
        Ok(found)
    }

    /// Soft-delete every marked entry on the visible page
    pub fn delete_marked(&mut self) -> Result<DeleteSummary, SessionError> {
        self.ensure_idle()?;
        let summary = self.store.delete_marked();
        if !summary.removed.is_empty() {
            self.metrics.record_entries_deleted(summary.removed.len());
            self.state_manager.publish_page(&summary.view);
        }
        Ok(summary)
    }

    /// Soft-deleted signatures accumulated since the last scan
    pub fn soft_deleted(&self) -> &HashSet<String> {
        self.store.removed_signatures()
    }

    fn ensure_idle(&mut self) -> Result<(), SessionError> {
        self.process_pending();
        if self.active.is_some() {
            return Err(SessionError::Busy);
        }
        Ok(())
    }
}

impl Drop for FilterSession {
    fn drop(&mut self) {
        // Stop the worker; it checks the flag before every candidate
        self.cancel();
    }
}
