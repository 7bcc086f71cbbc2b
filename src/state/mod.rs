// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for front-end updates.

use crate::models::{AppState, EnginePhase, PageView, RunKind, RunOutcome};
use camino::Utf8PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// These events notify interested parties (the CLI progress printer, tests)
/// about state changes without requiring them to poll the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// A scan or export has started
    RunStarted { kind: RunKind },

    /// Scan or export progress has changed
    ProgressUpdated { percent: u8 },

    /// The visible page or the result totals have changed
    PageChanged {
        page_index: usize,
        total_pages: usize,
        total_matches: usize,
    },

    /// A run has completed, been cancelled or failed
    RunFinished {
        outcome: RunOutcome,
        error: Option<String>,
    },

    /// Conditions were added, removed or toggled
    ConditionsChanged { total: usize, enabled: usize },

    /// Entries were soft-deleted
    EntriesDeleted { removed: usize, soft_deleted: usize },

    /// State has been reset
    StateReset,
}

/// Thread-safe state manager with event emission
///
/// This is the central state management component that:
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// # Usage
///
/// Always use `StateManager` instead of accessing [`AppState`] directly:
/// - [`read()`](Self::read) for reading individual fields
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
///
/// # Related Types
///
/// - [`crate::models::AppState`]: The underlying state structure
/// - [`StateChange`]: Event types emitted on state mutations
/// - [`crate::session::FilterSession`]: The only writer during normal operation
pub struct StateManager {
    /// The view state protected by RwLock for thread-safe access
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// # Returns
    /// A new StateManager with a broadcast channel buffer of 100 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Get a clone of the current state
    ///
    /// The state holds at most one page of entries, so cloning is cheap.
    pub fn snapshot(&self) -> AppState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let busy = state_manager.read(|state| state.is_busy());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// This is the primary way to modify state. It:
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// # Arguments
    /// * `update_fn` - A function that mutates the state
    ///
    /// # Returns
    /// A vector of StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver that will get notified of all future state changes.
    /// Multiple subscribers can listen simultaneously.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Detect what changed between two states and generate events
    fn detect_changes(old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        // Run lifecycle
        if old.phase != new.phase {
            match new.phase {
                EnginePhase::Running(kind) => changes.push(StateChange::RunStarted { kind }),
                EnginePhase::Idle => {
                    if let Some(outcome) = new.last_outcome {
                        changes.push(StateChange::RunFinished {
                            outcome,
                            error: new.last_error.clone(),
                        });
                    }
                }
            }
        }

        if old.progress_percent != new.progress_percent {
            changes.push(StateChange::ProgressUpdated {
                percent: new.progress_percent,
            });
        }

        if old.page_index != new.page_index
            || old.total_pages != new.total_pages
            || old.total_matches != new.total_matches
            || old.visible != new.visible
        {
            changes.push(StateChange::PageChanged {
                page_index: new.page_index,
                total_pages: new.total_pages,
                total_matches: new.total_matches,
            });
        }

        if new.soft_deleted > old.soft_deleted {
            changes.push(StateChange::EntriesDeleted {
                removed: new.soft_deleted - old.soft_deleted,
                soft_deleted: new.soft_deleted,
            });
        }

        if old.condition_count != new.condition_count
            || old.enabled_condition_count != new.enabled_condition_count
        {
            changes.push(StateChange::ConditionsChanged {
                total: new.condition_count,
                enabled: new.enabled_condition_count,
            });
        }

        changes
    }

    // Convenience methods for common state updates

    /// Enter `Running(kind)`. A scan also clears the published paging data.
    pub fn start_run(&self, kind: RunKind) -> Vec<StateChange> {
        self.update(|state| {
            state.phase = EnginePhase::Running(kind);
            state.progress_percent = 0;
            state.last_error = None;
            if kind == RunKind::Scan {
                state.reset_paging();
            }
        })
    }

    pub fn set_progress(&self, percent: u8) -> Vec<StateChange> {
        self.update(|state| state.progress_percent = percent.min(100))
    }

    /// Return to `Idle` and record how the run ended
    ///
    /// # Arguments
    /// * `outcome` - Completed, cancelled or failed, with the run kind
    /// * `error` - Failure message, stored in `last_error`
    pub fn finish_run(&self, outcome: RunOutcome, error: Option<String>) -> Vec<StateChange> {
        self.update(|state| {
            state.phase = EnginePhase::Idle;
            state.last_outcome = Some(outcome);
            state.last_error = error;
            if matches!(outcome, RunOutcome::Completed(_)) {
                state.progress_percent = 100;
            }
        })
    }

    /// Publish a page view (after navigation, a completed scan or a deletion)
    pub fn publish_page(&self, view: &PageView) -> Vec<StateChange> {
        self.update(|state| state.apply_page_view(view))
    }

    pub fn set_conditions(&self, total: usize, enabled: usize) -> Vec<StateChange> {
        self.update(|state| {
            state.condition_count = total;
            state.enabled_condition_count = enabled;
        })
    }

    /// Remember where the last export went and how many lines it wrote
    pub fn record_export(&self, path: Utf8PathBuf, lines: u64) -> Vec<StateChange> {
        self.update(|state| {
            state.last_export_path = Some(path);
            state.last_export_lines = lines;
        })
    }

    /// Clear paging data and progress
    pub fn reset(&self) -> Vec<StateChange> {
        let mut changes = self.update(|state| state.reset_paging());

        let reset_event = StateChange::StateReset;
        let _ = self.state_tx.send(reset_event.clone());
        changes.push(reset_event);

        changes
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across threads
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
