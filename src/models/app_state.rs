use super::page_store::{PageView, VisibleEntry};
use camino::Utf8PathBuf;

/// Which long-running operation a worker is executing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunKind {
    Scan,
    Export,
}

/// Engine lifecycle: `Idle → Running → Idle`, with the terminal outcome of the
/// last run kept in [`AppState::last_outcome`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EnginePhase {
    #[default]
    Idle,
    Running(RunKind),
}

/// How the most recent run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunKind),
    Cancelled(RunKind),
    Failed(RunKind),
}

/// View state published to subscribers.
///
/// Holds only what a front end renders: the visible page (at most 50 entries),
/// counters and run status. The full result set lives in the session's
/// [`PageStore`](super::PageStore) and never passes through here, so cloning
/// `AppState` for change detection stays cheap.
///
/// # Thread Safety
///
/// Wrapped in `Arc<RwLock<AppState>>` by [`crate::state::StateManager`]; mutate it
/// only through [`update()`](crate::state::StateManager::update).
#[derive(Clone, Debug, Default)]
pub struct AppState {
    // Run status
    pub phase: EnginePhase,
    pub last_outcome: Option<RunOutcome>,
    pub progress_percent: u8,
    pub last_error: Option<String>,
    pub last_export_path: Option<Utf8PathBuf>,
    pub last_export_lines: u64,

    // Paging
    pub page_index: usize,
    pub total_pages: usize,
    pub total_matches: usize,
    pub visible: Vec<VisibleEntry>,
    pub soft_deleted: usize,

    // Conditions
    pub condition_count: usize,
    pub enabled_condition_count: usize,
}

impl AppState {
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, EnginePhase::Running(_))
    }

    pub fn can_interact(&self) -> bool {
        !self.is_busy()
    }

    pub fn can_prev(&self) -> bool {
        !self.is_busy() && self.page_index > 0
    }

    pub fn can_next(&self) -> bool {
        !self.is_busy() && self.page_index + 1 < self.total_pages
    }

    /// `Page X / Y`, never showing fewer than one page.
    pub fn page_summary(&self) -> String {
        format!("Page {} / {}", self.page_index + 1, self.total_pages.max(1))
    }

    /// Total match count with thousands separators, e.g. `1,234,567 matches`.
    pub fn total_matches_summary(&self) -> String {
        let digits = self.total_matches.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        format!("{} matches", grouped)
    }

    /// Copy a page view into the published state.
    pub fn apply_page_view(&mut self, view: &PageView) {
        self.page_index = view.page_index;
        self.total_pages = view.total_pages;
        self.total_matches = view.total_matches;
        self.visible = view.entries.clone();
        self.soft_deleted = view.soft_deleted;
    }

    /// Clear paging data and progress; run status and conditions are untouched.
    pub fn reset_paging(&mut self) {
        self.progress_percent = 0;
        self.page_index = 0;
        self.total_pages = 0;
        self.total_matches = 0;
        self.visible.clear();
        self.soft_deleted = 0;
    }
}
