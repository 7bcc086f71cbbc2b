//! Data models for the filter engine.
//!
//! - [`Combination`]: six ascending numbers from 1..=45, with its text signature
//! - [`RuleInstance`]: a user-configured activation of a rule (parameters + enabled flag)
//! - [`PageStore`]: page-bucketed scan results with the soft-delete overlay
//! - [`AppState`]: the view state published through [`StateManager`](crate::state::StateManager)
//! - [`UserConfig`] / [`FilterConfig`]: YAML-backed settings and filter lists

pub mod app_state;
pub mod combination;
pub mod config;
pub mod page_store;
pub mod rule_instance;

pub use app_state::{AppState, EnginePhase, RunKind, RunOutcome};
pub use combination::{Combination, MAX_NUMBER, MIN_NUMBER, PICK, TOTAL_COMBINATIONS};
pub use config::{ConditionConfig, FilterConfig, FilterSettings, UserConfig};
pub use page_store::{
    DeleteSummary, PAGE_SIZE, PageBuilder, PageEntry, PageStore, PageView, VisibleEntry,
};
pub use rule_instance::RuleInstance;
