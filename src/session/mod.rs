//! Session module - the interactive context around the engine.
//!
//! [`FilterSession`] owns everything a front end manipulates (conditions, page
//! store, the active run) and publishes view state through
//! [`StateManager`](crate::state::StateManager). [`WorkerBridge`] runs scans and
//! exports on the tokio blocking pool and routes their messages back.

pub mod bridge;
pub mod controller;

pub use bridge::{WorkerBridge, WorkerEvent, WorkerMessage, WorkerReporter};
pub use controller::FilterSession;

use thiserror::Error;

/// Identifies one scan or export within a session
pub type SessionRunId = u64;

/// Errors returned by session operations
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    #[error("No condition at index {0}")]
    NoSuchCondition(usize),

    #[error("A scan or export is in progress")]
    Busy,

    #[error("Failed to open export file: {0}")]
    Export(#[from] std::io::Error),
}
