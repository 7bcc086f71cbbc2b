// LottoFilter - Rule-based filtering of the 6-of-45 combination space
//
// This is the library crate containing the engine, the session and the data
// structures. The binary crate (main.rs) provides the command line front end.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod rules;
pub mod services;
pub mod session;
pub mod state;

// Re-export commonly used types for convenience
pub use config::{ConfigManager, ConfigSummary};
pub use metrics::Metrics;
pub use models::{AppState, Combination, FilterConfig, PageView, RuleInstance, UserConfig};
pub use rules::{Rule, RuleParameters, RuleRegistry};
pub use services::{DrawHistory, WinningHistory};
pub use session::{FilterSession, SessionError};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
