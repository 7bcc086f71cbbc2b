//! Services module - the filter-and-paginate engine.
//!
//! Everything here is framework-agnostic and has no knowledge of the session or
//! the view state. The scan and export entry points are blocking and are meant to
//! run on a worker thread; they talk back only through their progress callback and
//! return value.
//!
//! # Components
//!
//! - [`combinations`]: lazy lexicographic enumeration of all 8,145,060 combinations
//! - [`FilterSnapshot`]: enabled rules bound to their parameters, plus the soft-delete set
//! - [`run_scan`]: drives the enumerator through a snapshot into page buckets
//! - [`run_export`]: same loop, streaming survivors to any [`std::io::Write`]
//! - [`WinningHistory`]: local store of past first-prize draws behind [`DrawHistory`]
//!
//! # Cancellation
//!
//! Both runs take a `tokio::sync::watch::Receiver<bool>` and check it before every
//! candidate. A cancelled run returns [`ScanOutcome::Cancelled`], never an error.
//!
//! # Usage Example
//!
//! ```ignore
//! use lottofilter::services::{FilterSnapshot, run_scan};
//!
//! let snapshot = FilterSnapshot::capture(&conditions, store.removed_signatures());
//! let (_cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
//!
//! if let ScanOutcome::Completed(result) = run_scan(&snapshot, &cancel_rx, |p| println!("{p}%"))? {
//!     store.install(result.buckets, 0);
//! }
//! ```

pub mod enumerator;
pub mod export;
pub mod filter;
pub mod history;
pub mod scan;

pub use enumerator::{Combinations, combinations};
pub use export::{ExportResult, run_export};
pub use filter::{FilterSnapshot, RuleSnapshot, should_exclude};
pub use history::{DrawHistory, DrawRecord, HistoryError, NumberStatistic, WinningHistory};
pub use scan::{PROGRESS_MASK, ScanError, ScanOutcome, ScanResult, progress_percent, run_scan};
