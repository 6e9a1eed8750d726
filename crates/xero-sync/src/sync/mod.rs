//! Sync engine and progress tracking

pub(crate) mod engine;
mod progress;

pub use engine::{AccountingSource, SyncOutcome, run_sync};
pub use progress::{ProgressTracker, RunGuard, SyncProgress, SyncStatus};
