//! Sync progress tracking
//!
//! One process-wide progress record, written by the background sync run
//! and read by a polling caller. Field updates merge into the existing
//! record; under concurrent updates the last writer wins. Overlapping
//! runs are prevented by the single-flight guard, not by the record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::SyncError;

/// Phase of the current (or last) sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Idle,
    Starting,
    FetchingContacts,
    SyncingContacts,
    FetchingInvoices,
    SyncingInvoices,
    Completed,
    Error,
}

impl SyncStatus {
    /// Whether a poller should stop polling
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Idle | Self::Completed | Self::Error)
    }
}

/// Snapshot of sync progress for the polling caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncProgress {
    pub status: SyncStatus,
    pub current_step: String,
    /// 0-100
    pub progress: u8,
    pub total_contacts: usize,
    pub synced_contacts: usize,
    pub total_invoices: usize,
    pub synced_invoices: usize,
    pub errors: usize,
    pub current_contact: String,
    pub current_invoice: String,
    pub timestamp: DateTime<Utc>,
}

impl Default for SyncProgress {
    fn default() -> Self {
        Self {
            status: SyncStatus::Idle,
            current_step: String::new(),
            progress: 0,
            total_contacts: 0,
            synced_contacts: 0,
            total_invoices: 0,
            synced_invoices: 0,
            errors: 0,
            current_contact: String::new(),
            current_invoice: String::new(),
            timestamp: Utc::now(),
        }
    }
}

/// Shared progress state with a single-flight run guard
pub struct ProgressTracker {
    current: RwLock<SyncProgress>,
    running: AtomicBool,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(SyncProgress::default()),
            running: AtomicBool::new(false),
        }
    }

    /// Current snapshot; an idle default when nothing has run yet
    pub fn get(&self) -> SyncProgress {
        self.current.read().unwrap().clone()
    }

    /// Whether a run currently holds the guard
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Claim the single-flight guard for a new run.
    ///
    /// Fails fast with [`SyncError::AlreadyRunning`] when a run is
    /// active; the guard releases on drop.
    pub fn try_begin(self: &Arc<Self>) -> Result<RunGuard, SyncError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SyncError::AlreadyRunning);
        }
        Ok(RunGuard {
            tracker: Arc::clone(self),
        })
    }

    /// Overwrite status, step, and percentage, stamping the update time
    pub fn update(&self, status: SyncStatus, step: &str, progress: u8) {
        let mut current = self.current.write().unwrap();
        current.status = status;
        current.current_step = step.to_string();
        current.progress = progress;
        current.timestamp = Utc::now();
    }

    /// Merge arbitrary field changes into the current record
    pub fn merge(&self, apply: impl FnOnce(&mut SyncProgress)) {
        let mut current = self.current.write().unwrap();
        apply(&mut current);
        current.timestamp = Utc::now();
    }

    /// Reset to a fresh starting record for a new run
    pub fn reset(&self) {
        let mut current = self.current.write().unwrap();
        *current = SyncProgress {
            status: SyncStatus::Starting,
            current_step: "Starting sync".to_string(),
            ..SyncProgress::default()
        };
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases the single-flight guard when the run ends, however it ends
pub struct RunGuard {
    tracker: Arc<ProgressTracker>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.tracker.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let tracker = ProgressTracker::new();
        let progress = tracker.get();
        assert_eq!(progress.status, SyncStatus::Idle);
        assert_eq!(progress.progress, 0);
        assert!(progress.status.is_terminal());
    }

    #[test]
    fn test_update_and_merge() {
        let tracker = ProgressTracker::new();
        tracker.update(SyncStatus::SyncingContacts, "Syncing contacts", 25);
        tracker.merge(|p| {
            p.total_contacts = 10;
            p.synced_contacts = 3;
            p.current_contact = "Acme Corp".to_string();
        });

        let progress = tracker.get();
        assert_eq!(progress.status, SyncStatus::SyncingContacts);
        assert_eq!(progress.progress, 25);
        assert_eq!(progress.total_contacts, 10);
        assert_eq!(progress.synced_contacts, 3);
        assert_eq!(progress.current_contact, "Acme Corp");
    }

    #[test]
    fn test_single_flight_guard() {
        let tracker = Arc::new(ProgressTracker::new());

        let guard = tracker.try_begin().unwrap();
        assert!(tracker.is_running());
        assert!(matches!(
            tracker.try_begin(),
            Err(SyncError::AlreadyRunning)
        ));

        drop(guard);
        assert!(!tracker.is_running());
        // Released guard allows a new run
        let _guard = tracker.try_begin().unwrap();
    }

    #[test]
    fn test_reset_clears_counters() {
        let tracker = ProgressTracker::new();
        tracker.merge(|p| {
            p.total_contacts = 5;
            p.errors = 2;
        });
        tracker.reset();

        let progress = tracker.get();
        assert_eq!(progress.status, SyncStatus::Starting);
        assert_eq!(progress.total_contacts, 0);
        assert_eq!(progress.errors, 0);
    }
}
