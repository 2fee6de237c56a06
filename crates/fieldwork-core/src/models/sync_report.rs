//! Sync pass summary model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{PendingUpdateId, WorkSummary};

/// A queued update that could not be delivered during a sync pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFailure {
    /// Queue id of the update, still present in the queue
    pub update_id: PendingUpdateId,
    /// Remote work the update concerns
    pub work_id: i64,
    /// Error detail shown to the user
    pub detail: String,
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "work {} (update {}): {}",
            self.work_id, self.update_id, self.detail
        )
    }
}

/// Outcome of the work list refresh that follows a sync pass
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum WorkListRefresh {
    /// Nothing was queued, so no refresh was attempted
    #[default]
    Skipped,
    /// Fresh work list fetched from the server
    Refreshed(Vec<WorkSummary>),
    /// Refresh failed; the sync result itself still stands
    Failed(String),
}

/// Summary of one `sync_all` pass
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SyncReport {
    /// Updates confirmed by the server and removed from the queue
    pub delivered: usize,
    /// Updates in the snapshot taken at the start of the pass
    pub total: usize,
    /// One entry per update left in the queue, in replay order
    pub failures: Vec<SyncFailure>,
    pub refresh: WorkListRefresh,
}

impl SyncReport {
    /// Whether every update in the snapshot was delivered
    pub const fn is_complete(&self) -> bool {
        self.delivered == self.total
    }

    /// Updates still waiting after this pass
    pub const fn remaining(&self) -> usize {
        self.total.saturating_sub(self.delivered)
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Synced {} of {} updates.", self.delivered, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_message() {
        let report = SyncReport {
            delivered: 2,
            total: 3,
            failures: vec![SyncFailure {
                update_id: PendingUpdateId::new(5),
                work_id: 42,
                detail: "HTTP 502".to_string(),
            }],
            refresh: WorkListRefresh::Skipped,
        };

        assert_eq!(report.to_string(), "Synced 2 of 3 updates.");
        assert!(!report.is_complete());
        assert_eq!(report.remaining(), 1);
        assert_eq!(
            report.failures[0].to_string(),
            "work 42 (update 5): HTTP 502"
        );
    }

    #[test]
    fn test_empty_report_is_complete() {
        let report = SyncReport::default();
        assert!(report.is_complete());
        assert_eq!(report.to_string(), "Synced 0 of 0 updates.");
    }
}
