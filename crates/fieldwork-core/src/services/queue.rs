//! Durable offline queue shared by the submission path and the sync coordinator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{Database, LibSqlPendingUpdateRepository, PendingUpdateRepository};
use crate::models::{NewPendingUpdate, PendingUpdate, PendingUpdateId};
use crate::{Error, Result};

/// Thread-safe handle to the on-device queue of undelivered field updates.
///
/// Constructed once by the application and cloned into every component that
/// needs it. Each mutation has been committed to the database file by the
/// time the call returns.
#[derive(Clone)]
pub struct OfflineQueue {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl OfflineQueue {
    /// Open the queue stored at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|error| storage_failure("create the queue directory", error.into()))?;
        }

        let db = Database::open(&db_path)
            .await
            .map_err(|error| storage_failure("open the offline queue", error))?;
        tracing::debug!("Opened offline queue at {}", db_path.display());

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory queue (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Location of the queue file, `None` for in-memory queues.
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Durably store an update and return its assigned id.
    pub async fn enqueue(&self, update: &NewPendingUpdate) -> Result<PendingUpdateId> {
        let db = self.db.lock().await;
        let repo = LibSqlPendingUpdateRepository::new(db.connection());
        let id = repo
            .enqueue(update)
            .await
            .map_err(|error| storage_failure("save the update offline", error))?;

        tracing::info!(
            update_id = %id,
            work_id = update.work_id,
            status = %update.status,
            "Queued field update for later sync"
        );
        Ok(id)
    }

    /// List queued updates in insertion order.
    pub async fn list_pending(&self) -> Result<Vec<PendingUpdate>> {
        let db = self.db.lock().await;
        let repo = LibSqlPendingUpdateRepository::new(db.connection());
        repo.list_pending()
            .await
            .map_err(|error| storage_failure("read the offline queue", error))
    }

    /// Remove an update. Removing an id that is already gone is not an error.
    pub async fn remove(&self, id: PendingUpdateId) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlPendingUpdateRepository::new(db.connection());
        let removed = repo
            .remove(id)
            .await
            .map_err(|error| storage_failure("remove the update from the queue", error))?;

        if !removed {
            tracing::debug!(update_id = %id, "Pending update already removed");
        }
        Ok(())
    }

    /// Remove every queued update. Only for explicit user resets.
    pub async fn clear(&self) -> Result<u64> {
        let db = self.db.lock().await;
        let repo = LibSqlPendingUpdateRepository::new(db.connection());
        let removed = repo
            .clear()
            .await
            .map_err(|error| storage_failure("clear the offline queue", error))?;

        tracing::warn!(removed, "Cleared offline queue");
        Ok(removed)
    }

    /// Number of updates waiting to sync.
    pub async fn pending_count(&self) -> Result<usize> {
        let db = self.db.lock().await;
        let repo = LibSqlPendingUpdateRepository::new(db.connection());
        repo.count()
            .await
            .map_err(|error| storage_failure("read the offline queue", error))
    }
}

fn storage_failure(action: &str, error: Error) -> Error {
    if error.is_validation() {
        error
    } else {
        Error::Storage(format!("Could not {action}: {error}"))
    }
}
