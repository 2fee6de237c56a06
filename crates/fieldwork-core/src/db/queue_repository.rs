//! Pending update repository implementation

use crate::error::{Error, Result};
use crate::models::{Coordinates, NewPendingUpdate, PendingUpdate, PendingUpdateId, Photo};
use libsql::{params, Connection, Row};

const SELECT_COLUMNS: &str = "id, work_id, status, latitude, longitude, photo_name, \
                              photo_content_type, photo, remarks, captured_at";

/// Trait for offline queue storage operations (async)
#[allow(async_fn_in_trait)]
pub trait PendingUpdateRepository {
    /// Persist a new update and return its freshly assigned id
    async fn enqueue(&self, update: &NewPendingUpdate) -> Result<PendingUpdateId>;

    /// All queued updates in insertion order
    async fn list_pending(&self) -> Result<Vec<PendingUpdate>>;

    /// Fetch a single queued update
    async fn get(&self, id: PendingUpdateId) -> Result<Option<PendingUpdate>>;

    /// Delete an update; returns `false` when the id was already gone
    async fn remove(&self, id: PendingUpdateId) -> Result<bool>;

    /// Delete every queued update, returning how many were removed
    async fn clear(&self) -> Result<u64>;

    /// Number of queued updates
    async fn count(&self) -> Result<usize>;
}

/// libSQL implementation of `PendingUpdateRepository`
pub struct LibSqlPendingUpdateRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlPendingUpdateRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a pending update from a database row
    fn parse_update(row: &Row) -> Result<PendingUpdate> {
        let status: String = row.get(2)?;
        let status = status.parse().map_err(|_| {
            Error::Database(format!("Unrecognised status in offline queue: {status}"))
        })?;

        Ok(PendingUpdate {
            id: PendingUpdateId::new(row.get(0)?),
            work_id: row.get(1)?,
            status,
            coordinates: Coordinates::new(row.get(3)?, row.get(4)?),
            photo: Photo::new(
                row.get::<String>(5)?,
                row.get::<String>(6)?,
                row.get::<Vec<u8>>(7)?,
            ),
            remarks: row.get(8)?,
            captured_at: row.get(9)?,
        })
    }
}

impl PendingUpdateRepository for LibSqlPendingUpdateRepository<'_> {
    async fn enqueue(&self, update: &NewPendingUpdate) -> Result<PendingUpdateId> {
        if update.photo.bytes.is_empty() {
            return Err(Error::Validation(
                "An update without a photo cannot be queued".into(),
            ));
        }

        self.conn
            .execute(
                "INSERT INTO pending_updates (
                    work_id, status, latitude, longitude, photo_name,
                    photo_content_type, photo, remarks, captured_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    update.work_id,
                    update.status.as_str(),
                    update.coordinates.latitude,
                    update.coordinates.longitude,
                    update.photo.file_name.as_str(),
                    update.photo.content_type.as_str(),
                    update.photo.bytes.clone(),
                    update.remarks.as_str(),
                    update.captured_at
                ],
            )
            .await?;

        Ok(PendingUpdateId::new(self.conn.last_insert_rowid()))
    }

    async fn list_pending(&self) -> Result<Vec<PendingUpdate>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {SELECT_COLUMNS} FROM pending_updates ORDER BY id ASC"),
                (),
            )
            .await?;

        let mut updates = Vec::new();
        while let Some(row) = rows.next().await? {
            updates.push(Self::parse_update(&row)?);
        }
        Ok(updates)
    }

    async fn get(&self, id: PendingUpdateId) -> Result<Option<PendingUpdate>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {SELECT_COLUMNS} FROM pending_updates WHERE id = ?"),
                [id.get()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_update(&row)?)),
            None => Ok(None),
        }
    }

    async fn remove(&self, id: PendingUpdateId) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM pending_updates WHERE id = ?", [id.get()])
            .await?;
        Ok(deleted > 0)
    }

    async fn clear(&self) -> Result<u64> {
        let deleted = self.conn.execute("DELETE FROM pending_updates", ()).await?;
        Ok(deleted)
    }

    async fn count(&self) -> Result<usize> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM pending_updates", ())
            .await?;

        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
