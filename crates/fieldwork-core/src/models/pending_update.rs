//! Pending field update model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::WorkStatus;
use crate::error::{Error, Result};

/// Content type assumed for photos whose extension is not recognised
pub const DEFAULT_PHOTO_CONTENT_TYPE: &str = "image/jpeg";

/// Identifier assigned by the offline queue at insertion time.
///
/// Ids increase monotonically and are never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingUpdateId(i64);

impl PendingUpdateId {
    /// Wrap a raw database row id
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Raw database row id
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PendingUpdateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PendingUpdateId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|_| Error::InvalidInput(format!("Invalid pending update id: {s}")))
    }
}

/// Latitude/longitude pair, either from device GPS or entered by hand.
///
/// No range validation happens locally; the server is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Photo evidence attached to an update
#[derive(Clone, PartialEq, Eq)]
pub struct Photo {
    /// Original file name (may be empty for captured blobs)
    pub file_name: String,
    /// MIME type sent with the multipart part
    pub content_type: String,
    /// Raw image bytes
    pub bytes: Vec<u8>,
}

impl Photo {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a photo from disk, guessing the content type from its extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        if bytes.is_empty() {
            return Err(Error::Validation(format!(
                "Photo file is empty: {}",
                path.display()
            )));
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let content_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(DEFAULT_PHOTO_CONTENT_TYPE);

        Ok(Self::new(file_name, content_type, bytes))
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for Photo {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Photo")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// A field observation that has not yet been assigned a queue id
#[derive(Debug, Clone, PartialEq)]
pub struct NewPendingUpdate {
    /// Remote work record this observation concerns
    pub work_id: i64,
    pub status: WorkStatus,
    pub coordinates: Coordinates,
    pub photo: Photo,
    /// Free text, empty when not provided
    pub remarks: String,
    /// Capture time (Unix ms)
    pub captured_at: i64,
}

impl NewPendingUpdate {
    /// Create an update captured now
    pub fn new(work_id: i64, status: WorkStatus, coordinates: Coordinates, photo: Photo) -> Self {
        Self {
            work_id,
            status,
            coordinates,
            photo,
            remarks: String::new(),
            captured_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    #[must_use]
    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }
}

/// A queued field observation awaiting delivery to the server
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpdate {
    pub id: PendingUpdateId,
    pub work_id: i64,
    pub status: WorkStatus,
    pub coordinates: Coordinates,
    pub photo: Photo,
    pub remarks: String,
    pub captured_at: i64,
}

impl PendingUpdate {
    /// Attach a queue id to a new update
    pub fn from_new(id: PendingUpdateId, update: NewPendingUpdate) -> Self {
        Self {
            id,
            work_id: update.work_id,
            status: update.status,
            coordinates: update.coordinates,
            photo: update.photo,
            remarks: update.remarks,
            captured_at: update.captured_at,
        }
    }
}
