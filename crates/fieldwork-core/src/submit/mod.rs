//! Direct submission of a field inspection, with opt-in offline fallback.
//!
//! A submission always tries the network first. When that fails, the caller's
//! [`OfflineFallback`] decides whether the update is saved to the offline
//! queue or dropped; nothing is queued silently.

use crate::api::{InspectionPayload, WorksApi};
use crate::models::{Coordinates, NewPendingUpdate, PendingUpdateId, Photo, WorkStatus};
use crate::services::OfflineQueue;
use crate::{Error, Result};

/// Form state collected before a submission
#[derive(Debug, Clone, Default)]
pub struct InspectionDraft {
    pub work_id: Option<i64>,
    pub status: WorkStatus,
    /// Fix reported by the device GPS
    pub gps_location: Option<Coordinates>,
    /// Coordinates typed in after GPS was unavailable
    pub manual_location: Option<Coordinates>,
    pub photo: Option<Photo>,
    pub remarks: String,
}

impl InspectionDraft {
    pub fn new(work_id: i64, status: WorkStatus) -> Self {
        Self {
            work_id: Some(work_id),
            status,
            ..Self::default()
        }
    }

    /// Coordinates to submit; GPS wins over manual entry
    pub fn location(&self) -> Option<Coordinates> {
        self.gps_location.or(self.manual_location)
    }

    /// Check required fields and stamp the capture time.
    pub fn validate(&self) -> Result<NewPendingUpdate> {
        let work_id = self
            .work_id
            .ok_or_else(|| Error::Validation("Select a work before submitting".into()))?;
        let photo = self
            .photo
            .clone()
            .filter(|photo| !photo.bytes.is_empty())
            .ok_or_else(|| Error::Validation("A photo is required".into()))?;
        let coordinates = self.location().ok_or_else(|| {
            Error::Validation("Capture GPS location or enter coordinates manually".into())
        })?;

        Ok(NewPendingUpdate::new(work_id, self.status, coordinates, photo)
            .with_remarks(self.remarks.trim()))
    }
}

/// What to do with an update whose direct submission failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfflineChoice {
    /// Keep it in the offline queue for a later sync
    SaveOffline,
    /// Drop it; the observation is lost
    Discard,
}

/// Decision hook consulted after a failed direct submission.
pub trait OfflineFallback {
    fn on_submit_failure(&self, error: &Error) -> OfflineChoice;
}

impl<F> OfflineFallback for F
where
    F: Fn(&Error) -> OfflineChoice,
{
    fn on_submit_failure(&self, error: &Error) -> OfflineChoice {
        self(error)
    }
}

/// Queue every failed submission without asking
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysSaveOffline;

impl OfflineFallback for AlwaysSaveOffline {
    fn on_submit_failure(&self, _error: &Error) -> OfflineChoice {
        OfflineChoice::SaveOffline
    }
}

/// Drop every failed submission
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverSaveOffline;

impl OfflineFallback for NeverSaveOffline {
    fn on_submit_failure(&self, _error: &Error) -> OfflineChoice {
        OfflineChoice::Discard
    }
}

/// Result of a submission attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Server accepted the update; nothing was queued
    Delivered,
    /// Direct attempt failed and the update was queued
    SavedOffline { id: PendingUpdateId, error: String },
    /// Direct attempt failed and the caller chose not to keep it
    Discarded { error: String },
}

/// Submits inspections directly, falling back to the offline queue.
pub struct FieldSubmitter<A> {
    queue: OfflineQueue,
    api: A,
}

impl<A: WorksApi> FieldSubmitter<A> {
    pub const fn new(queue: OfflineQueue, api: A) -> Self {
        Self { queue, api }
    }

    /// Validate, try the network, then consult `fallback` on failure.
    ///
    /// Returns `Err` for validation failures (nothing attempted) and when the
    /// update could not be saved offline.
    pub async fn submit(
        &self,
        draft: &InspectionDraft,
        fallback: &impl OfflineFallback,
    ) -> Result<SubmitOutcome> {
        let update = draft.validate()?;

        let error = match self
            .api
            .submit_inspection(&InspectionPayload::from_new(&update))
            .await
        {
            Ok(()) => {
                tracing::info!(work_id = update.work_id, "Inspection submitted");
                return Ok(SubmitOutcome::Delivered);
            }
            Err(error) => error,
        };

        tracing::warn!(work_id = update.work_id, "Direct submission failed: {error}");

        match fallback.on_submit_failure(&error) {
            OfflineChoice::SaveOffline => {
                let id = self.queue.enqueue(&update).await.map_err(|storage_error| {
                    Error::Storage(format!(
                        "Could not save offline, the update was not kept: {storage_error}"
                    ))
                })?;
                Ok(SubmitOutcome::SavedOffline {
                    id,
                    error: error.to_string(),
                })
            }
            OfflineChoice::Discard => {
                tracing::warn!(work_id = update.work_id, "Failed submission discarded");
                Ok(SubmitOutcome::Discarded {
                    error: error.to_string(),
                })
            }
        }
    }
}
