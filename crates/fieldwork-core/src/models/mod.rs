//! Data models for Fieldwork

mod pending_update;
mod sync_report;
mod work;
mod work_status;

pub use pending_update::{
    Coordinates, NewPendingUpdate, PendingUpdate, PendingUpdateId, Photo,
    DEFAULT_PHOTO_CONTENT_TYPE,
};
pub use sync_report::{SyncFailure, SyncReport, WorkListRefresh};
pub use work::WorkSummary;
pub use work_status::WorkStatus;
