//! fieldwork-core - Core library for Fieldwork
//!
//! Field inspection capture for the works monitoring platform: a durable
//! offline queue of status updates, the sync pass that replays it against the
//! works API, and the direct-submission path that falls back to it.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod location;
pub mod models;
pub mod services;
pub mod submit;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{NewPendingUpdate, PendingUpdate, PendingUpdateId};
