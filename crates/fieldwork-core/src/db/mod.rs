//! Database layer for the offline update queue

mod connection;
mod migrations;
mod queue_repository;

pub use connection::Database;
pub use queue_repository::{LibSqlPendingUpdateRepository, PendingUpdateRepository};
