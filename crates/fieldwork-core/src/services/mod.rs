//! Shared services used by client front-ends.

mod queue;

pub use queue::OfflineQueue;
