use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] fieldwork_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Refusing to delete {0} queued update(s) that were never delivered. Re-run with --yes to confirm."
    )]
    ClearNotConfirmed(usize),
    #[error("Update was not submitted and was discarded: {0}")]
    Discarded(String),
    #[error("{failed} of {total} queued update(s) could not be delivered")]
    SyncIncomplete { failed: usize, total: usize },
}
