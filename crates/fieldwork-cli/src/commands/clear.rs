use fieldwork_core::config::FieldConfig;

use crate::commands::common::open_queue;
use crate::error::CliError;

pub async fn run_clear(confirmed: bool, config: &FieldConfig) -> Result<(), CliError> {
    let queue = open_queue(config).await?;
    let pending = queue.pending_count().await?;

    if pending == 0 {
        println!("Offline queue is already empty.");
        return Ok(());
    }
    if !confirmed {
        return Err(CliError::ClearNotConfirmed(pending));
    }

    let removed = queue.clear().await?;
    if let Some(path) = queue.path() {
        tracing::info!(removed, "Cleared offline queue at {}", path.display());
    }
    println!("Deleted {removed} queued update(s).");
    Ok(())
}
