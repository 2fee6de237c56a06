use fieldwork_core::config::FieldConfig;

use crate::commands::common::{format_pending_lines, open_queue, pending_to_item, PendingListItem};
use crate::error::CliError;

pub async fn run_pending(as_json: bool, config: &FieldConfig) -> Result<(), CliError> {
    let queue = open_queue(config).await?;
    let pending = queue.list_pending().await?;
    if let Some(path) = queue.path() {
        tracing::debug!(count = pending.len(), "Read offline queue at {}", path.display());
    }

    if as_json {
        let json_items = pending
            .iter()
            .map(pending_to_item)
            .collect::<Vec<PendingListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if pending.is_empty() {
        println!("No pending updates.");
        return Ok(());
    }

    for line in format_pending_lines(&pending) {
        println!("{line}");
    }
    println!("{} update(s) waiting to sync", pending.len());
    Ok(())
}
