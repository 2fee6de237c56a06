use fieldwork_core::config::FieldConfig;
use fieldwork_core::models::{SyncReport, WorkListRefresh};
use fieldwork_core::sync::SyncCoordinator;

use crate::commands::common::{build_api, open_queue};
use crate::error::CliError;

pub async fn run_sync(as_json: bool, config: &FieldConfig) -> Result<(), CliError> {
    let api = build_api(config)?;
    let queue = open_queue(config).await?;
    tracing::info!("Syncing offline queue to {}", api.base_url());

    let coordinator = SyncCoordinator::new(queue, api);
    let report = coordinator.sync_all().await?;
    let still_queued = coordinator.queue().pending_count().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_sync_report(&report) {
            println!("{line}");
        }
        if still_queued > 0 {
            println!("{still_queued} update(s) still queued.");
        }
    }

    if report.is_complete() {
        Ok(())
    } else {
        Err(CliError::SyncIncomplete {
            failed: report.remaining(),
            total: report.total,
        })
    }
}

pub fn format_sync_report(report: &SyncReport) -> Vec<String> {
    if report.total == 0 {
        return vec!["No pending updates to sync.".to_string()];
    }

    let mut lines = vec![report.to_string()];
    lines.extend(report.failures.iter().map(|failure| format!("  failed: {failure}")));
    match &report.refresh {
        WorkListRefresh::Skipped => {}
        WorkListRefresh::Refreshed(works) => {
            lines.push(format!("Work list refreshed ({} works).", works.len()));
            lines.extend(works.iter().map(|work| {
                format!(
                    "  {}: {}",
                    work.label(),
                    work.current_status.as_deref().unwrap_or("status unknown")
                )
            }));
        }
        WorkListRefresh::Failed(detail) => {
            lines.push(format!("Work list refresh failed: {detail}"));
        }
    }
    lines
}
