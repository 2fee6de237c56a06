use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use fieldwork_core::api::HttpWorksApi;
use fieldwork_core::config::{ConfigOverrides, FieldConfig, FieldConfigFile};
use fieldwork_core::services::OfflineQueue;
use fieldwork_core::PendingUpdate;
use serde::Serialize;

use crate::cli::Cli;
use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "config.json";

/// Queue entry as printed by `fieldwork pending --json`; photo bytes omitted.
#[derive(Debug, Serialize)]
pub struct PendingListItem {
    pub id: i64,
    pub work_id: i64,
    pub status: String,
    pub latitude: f64,
    pub longitude: f64,
    pub remarks: String,
    pub photo_name: String,
    pub photo_bytes: usize,
    pub captured_at: i64,
    pub captured_at_iso: String,
}

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("fieldwork").join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve the user config directory".into()))
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fieldwork")
        .join("offline-queue.db")
}

pub fn overrides_from_cli(cli: &Cli) -> ConfigOverrides {
    ConfigOverrides {
        api_base_url: cli.api_url.clone(),
        access_token: cli.access_token.clone(),
        db_path: cli.db_path.clone(),
        ..ConfigOverrides::default()
    }
}

/// Resolve flags, process environment, then the config file.
pub fn load_config(overrides: ConfigOverrides) -> Result<FieldConfig, CliError> {
    let file = FieldConfigFile::load_from_path(&default_config_path()?)?;
    Ok(FieldConfig::resolve(
        overrides,
        |key| env::var(key).ok(),
        file,
    )?)
}

pub fn resolve_db_path(config: &FieldConfig) -> PathBuf {
    config.db_path.clone().unwrap_or_else(default_db_path)
}

pub async fn open_queue(config: &FieldConfig) -> Result<OfflineQueue, CliError> {
    Ok(OfflineQueue::open_path(resolve_db_path(config)).await?)
}

pub fn build_api(config: &FieldConfig) -> Result<HttpWorksApi, CliError> {
    let api = HttpWorksApi::new(config.require_api_base_url()?, None)?;
    Ok(api.with_access_token(config.access_token.clone()))
}

pub fn pending_to_item(update: &PendingUpdate) -> PendingListItem {
    PendingListItem {
        id: update.id.get(),
        work_id: update.work_id,
        status: update.status.to_string(),
        latitude: update.coordinates.latitude,
        longitude: update.coordinates.longitude,
        remarks: update.remarks.clone(),
        photo_name: update.photo.file_name.clone(),
        photo_bytes: update.photo.size_bytes(),
        captured_at: update.captured_at,
        captured_at_iso: format_timestamp(update.captured_at),
    }
}

pub fn format_pending_lines(updates: &[PendingUpdate]) -> Vec<String> {
    updates
        .iter()
        .map(|update| {
            let remarks = if update.remarks.is_empty() {
                String::new()
            } else {
                format!("  {}", preview(&update.remarks, 40))
            };
            format!(
                "#{:<4} work {:<6} {:<12} {}  {}{remarks}",
                update.id.get(),
                update.work_id,
                update.status.as_str(),
                update.coordinates,
                format_timestamp(update.captured_at),
            )
        })
        .collect()
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |time| time.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}

pub fn preview(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let truncated: String = single_line.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{truncated}...")
}

/// Ask a yes/no question; anything but an explicit yes is a no.
pub fn confirm(question: &str, input: &mut impl BufRead, output: &mut impl Write) -> io::Result<bool> {
    write!(output, "{question} [y/N] ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Prompt on the controlling terminal; `None` when stdin is not interactive.
pub fn confirm_on_terminal(question: &str) -> Option<bool> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return None;
    }
    confirm(question, &mut stdin.lock(), &mut io::stderr()).ok()
}
