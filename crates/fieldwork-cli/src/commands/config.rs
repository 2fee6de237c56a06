use fieldwork_core::config::{ConfigOverrides, FieldConfig, FieldConfigFile};
use fieldwork_core::util::normalize_text_option;
use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::commands::common::{default_config_path, load_config, resolve_db_path};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct ConfigView {
    pub config_path: String,
    pub api_base_url: Option<String>,
    pub access_token: Option<String>,
    pub db_path: String,
    pub gps_command: Option<String>,
    pub gps_timeout_secs: u64,
}

pub fn run_config(command: ConfigCommands, overrides: ConfigOverrides) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show { json } => run_config_show(json, overrides),
        ConfigCommands::Init {
            gps_command,
            gps_timeout_secs,
        } => run_config_init(ConfigOverrides {
            gps_command,
            gps_timeout_secs,
            ..overrides
        }),
    }
}

fn run_config_show(as_json: bool, overrides: ConfigOverrides) -> Result<(), CliError> {
    let config = load_config(overrides)?;
    let view = config_view(&config, &default_config_path()?.display().to_string());

    if as_json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let unset = || "(not set)".to_string();
    println!("Config file:  {}", view.config_path);
    println!("API URL:      {}", view.api_base_url.unwrap_or_else(unset));
    println!("Access token: {}", view.access_token.unwrap_or_else(unset));
    println!("Queue DB:     {}", view.db_path);
    println!("GPS command:  {}", view.gps_command.unwrap_or_else(unset));
    println!("GPS timeout:  {}s", view.gps_timeout_secs);
    Ok(())
}

fn run_config_init(values: ConfigOverrides) -> Result<(), CliError> {
    let path = default_config_path()?;
    let existing = FieldConfigFile::load_from_path(&path)?;
    let updated = merge_config_file(existing, values)?;

    updated.save_to_path(&path)?;
    println!("Saved config to {}", path.display());
    Ok(())
}

/// Overlay explicit values onto the stored file, validating the result.
pub fn merge_config_file(
    existing: FieldConfigFile,
    values: ConfigOverrides,
) -> Result<FieldConfigFile, CliError> {
    let merged = FieldConfigFile {
        api_base_url: normalize_text_option(values.api_base_url).or(existing.api_base_url),
        access_token: normalize_text_option(values.access_token).or(existing.access_token),
        db_path: values.db_path.or(existing.db_path),
        gps_command: normalize_text_option(values.gps_command).or(existing.gps_command),
        gps_timeout_secs: values.gps_timeout_secs.or(existing.gps_timeout_secs),
    };

    let resolved = FieldConfig::resolve(ConfigOverrides::default(), |_| None, merged.clone())?;
    Ok(FieldConfigFile {
        api_base_url: resolved.api_base_url,
        ..merged
    })
}

pub fn config_view(config: &FieldConfig, config_path: &str) -> ConfigView {
    ConfigView {
        config_path: config_path.to_string(),
        api_base_url: config.api_base_url.clone(),
        access_token: config.access_token.as_deref().map(mask_secret),
        db_path: resolve_db_path(config).display().to_string(),
        gps_command: config.gps_command.clone(),
        gps_timeout_secs: config.gps_timeout.as_secs(),
    }
}

pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 8 {
        return "********".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}
