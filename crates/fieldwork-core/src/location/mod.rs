//! GPS acquisition with a bounded wait and manual-entry fallback.

use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;

use crate::models::Coordinates;
use crate::{Error, Result};

/// How long to wait for a GPS fix before asking for manual coordinates
pub const DEFAULT_GPS_TIMEOUT: Duration = Duration::from_secs(15);

/// Source of the device's current position.
#[allow(async_fn_in_trait)]
pub trait LocationProvider {
    async fn current_position(&self) -> Result<Coordinates>;
}

/// Outcome of a location request
#[derive(Debug, Clone, PartialEq)]
pub enum LocationFix {
    Gps(Coordinates),
    /// GPS failed or timed out; the user must type coordinates in
    ManualRequired { reason: String },
}

impl LocationFix {
    pub const fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Gps(coordinates) => Some(*coordinates),
            Self::ManualRequired { .. } => None,
        }
    }
}

/// Ask `provider` for a fix, giving up after `timeout`.
pub async fn acquire_location(
    provider: &impl LocationProvider,
    timeout: Duration,
) -> LocationFix {
    match tokio::time::timeout(timeout, provider.current_position()).await {
        Ok(Ok(coordinates)) => {
            tracing::debug!(%coordinates, "GPS fix acquired");
            LocationFix::Gps(coordinates)
        }
        Ok(Err(error)) => {
            tracing::warn!("GPS unavailable: {error}");
            LocationFix::ManualRequired {
                reason: error.to_string(),
            }
        }
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "GPS request timed out");
            LocationFix::ManualRequired {
                reason: format!("No GPS fix within {} seconds", timeout.as_secs()),
            }
        }
    }
}

/// Reads the position from an external command printing JSON, such as
/// `termux-location`.
#[derive(Debug, Clone)]
pub struct CommandLocationProvider {
    program: String,
    args: Vec<String>,
}

#[derive(Deserialize)]
struct CommandPosition {
    latitude: f64,
    longitude: f64,
}

impl CommandLocationProvider {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line into program and arguments.
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| Error::Configuration("GPS command must not be empty".into()))?;
        Ok(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl LocationProvider for CommandLocationProvider {
    async fn current_position(&self) -> Result<Coordinates> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = crate::util::compact_text(&String::from_utf8_lossy(&output.stderr));
            return Err(Error::InvalidInput(format!(
                "GPS command `{}` exited with {}: {stderr}",
                self.program, output.status
            )));
        }

        parse_position(&output.stdout)
    }
}

fn parse_position(stdout: &[u8]) -> Result<Coordinates> {
    let position: CommandPosition = serde_json::from_slice(stdout)?;
    Ok(Coordinates::new(position.latitude, position.longitude))
}
