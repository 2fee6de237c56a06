//! Work status model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Progress status reported by a field officer for a sanctioned work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WorkStatus {
    /// Work has not begun on site
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    /// Work is underway
    #[serde(rename = "In Progress")]
    InProgress,
    /// Work is finished
    #[serde(rename = "Completed")]
    Completed,
    /// Work has stopped before completion
    #[serde(rename = "Stalled")]
    Stalled,
}

impl WorkStatus {
    /// All statuses in display order
    pub const ALL: [Self; 4] = [
        Self::NotStarted,
        Self::InProgress,
        Self::Completed,
        Self::Stalled,
    ];

    /// Wire representation, as sent in the `status` form field
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Stalled => "Stalled",
        }
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkStatus {
    type Err = Error;

    /// Accepts the wire string case-insensitively, plus `kebab-case` and
    /// `snake_case` spellings (`in-progress`, `not_started`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_ascii_lowercase()
            .replace(['-', '_'], " ");

        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown work status: {s}")))
    }
}
