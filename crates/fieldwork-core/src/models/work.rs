//! Remote work record model

use serde::{Deserialize, Serialize};

/// The fields of a `GET /works` entry that field clients care about.
///
/// Unknown fields in the server payload are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSummary {
    pub id: i64,
    #[serde(default)]
    pub work_code: Option<String>,
    #[serde(default)]
    pub work_name: Option<String>,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub panchayat: Option<String>,
    /// Raw status string; the server may hold values outside `WorkStatus`
    #[serde(default)]
    pub current_status: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub assigned_officer_id: Option<i64>,
    #[serde(default)]
    pub inspection_deadline: Option<String>,
}

impl WorkSummary {
    /// Best label for display: work name, then work code, then the id
    pub fn label(&self) -> String {
        self.work_name
            .as_deref()
            .or(self.work_code.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map_or_else(|| format!("Work #{}", self.id), ToString::to_string)
    }
}
