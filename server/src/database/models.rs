//! Record models
//!
//! Rust structs representing persisted records.
//! All models use serde for serialization to the record file and to clients.

use crate::config::MIN_DESCRIPTION_LEN;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A submitted incident report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Public URL of the attached photo, e.g. `/uploads/<name>`
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved: bool,
}

/// Fields of a report before identity is assigned
#[derive(Debug, Clone, Default)]
pub struct NewReport {
    pub description: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub photo: Option<String>,
}

impl Report {
    /// Assign a fresh id and creation time; new reports start unresolved
    pub fn new(req: NewReport) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            description: req.description,
            lat: req.lat,
            lng: req.lng,
            photo: req.photo,
            created_at: Utc::now(),
            resolved: false,
        }
    }

    /// A report needs a meaningful description or a photo
    pub fn has_content(&self) -> bool {
        self.description.trim().chars().count() >= MIN_DESCRIPTION_LEN || self.photo.is_some()
    }
}

/// On-disk layout of the record file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportsFile {
    #[serde(default)]
    pub reports: Vec<Report>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
