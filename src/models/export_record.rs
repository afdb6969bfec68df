//! Export history entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ExportId, UserId};

/// One file written by an export, as recorded in the export history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub id: ExportId,
    pub filename: String,
    /// csv, xlsx, pdf, json or yaml
    pub format: String,
    /// Filters applied, as JSON text
    #[serde(default)]
    pub filters: String,
    pub record_count: u64,
    pub file_size: u64,
    #[serde(default)]
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl ExportRecord {
    pub fn new(
        filename: impl Into<String>,
        format: impl Into<String>,
        filters: impl Into<String>,
        record_count: u64,
        file_size: u64,
    ) -> Self {
        Self {
            id: ExportId::new(),
            filename: filename.into(),
            format: format.into(),
            filters: filters.into(),
            record_count,
            file_size,
            created_by: None,
            created_at: Utc::now(),
        }
    }
}
