use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::error::AppError;

/// Whether a photo shows the problem before or after the repair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhotoKind {
    Before,
    After,
}

impl PhotoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoKind::Before => "BEFORE",
            PhotoKind::After => "AFTER",
        }
    }
}

impl std::str::FromStr for PhotoKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BEFORE" => Ok(PhotoKind::Before),
            "AFTER" => Ok(PhotoKind::After),
            other => Err(AppError::Validation(format!("Unknown photo kind '{}'", other))),
        }
    }
}

/// Metadata of a stored ticket photo. The file itself lives in external storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Photo {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub kind: PhotoKind,
    pub storage_path: String,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PhotoRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub photo_type: String,
    pub storage_path: String,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PhotoRow> for Photo {
    type Error = AppError;

    fn try_from(row: PhotoRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            ticket_id: row.ticket_id,
            kind: row.photo_type.parse()?,
            storage_path: row.storage_path,
            uploaded_by: row.uploaded_by,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreatePhoto {
    pub ticket_id: Uuid,
    pub kind: PhotoKind,
    pub storage_path: String,
    pub uploaded_by: Uuid,
}
