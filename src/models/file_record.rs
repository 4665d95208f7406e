//! Represents an uploaded file tracked in the `images` table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Lifecycle of a record. Transitions only ever go `Live -> Deleted`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Live,
    Deleted { at: DateTime<Utc> },
}

impl Lifecycle {
    pub fn is_live(&self) -> bool {
        matches!(self, Lifecycle::Live)
    }

    /// Timestamp persisted in the `deleted_at` column.
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Lifecycle::Live => None,
            Lifecycle::Deleted { at } => Some(*at),
        }
    }
}

impl From<Option<DateTime<Utc>>> for Lifecycle {
    fn from(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            Some(at) => Lifecycle::Deleted { at },
            None => Lifecycle::Live,
        }
    }
}

/// Metadata for a single uploaded file.
///
/// The struct stores metadata only; payload bytes live in the content store
/// under `stored_path`.
#[derive(Clone, Debug)]
pub struct FileRecord {
    /// Row id assigned by SQLite. Never reused.
    pub id: i64,

    /// Name supplied by the uploading client. Untrusted.
    pub original_name: String,

    /// Server-generated key (UUID plus the sanitized extension).
    pub stored_name: String,

    /// Location relative to the content store root, e.g. `uploads/<stored_name>`.
    pub stored_path: String,

    /// Rounded kilobyte size, e.g. `"2048 KB"`.
    pub size_label: String,

    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lifecycle: Lifecycle,
}

/// Raw `images` row as read by SQLx.
#[derive(Debug, FromRow)]
pub struct FileRow {
    pub id: i64,
    pub original_name: String,
    pub stored_name: String,
    pub stored_path: String,
    pub size_label: Option<String>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<FileRow> for FileRecord {
    fn from(row: FileRow) -> Self {
        Self {
            id: row.id,
            original_name: row.original_name,
            stored_name: row.stored_name,
            stored_path: row.stored_path,
            size_label: row.size_label.unwrap_or_default(),
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            lifecycle: row.deleted_at.into(),
        }
    }
}

/// JSON view of a record returned by the API.
#[derive(Clone, Debug, Serialize)]
pub struct FileView {
    pub id: i64,
    pub original_name: String,
    pub stored_name: String,
    pub stored_path: String,
    pub size_label: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl FileView {
    pub fn new(record: &FileRecord, url: String) -> Self {
        Self {
            id: record.id,
            original_name: record.original_name.clone(),
            stored_name: record.stored_name.clone(),
            stored_path: record.stored_path.clone(),
            size_label: record.size_label.clone(),
            url,
            created_at: record.created_at,
            updated_at: record.updated_at,
            deleted_at: record.lifecycle.deleted_at(),
        }
    }
}
