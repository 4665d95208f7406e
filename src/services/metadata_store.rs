//! src/services/metadata_store.rs
//!
//! MetadataStore — SQLite access for the `images` table. Rows are never
//! physically removed; deletion sets `deleted_at`.

use crate::{
    models::file_record::{FileRecord, FileRow},
    services::dropzone_service::DropzoneResult,
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

const SELECT_COLUMNS: &str = "SELECT id, original_name, stored_name, stored_path, size_label,
            created_by, updated_by, created_at, updated_at, deleted_at
     FROM images";

/// Fields supplied by the upload path; everything else is assigned on insert.
#[derive(Debug)]
pub struct NewFileRecord<'a> {
    pub original_name: &'a str,
    pub stored_name: &'a str,
    pub stored_path: &'a str,
    pub size_label: &'a str,
}

#[derive(Clone)]
pub struct MetadataStore {
    /// Shared SQLite connection pool.
    db: Arc<SqlitePool>,
}

impl MetadataStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// Insert a live record and return it with its assigned id.
    pub async fn insert(&self, new: &NewFileRecord<'_>) -> DropzoneResult<FileRecord> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, FileRow>(
            r#"
            INSERT INTO images (
                original_name, stored_name, stored_path, size_label,
                created_by, updated_by, created_at, updated_at, deleted_at
            ) VALUES (?, ?, ?, ?, NULL, NULL, ?, ?, NULL)
            RETURNING id, original_name, stored_name, stored_path, size_label,
                      created_by, updated_by, created_at, updated_at, deleted_at
            "#,
        )
        .bind(new.original_name)
        .bind(new.stored_name)
        .bind(new.stored_path)
        .bind(new.size_label)
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await?;

        Ok(row.into())
    }

    /// All live records in insertion order.
    pub async fn list_live(&self) -> DropzoneResult<Vec<FileRecord>> {
        let rows = sqlx::query_as::<_, FileRow>(&format!(
            "{} WHERE deleted_at IS NULL ORDER BY id ASC",
            SELECT_COLUMNS
        ))
        .fetch_all(&*self.db)
        .await?;

        Ok(rows.into_iter().map(FileRecord::from).collect())
    }

    /// Look up a record by id regardless of lifecycle.
    pub async fn find_by_id(&self, id: i64) -> DropzoneResult<Option<FileRecord>> {
        let row = sqlx::query_as::<_, FileRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&*self.db)
            .await?;

        Ok(row.map(FileRecord::from))
    }

    /// Look up the live record owning a content path, if any.
    pub async fn find_live_by_stored_path(&self, path: &str) -> DropzoneResult<Option<FileRecord>> {
        let row = sqlx::query_as::<_, FileRow>(&format!(
            "{} WHERE stored_path = ? AND deleted_at IS NULL",
            SELECT_COLUMNS
        ))
        .bind(path)
        .fetch_optional(&*self.db)
        .await?;

        Ok(row.map(FileRecord::from))
    }

    /// Mark a live record deleted. Returns `false` if no live row matched.
    pub async fn soft_delete(&self, id: i64, at: DateTime<Utc>) -> DropzoneResult<bool> {
        let result = sqlx::query(
            "UPDATE images SET deleted_at = ?, updated_at = ?
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(at)
        .bind(at)
        .bind(id)
        .execute(&*self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Lightweight connectivity check used by the readiness endpoint.
    pub async fn ping(&self) -> DropzoneResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await?)
    }
}
