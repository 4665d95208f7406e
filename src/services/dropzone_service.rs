//! src/services/dropzone_service.rs
//!
//! DropzoneService — upload, listing and deletion of files. Payloads go to
//! the [`ContentStore`], metadata to the [`MetadataStore`]. The two stores are
//! not covered by one transaction, so each write path orders its steps:
//!
//! - upload writes content first and inserts metadata second; a failed insert
//!   removes the freshly written content.
//! - delete soft-deletes metadata first and removes content second; content
//!   that is already gone counts as removed.
//!
//! Either way a crash can only leave an unreferenced file behind, never a live
//! record without content.

use crate::{
    models::file_record::FileRecord,
    services::{
        content_store::{ContentStore, ensure_path_safe},
        metadata_store::{MetadataStore, NewFileRecord},
    },
};
use bytes::Bytes;
use chrono::Utc;
use futures::Stream;
use std::{io, path::Path};
use thiserror::Error;
use tokio::fs::File;
use tracing::{info, warn};
use uuid::Uuid;

const MAX_EXTENSION_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum DropzoneError {
    #[error("no file was uploaded")]
    MissingFile,
    #[error("file `{0}` not found")]
    NotFound(i64),
    #[error("content `{0}` not found")]
    ContentNotFound(String),
    #[error("invalid content path")]
    InvalidPath,
    #[error("file exceeds the upload limit of {limit} bytes")]
    PayloadTooLarge { limit: u64 },
    #[error("malformed multipart request: {0}")]
    Multipart(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type DropzoneResult<T> = Result<T, DropzoneError>;

/// Outcome of a successful upload.
#[derive(Debug)]
pub struct Uploaded {
    pub record: FileRecord,
    pub url: String,
}

#[derive(Clone)]
pub struct DropzoneService {
    pub metadata: MetadataStore,
    pub content: ContentStore,

    /// Largest accepted payload in bytes.
    pub max_upload_bytes: u64,
}

impl DropzoneService {
    pub fn new(metadata: MetadataStore, content: ContentStore, max_upload_bytes: u64) -> Self {
        Self {
            metadata,
            content,
            max_upload_bytes,
        }
    }

    /// Public URL for a record's content.
    pub fn url_for(&self, record: &FileRecord) -> String {
        self.content.public_url(&record.stored_path)
    }

    /// Store one uploaded file and record its metadata.
    pub async fn upload<S>(&self, original_name: &str, stream: S) -> DropzoneResult<Uploaded>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        let stored_name = stored_name_for(original_name, Uuid::new_v4());
        let stored = self
            .content
            .put_stream(&stored_name, stream, self.max_upload_bytes)
            .await?;

        let label = size_label(stored.size_bytes);
        let insert = self
            .metadata
            .insert(&NewFileRecord {
                original_name,
                stored_name: &stored_name,
                stored_path: &stored.path,
                size_label: &label,
            })
            .await;

        let record = match insert {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    "metadata insert failed for {}, removing stored content: {}",
                    stored.path, err
                );
                if let Err(cleanup) = self.content.delete(&stored.path).await {
                    warn!("could not remove orphaned content {}: {}", stored.path, cleanup);
                }
                return Err(err);
            }
        };

        info!(
            id = record.id,
            path = %record.stored_path,
            size = %record.size_label,
            "file uploaded"
        );
        let url = self.url_for(&record);
        Ok(Uploaded { record, url })
    }

    /// All live records.
    pub async fn list(&self) -> DropzoneResult<Vec<FileRecord>> {
        self.metadata.list_live().await
    }

    /// Fetch a record by id, live or deleted.
    pub async fn get(&self, id: i64) -> DropzoneResult<FileRecord> {
        self.metadata
            .find_by_id(id)
            .await?
            .ok_or(DropzoneError::NotFound(id))
    }

    /// Open the content behind a live record for streaming.
    ///
    /// Content is only served while its record is live, so files left behind
    /// by a failed removal or an interrupted upload stay private.
    pub async fn open_content(&self, path: &str) -> DropzoneResult<(File, u64)> {
        ensure_path_safe(path)?;
        if self.metadata.find_live_by_stored_path(path).await?.is_none() {
            return Err(DropzoneError::ContentNotFound(path.to_string()));
        }
        self.content.open(path).await
    }

    /// Soft-delete a record and remove its content.
    ///
    /// Deleting an unknown or already deleted id yields `NotFound`.
    pub async fn delete(&self, id: i64) -> DropzoneResult<FileRecord> {
        let record = self.get(id).await?;
        if !record.lifecycle.is_live() {
            return Err(DropzoneError::NotFound(id));
        }

        if !self.metadata.soft_delete(id, Utc::now()).await? {
            // lost a race with a concurrent delete
            return Err(DropzoneError::NotFound(id));
        }

        match self.content.delete(&record.stored_path).await {
            Ok(true) => {}
            Ok(false) => warn!(id, path = %record.stored_path, "content was already missing"),
            Err(err) => warn!(
                id,
                path = %record.stored_path,
                "record deleted but content removal failed: {}",
                err
            ),
        }

        info!(id, path = %record.stored_path, "file deleted");
        self.get(id).await
    }
}

/// Render a byte count as rounded kilobytes, e.g. `2097152 -> "2048 KB"`.
pub fn size_label(bytes: u64) -> String {
    format!("{} KB", (bytes as f64 / 1024.0).round() as u64)
}

/// Content-store key for an upload: the UUID plus the client's extension
/// when it is short and alphanumeric.
pub fn stored_name_for(original_name: &str, id: Uuid) -> String {
    match sanitized_extension(original_name) {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

fn sanitized_extension(original_name: &str) -> Option<String> {
    let ext = Path::new(original_name).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
