//! HTTP handlers for the upload page, uploads, lookups and deletes.
//! Upload bodies are streamed straight into the content store; storage and
//! bookkeeping concerns live in `DropzoneService`.

use crate::{
    errors::AppError,
    handlers::page::render_index,
    models::file_record::FileView,
    services::dropzone_service::{DropzoneError, DropzoneService},
};
use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::Html,
};
use futures::TryStreamExt;
use serde::Serialize;
use std::io;
use tracing::debug;

/// Name of the multipart field carrying the payload.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub id: i64,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub success: bool,
    pub files: Vec<FileView>,
}

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub success: bool,
    pub file: FileView,
}

/// GET `/dropzone` — upload page listing live files.
pub async fn index(State(service): State<DropzoneService>) -> Result<Html<String>, AppError> {
    let views = live_views(&service).await?;
    Ok(Html(render_index(&views, service.max_upload_bytes)))
}

/// GET `/dropzone/files` — live files as JSON.
pub async fn list_files(
    State(service): State<DropzoneService>,
) -> Result<Json<FileListResponse>, AppError> {
    let files = live_views(&service).await?;
    Ok(Json(FileListResponse {
        success: true,
        files,
    }))
}

/// POST `/dropzone/store` — accept one file from the `file` field.
///
/// Fields other than `file` are skipped, as are `file` parts without a
/// filename (an empty file input). Only the first file is stored.
pub async fn upload_file(
    State(service): State<DropzoneService>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, service.max_upload_bytes))?
    {
        if field.name() != Some(FILE_FIELD) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        let original_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                debug!("Ignoring `file` field without a filename");
                continue;
            }
        };

        let stream = field.map_err(|e| {
            let kind = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                io::ErrorKind::FileTooLarge
            } else {
                io::ErrorKind::Other
            };
            io::Error::new(kind, e)
        });
        let uploaded = service.upload(&original_name, stream).await?;

        return Ok(Json(UploadResponse {
            success: true,
            id: uploaded.record.id,
            url: uploaded.url,
        }));
    }

    Err(DropzoneError::MissingFile.into())
}

/// GET `/dropzone/{id}` — fetch one record, including soft-deleted ones.
pub async fn get_file(
    State(service): State<DropzoneService>,
    Path(id): Path<i64>,
) -> Result<Json<FileResponse>, AppError> {
    let record = service.get(id).await?;
    let file = FileView::new(&record, service.url_for(&record));
    Ok(Json(FileResponse {
        success: true,
        file,
    }))
}

/// DELETE `/dropzone/{id}` — soft-delete the record and remove its content.
pub async fn delete_file(
    State(service): State<DropzoneService>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    service.delete(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Body-limit and field-size rejections surface as 413, the rest as 400.
fn multipart_error(err: MultipartError, limit: u64) -> DropzoneError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DropzoneError::PayloadTooLarge { limit }
    } else {
        DropzoneError::Multipart(err.body_text())
    }
}

async fn live_views(service: &DropzoneService) -> Result<Vec<FileView>, AppError> {
    let records = service.list().await?;
    Ok(records
        .iter()
        .map(|record| FileView::new(record, service.url_for(record)))
        .collect())
}
