//! Defines routes for the upload page and file operations.
//!
//! ## Structure
//! - **Page & API**
//!   - `GET    /dropzone`        — upload page listing live files
//!   - `GET    /dropzone/files`  — live files as JSON
//!   - `POST   /dropzone/store`  — upload one file (multipart field `file`)
//!   - `GET    /dropzone/{id}`   — one record, including soft-deleted ones
//!   - `DELETE /dropzone/{id}`   — soft-delete record and remove content
//!
//! - **Content**
//!   - `GET    /storage/{*path}` — stream stored bytes
//!
//! Static segments (`files`, `store`) take precedence over `{id}`.

use crate::{
    handlers::{
        content_handlers::get_content,
        dropzone_handlers::{delete_file, get_file, index, list_files, upload_file},
        health_handlers::{healthz, readyz},
    },
    services::dropzone_service::DropzoneService,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build the router. Handlers share `DropzoneService` as state.
pub fn routes() -> Router<DropzoneService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/dropzone", get(index))
        .route("/dropzone/files", get(list_files))
        .route("/dropzone/store", post(upload_file))
        .route("/dropzone/{id}", get(get_file).delete(delete_file))
        .route("/storage/{*path}", get(get_content))
}
