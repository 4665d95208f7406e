//! Drag & drop file upload service.
//!
//! Uploaded files are written to a flat content store on disk and tracked in
//! a SQLite `images` table with soft-delete semantics.

use anyhow::{Context, Result};
use axum::{Router, extract::DefaultBodyLimit};
use std::{path::Path, sync::Arc};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

use config::AppConfig;
use services::{
    content_store::ContentStore, dropzone_service::DropzoneService, metadata_store::MetadataStore,
};

/// Room for multipart boundaries and headers on top of the payload limit.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Prepare storage, connect and migrate the database, and build the service.
pub async fn build_service(cfg: &AppConfig) -> Result<DropzoneService> {
    if !Path::new(&cfg.storage_dir).exists() {
        tokio::fs::create_dir_all(&cfg.storage_dir)
            .await
            .with_context(|| format!("creating storage directory {}", cfg.storage_dir))?;
        tracing::info!("Created storage directory at {}", cfg.storage_dir);
    }

    let pool = db::connect(&cfg.database_url).await?;
    db::run_migrations(&pool).await?;

    Ok(DropzoneService::new(
        MetadataStore::new(Arc::new(pool)),
        ContentStore::new(&cfg.storage_dir, cfg.public_base_url.clone()),
        cfg.max_upload_bytes,
    ))
}

/// Router with state, body limit and request tracing applied.
pub fn app(service: DropzoneService) -> Router {
    let body_limit = service.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);
    routes::routes::routes()
        .layer(DefaultBodyLimit::max(
            usize::try_from(body_limit).unwrap_or(usize::MAX),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
