//! Streams stored payloads back to clients so upload URLs resolve.
//!
//! Only images and PDFs render inline. Everything else is an attachment in a
//! sandbox, so an uploaded page or script never runs on this origin.

use crate::{
    errors::AppError,
    services::{content_store::serves_inline, dropzone_service::DropzoneService},
};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use tokio_util::io::ReaderStream;

/// GET `/storage/{*path}`
pub async fn get_content(
    State(service): State<DropzoneService>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let (file, len) = service.open_content(&path).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let content_type = mime_guess::from_path(&path)
        .first_raw()
        .unwrap_or("application/octet-stream");

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    if !serves_inline(&path) {
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment"),
        );
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("sandbox"),
        );
    }
    Ok(response)
}
