use crate::services::dropzone_service::DropzoneError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// HTTP-facing error. Renders as `{"success": false, "error": ...}`.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), "{}", self.message);
        }

        let body = Json(json!({
            "success": false,
            "error": self.message,
        }));

        (self.status, body).into_response()
    }
}

impl From<DropzoneError> for AppError {
    fn from(err: DropzoneError) -> Self {
        match err {
            DropzoneError::MissingFile
            | DropzoneError::InvalidPath
            | DropzoneError::Multipart(_) => AppError::bad_request(err.to_string()),
            DropzoneError::NotFound(_) | DropzoneError::ContentNotFound(_) => {
                AppError::not_found(err.to_string())
            }
            DropzoneError::PayloadTooLarge { .. } => {
                AppError::new(StatusCode::PAYLOAD_TOO_LARGE, err.to_string())
            }
            DropzoneError::Sqlx(_) | DropzoneError::Io(_) => AppError::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropzone_errors_map_to_statuses() {
        let cases = [
            (DropzoneError::MissingFile, StatusCode::BAD_REQUEST),
            (DropzoneError::InvalidPath, StatusCode::BAD_REQUEST),
            (DropzoneError::NotFound(3), StatusCode::NOT_FOUND),
            (
                DropzoneError::ContentNotFound("uploads/x".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                DropzoneError::PayloadTooLarge { limit: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                DropzoneError::Io(std::io::Error::other("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status, status);
        }
    }

    #[test]
    fn not_found_message_names_the_id() {
        let err = AppError::from(DropzoneError::NotFound(42));
        assert_eq!(err.to_string(), "file `42` not found");
    }
}
