//! Shared test utilities.
//! Note: #[allow(dead_code)] because each test file compiles common/ separately.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use dropzone::config::AppConfig;
use dropzone::services::dropzone_service::DropzoneService;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BASE_URL: &str = "http://files.test";
const BOUNDARY: &str = "----dropzone-test-boundary";

/// A router wired to temporary storage and a temporary SQLite database.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub service: DropzoneService,
    pub storage_dir: PathBuf,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_limit(5 * 1024 * 1024).await
    }

    pub async fn with_limit(max_upload_bytes: u64) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let storage_dir = temp_dir.path().join("storage");

        let cfg = AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            storage_dir: storage_dir.display().to_string(),
            database_url: format!("sqlite://{}", temp_dir.path().join("meta.db").display()),
            public_base_url: BASE_URL.into(),
            max_upload_bytes,
        };

        let service = dropzone::build_service(&cfg)
            .await
            .expect("Failed to build service");
        let router = dropzone::app(service.clone());

        Self {
            router,
            service,
            storage_dir,
            _temp_dir: temp_dir,
        }
    }

    /// Send a request and return status plus raw body bytes.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    /// Send a request and parse the body as JSON (`Null` when empty or not JSON).
    pub async fn json(&self, method: &str, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = self.send(request).await;
        (status, parse_json(&bytes))
    }

    /// POST a multipart upload to `/dropzone/store`.
    pub async fn upload(&self, parts: &[Part<'_>]) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/dropzone/store")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        let (status, bytes) = self.send(request).await;
        (status, parse_json(&bytes))
    }

    /// Upload a single file in the `file` field.
    pub async fn upload_file(&self, filename: &str, data: &[u8]) -> (StatusCode, Value) {
        self.upload(&[Part::File {
            name: "file",
            filename,
            data,
        }])
        .await
    }

    /// GET a public URL produced by an upload, routed through the app.
    pub async fn fetch_url(&self, url: &str) -> (StatusCode, Vec<u8>) {
        let path = url.strip_prefix(BASE_URL).expect("URL under test base");
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Live file ids from the JSON listing.
    pub async fn listed_ids(&self) -> Vec<i64> {
        let (status, body) = self.json("GET", "/dropzone/files").await;
        assert_eq!(status, StatusCode::OK);
        body["files"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["id"].as_i64().unwrap())
            .collect()
    }

    /// Number of entries in the uploads directory.
    pub fn stored_file_count(&self) -> usize {
        std::fs::read_dir(self.storage_dir.join("uploads"))
            .map(|d| d.count())
            .unwrap_or(0)
    }
}

#[allow(dead_code)]
pub enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                name,
                filename,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn parse_json(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
    }
}
