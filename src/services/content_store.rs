//! src/services/content_store.rs
//!
//! ContentStore — flat-file blob storage for uploaded payloads. Objects live
//! at `base_path/{path}` where `path` is a relative key such as
//! `uploads/<stored_name>`. Public URLs resolve through `GET /storage/{*path}`.

use crate::services::dropzone_service::{DropzoneError, DropzoneResult};
use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

/// Subdirectory of the content store that holds uploaded files.
pub const UPLOAD_DIR: &str = "uploads";

/// Route prefix under which stored content is served.
pub const PUBLIC_PREFIX: &str = "storage";

/// Extensions previewed as images on the upload page.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

const MAX_PATH_LEN: usize = 1024;

/// Lowercased extension of a store path or file name.
pub fn extension_of(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Whether content may be rendered inline by browsers. Everything else is
/// served as an attachment.
pub fn serves_inline(path: &str) -> bool {
    match extension_of(path) {
        Some(ext) => IMAGE_EXTENSIONS.contains(&ext.as_str()) || ext == "pdf",
        None => false,
    }
}

/// Result of a successful write.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Path relative to the store root.
    pub path: String,
    pub size_bytes: u64,
}

#[derive(Clone, Debug)]
pub struct ContentStore {
    /// Base directory on disk where payloads are stored.
    base_path: PathBuf,

    /// Externally visible origin, e.g. `http://localhost:3000`.
    public_base_url: String,
}

impl ContentStore {
    pub fn new(base_path: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Publicly resolvable URL for a stored path.
    pub fn public_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, PUBLIC_PREFIX, path)
    }

    /// Map a relative store path onto the filesystem after validating it.
    fn resolve(&self, path: &str) -> DropzoneResult<PathBuf> {
        ensure_path_safe(path)?;
        Ok(self.base_path.join(path))
    }

    /// Stream a payload into `uploads/{name}`.
    ///
    /// Bytes go to a temporary sibling file first, are fsynced, and then
    /// renamed into place. Payloads larger than `limit` bytes are rejected
    /// with `PayloadTooLarge` and leave nothing behind.
    pub async fn put_stream<S>(
        &self,
        name: &str,
        stream: S,
        limit: u64,
    ) -> DropzoneResult<StoredObject>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        let path = format!("{}/{}", UPLOAD_DIR, name);
        let file_path = self.resolve(&path)?;
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            DropzoneError::Io(io::Error::other("content path missing parent directory"))
        })?;
        fs::create_dir_all(&parent).await?;

        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let file = File::create(&tmp_path).await?;

        let size_bytes = match write_limited(file, stream, limit).await {
            Ok(size) => size,
            Err(err) => {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(err);
            }
        };

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(DropzoneError::Io(err));
        }

        debug!("stored {} ({} bytes)", file_path.display(), size_bytes);
        Ok(StoredObject { path, size_bytes })
    }

    /// Remove a stored object. Returns `false` when it was already gone.
    pub async fn delete(&self, path: &str) -> DropzoneResult<bool> {
        let file_path = self.resolve(path)?;
        match fs::remove_file(&file_path).await {
            Ok(_) => {
                debug!("removed physical file {}", file_path.display());
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("file {} already missing", file_path.display());
                Ok(false)
            }
            Err(err) => Err(DropzoneError::Io(err)),
        }
    }

    /// Open a stored object for reading, returning the handle and its length.
    pub async fn open(&self, path: &str) -> DropzoneResult<(File, u64)> {
        let file_path = self.resolve(path)?;
        let file = File::open(&file_path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                DropzoneError::ContentNotFound(path.to_string())
            } else {
                DropzoneError::Io(err)
            }
        })?;
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(DropzoneError::ContentNotFound(path.to_string()));
        }
        Ok((file, meta.len()))
    }
}

async fn write_limited<S>(mut file: File, stream: S, limit: u64) -> DropzoneResult<u64>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    let mut size_bytes: u64 = 0;
    pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| match err.kind() {
            ErrorKind::FileTooLarge => DropzoneError::PayloadTooLarge { limit },
            _ => DropzoneError::Io(err),
        })?;
        size_bytes += chunk.len() as u64;
        if size_bytes > limit {
            return Err(DropzoneError::PayloadTooLarge { limit });
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(size_bytes)
}

/// Reject paths that could escape the store root.
///
/// Empty, absolute, `..`-bearing, backslash and control-character paths are
/// refused.
pub fn ensure_path_safe(path: &str) -> DropzoneResult<()> {
    if path.is_empty() || path.len() > MAX_PATH_LEN {
        return Err(DropzoneError::InvalidPath);
    }
    if path.starts_with('/') || path.contains("..") {
        return Err(DropzoneError::InvalidPath);
    }
    if path
        .bytes()
        .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
    {
        return Err(DropzoneError::InvalidPath);
    }
    Ok(())
}
