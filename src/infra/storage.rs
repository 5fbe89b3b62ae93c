//! Filesystem-backed transient object storage.
//!
//! Holds writer uploads (featured images, editor-inserted images) at
//! writer-scoped stored paths until a publish rehomes them into the
//! content lake. Issues public preview URLs and resolves them back to
//! stored paths; binaries are read server-side, never over HTTP.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, pin_mut, stream};
use sha2::{Digest, Sha256};
use slug::slugify;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use url::Url;
use uuid::Uuid;

use crate::application::ports::{ObjectStore, ObjectStoreError};

/// Errors that can occur while writing to the object store.
#[derive(Debug, Error)]
pub enum StorageWriteError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error("uploaded file size exceeds supported range")]
    SizeOverflow,
}

/// Result of storing an upload payload.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub stored_path: String,
    pub checksum: String,
    pub size_bytes: i64,
}

#[derive(Debug)]
pub struct FsObjectStore {
    root: PathBuf,
    /// Base of issued public URLs, without trailing slash.
    public_base: String,
}

impl FsObjectStore {
    /// Initialise storage rooted at the provided directory, creating it if
    /// necessary. `public_base` must be an absolute URL.
    pub fn new(root: PathBuf, public_base: &str) -> Result<Self, StorageWriteError> {
        std::fs::create_dir_all(&root)?;
        let parsed = Url::parse(public_base).map_err(|_| StorageWriteError::InvalidPath)?;
        let public_base = parsed.as_str().trim_end_matches('/').to_string();
        Ok(Self { root, public_base })
    }

    /// Store the provided payload under a writer-scoped path and return
    /// metadata describing the stored object.
    pub async fn store(
        &self,
        owner_id: Uuid,
        original_name: &str,
        data: Bytes,
    ) -> Result<StoredObject, StorageWriteError> {
        let payload = stream::once(async move { Ok::<_, StorageWriteError>(data) });
        self.store_stream(owner_id, original_name, payload).await
    }

    /// Store a payload streamed to disk to avoid buffering large files.
    pub async fn store_stream<S>(
        &self,
        owner_id: Uuid,
        original_name: &str,
        payload: S,
    ) -> Result<StoredObject, StorageWriteError>
    where
        S: futures::Stream<Item = Result<Bytes, StorageWriteError>>,
    {
        let stored_path = self.build_stored_path(owner_id, original_name);
        let absolute = self
            .resolve(&stored_path)
            .map_err(|_| StorageWriteError::InvalidPath)?;

        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        let mut hasher = Sha256::new();
        let mut total_bytes: u64 = 0;
        let mut saw_payload = false;

        pin_mut!(payload);
        while let Some(chunk_result) = payload.next().await {
            let chunk = match chunk_result {
                Ok(chunk) => chunk,
                Err(err) => {
                    drop(file);
                    let _ = fs::remove_file(&absolute).await;
                    return Err(err);
                }
            };

            if chunk.is_empty() {
                continue;
            }

            saw_payload = true;
            total_bytes = total_bytes
                .checked_add(chunk.len() as u64)
                .ok_or(StorageWriteError::SizeOverflow)?;
            file.write_all(&chunk).await?;
            hasher.update(&chunk);
        }

        file.flush().await?;

        if !saw_payload {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(StorageWriteError::EmptyPayload);
        }

        let checksum = hex::encode(hasher.finalize());
        let size_bytes =
            i64::try_from(total_bytes).map_err(|_| StorageWriteError::SizeOverflow)?;

        Ok(StoredObject {
            stored_path,
            checksum,
            size_bytes,
        })
    }

    /// Resolve the absolute filesystem path for a stored object, rejecting
    /// absolute and parent-traversing inputs.
    fn resolve(&self, stored_path: &str) -> Result<PathBuf, ObjectStoreError> {
        let relative = Path::new(stored_path);
        if stored_path.is_empty()
            || relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(ObjectStoreError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }

    fn build_stored_path(&self, owner_id: Uuid, original_name: &str) -> String {
        let identifier = Uuid::new_v4();
        let filename = sanitize_filename(original_name);
        format!("{owner_id}/{identifier}-{filename}")
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    fn resolve_public_url(&self, url: &str) -> Option<String> {
        let rest = url.strip_prefix(&self.public_base)?;
        let rest = rest.strip_prefix('/')?;
        if rest.is_empty() || self.resolve(rest).is_err() {
            return None;
        }
        Some(rest.to_string())
    }

    fn public_url(&self, stored_path: &str) -> String {
        format!("{}/{stored_path}", self.public_base)
    }

    async fn fetch(&self, stored_path: &str) -> Result<Bytes, ObjectStoreError> {
        let absolute = self.resolve(stored_path)?;
        match fs::read(absolute).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ObjectStoreError::NotFound {
                    stored_path: stored_path.to_string(),
                })
            }
            Err(err) => Err(ObjectStoreError::Io(err)),
        }
    }
}

fn sanitize_filename(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("upload");
    let mut base = slugify(stem);
    if base.is_empty() {
        base = "upload".to_string();
    }

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.trim_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty());

    match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}
