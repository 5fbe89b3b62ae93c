//! Asset rehoming: migrate a binary from the transient object store into
//! the content lake's permanent asset store.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::application::ports::{ContentLake, ContentLakeError, ObjectStore, ObjectStoreError};

#[derive(Debug, Error)]
pub enum RehomeError {
    #[error("transient url `{url}` does not belong to the object store")]
    ForeignUrl { url: String },
    #[error("failed to read transient asset `{stored_path}`")]
    Download {
        stored_path: String,
        #[source]
        source: ObjectStoreError,
    },
    #[error("failed to upload asset to the content lake")]
    Upload {
        #[source]
        source: ContentLakeError,
    },
}

/// Moves one binary at a time; never deletes or mutates the source object,
/// so a failed publish leaves the transient store exactly as it was.
#[derive(Clone)]
pub struct AssetRehomer {
    store: Arc<dyn ObjectStore>,
    lake: Arc<dyn ContentLake>,
}

impl AssetRehomer {
    pub fn new(store: Arc<dyn ObjectStore>, lake: Arc<dyn ContentLake>) -> Self {
        Self { store, lake }
    }

    /// Rehome the asset behind a public object-store URL.
    pub async fn rehome(&self, pending_url: &str) -> Result<String, RehomeError> {
        let stored_path =
            self.store
                .resolve_public_url(pending_url)
                .ok_or_else(|| RehomeError::ForeignUrl {
                    url: pending_url.to_string(),
                })?;
        self.rehome_path(&stored_path).await
    }

    /// Rehome an asset addressed directly by its stored path.
    pub async fn rehome_path(&self, stored_path: &str) -> Result<String, RehomeError> {
        let payload =
            self.store
                .fetch(stored_path)
                .await
                .map_err(|source| RehomeError::Download {
                    stored_path: stored_path.to_string(),
                    source,
                })?;

        let filename = stored_path.rsplit('/').next().unwrap_or(stored_path);
        let asset_id = self
            .lake
            .upload_image(filename, payload)
            .await
            .map_err(|source| RehomeError::Upload { source })?;

        debug!(
            target = "application::rehome",
            stored_path, asset_id, "asset rehomed"
        );

        Ok(asset_id)
    }
}
