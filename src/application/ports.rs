//! Adapter traits for the external content systems the publish pipeline
//! talks to: the transient object store and the headless content lake.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::blocks::ContentBlock;
use crate::domain::types::SiteContext;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error("object not found at `{stored_path}`")]
    NotFound { stored_path: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Transient object storage holding writer uploads.
///
/// Binaries are always read through the store's server-side API, never by
/// fetching the public URL: the URL inside a draft is writer-controlled
/// input, and issuing outbound requests to it would hand the pipeline a
/// server-side request forgery primitive.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Map a public URL issued by this store back to its stored path.
    /// Returns `None` for URLs that do not belong to the store.
    fn resolve_public_url(&self, url: &str) -> Option<String>;

    /// Public URL for previewing a stored object.
    fn public_url(&self, stored_path: &str) -> String;

    /// Server-side read of a stored object.
    async fn fetch(&self, stored_path: &str) -> Result<Bytes, ObjectStoreError>;
}

#[derive(Debug, Error)]
pub enum ContentLakeError {
    #[error("content lake request failed with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("content lake transport failure")]
    Transport {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("content lake returned a malformed response: {message}")]
    Malformed { message: String },
}

impl ContentLakeError {
    pub fn transport(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport {
            source: Box::new(source),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// Featured image of a lake document, already rehomed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LakeImage {
    pub asset_id: String,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub attribution: Option<String>,
}

/// The target document written to the content lake by a publish run. All
/// asset references inside `body` are stable by the time this is built.
#[derive(Debug, Clone, PartialEq)]
pub struct LakeArticle {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub is_breaking: bool,
    pub site_context: SiteContext,
    pub author_ref: String,
    pub category_ref: String,
    pub featured_image: Option<LakeImage>,
    pub body: Vec<ContentBlock>,
    pub published_at: OffsetDateTime,
}

/// Headless content platform: binary asset uploads and document creation.
#[async_trait]
pub trait ContentLake: Send + Sync {
    /// Upload a binary image asset, returning its stable asset id.
    async fn upload_image(
        &self,
        filename: &str,
        payload: Bytes,
    ) -> Result<String, ContentLakeError>;

    /// Create the article document as a single create operation, returning
    /// the new document id.
    async fn create_article(&self, article: &LakeArticle) -> Result<String, ContentLakeError>;
}
