//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::content::ContentNode;
use crate::domain::entities::{
    ArticleRecord, AuditLogRecord, EditorOverrides, FeaturedImage, WriterProfileRecord,
};
use crate::domain::types::{ArticleStatus, SiteContext};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Writer-editable portion of an article row. Tag writes replace the full
/// association set for the article in the same transaction.
#[derive(Debug, Clone)]
pub struct DraftFields {
    pub title: String,
    pub excerpt: String,
    pub category_slug: String,
    pub tags: Vec<String>,
    pub body: Vec<ContentNode>,
    pub featured_image: Option<FeaturedImage>,
    pub image_alt: Option<String>,
    pub image_caption: Option<String>,
    pub image_source: Option<String>,
    pub is_breaking: bool,
    pub site_context: SiteContext,
}

#[derive(Debug, Clone)]
pub struct CreateArticleParams {
    pub owner_id: Uuid,
    pub fields: DraftFields,
}

#[derive(Debug, Clone)]
pub struct UpdateDraftParams {
    pub id: Uuid,
    pub fields: DraftFields,
}

/// Status change plus the review metadata the transition carries.
#[derive(Debug, Clone)]
pub struct UpdateStatusParams {
    pub id: Uuid,
    pub status: ArticleStatus,
    /// Feedback note; `Some` on rejection, `None` clears nothing.
    pub editor_notes: Option<String>,
    /// `Some(overrides)` stores them, `Some(default)` on rejection clears
    /// them, `None` leaves the stored value untouched.
    pub overrides: Option<EditorOverrides>,
}

#[async_trait]
pub trait ArticlesRepo: Send + Sync {
    async fn article_by_id(&self, id: Uuid) -> Result<ArticleRecord, RepoError>;

    async fn articles_by_owner(&self, owner_id: Uuid) -> Result<Vec<ArticleRecord>, RepoError>;

    /// Articles awaiting editorial review, oldest first.
    async fn review_queue(&self) -> Result<Vec<ArticleRecord>, RepoError>;

    async fn create_article(&self, params: CreateArticleParams) -> Result<ArticleRecord, RepoError>;

    async fn update_draft(&self, params: UpdateDraftParams) -> Result<ArticleRecord, RepoError>;

    async fn update_status(&self, params: UpdateStatusParams) -> Result<ArticleRecord, RepoError>;

    /// Record the outcome of a successful publish: terminal status, the
    /// lake document id, and the publish timestamp.
    async fn mark_published(
        &self,
        id: Uuid,
        lake_document_id: &str,
        published_at: OffsetDateTime,
    ) -> Result<(), RepoError>;
}

#[async_trait]
pub trait WritersRepo: Send + Sync {
    async fn writer_profile(&self, id: Uuid) -> Result<WriterProfileRecord, RepoError>;
}

#[async_trait]
pub trait AuditRepo: Send + Sync {
    async fn append_log(&self, record: AuditLogRecord) -> Result<(), RepoError>;
}

/// Held for the duration of one publish run; releasing it reopens the
/// article for the next publish attempt.
#[async_trait]
pub trait PublishLease: Send {
    async fn release(self: Box<Self>);
}

/// Per-article mutual exclusion around the publish orchestrator, so two
/// editors cannot double-publish one draft into two lake documents.
#[async_trait]
pub trait PublishLocks: Send + Sync {
    /// `Ok(None)` means another publish of this article is in flight.
    async fn try_lock(&self, article_id: Uuid)
    -> Result<Option<Box<dyn PublishLease>>, RepoError>;
}
