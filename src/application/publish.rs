//! The publish orchestrator: moves an approved article from the
//! operational store into the content lake.
//!
//! The two stores share no transaction. The pipeline is ordered so that
//! every failure before the lake write leaves no external side effect, and
//! the one failure mode after it (`PartialSync`) is surfaced distinctly so
//! callers never retry a publish that already created a lake document.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use slug::slugify;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::blocks::{AssetSource, ContentBlock};
use crate::application::ports::{ContentLake, ContentLakeError, LakeArticle, LakeImage};
use crate::application::rehome::{AssetRehomer, RehomeError};
use crate::application::repos::{ArticlesRepo, AuditRepo, PublishLocks, RepoError, WritersRepo};
use crate::application::transform::transform;
use crate::domain::entities::{ArticleRecord, AuditLogRecord, FeaturedImage};
use crate::domain::types::{Actor, ArticleStatus};

/// Operator-maintained mapping from operational category slugs to content
/// lake category references. A slug missing here is a configuration error,
/// never something the pipeline guesses around.
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    entries: HashMap<String, String>,
}

impl CategoryMap {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn resolve(&self, slug: &str) -> Option<&str> {
        self.entries.get(slug).map(String::as_str)
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("caller lacks editor permission")]
    Unauthorized,
    #[error("article not found")]
    NotFound,
    #[error("article is in status `{status}`; publishing requires `approved`")]
    NotApproved { status: &'static str },
    #[error("another publish of this article is already in flight")]
    AlreadyInFlight,
    #[error("featured image could not be rehomed")]
    FatalAsset {
        #[source]
        source: RehomeError,
    },
    #[error("category `{slug}` has no content-lake mapping")]
    UnmappedCategory { slug: String },
    #[error("content lake rejected the document write")]
    LakeWrite {
        #[source]
        source: ContentLakeError,
    },
    #[error(
        "document `{lake_document_id}` is live in the content lake but the \
         operational record was not updated; manual reconciliation required"
    )]
    PartialSync {
        lake_document_id: String,
        #[source]
        source: RepoError,
    },
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for PublishError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => PublishError::NotFound,
            other => PublishError::Repo(other),
        }
    }
}

/// Successful publish outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub lake_document_id: String,
}

#[derive(Clone)]
pub struct PublishService {
    articles: Arc<dyn ArticlesRepo>,
    writers: Arc<dyn WritersRepo>,
    audit: Arc<dyn AuditRepo>,
    locks: Arc<dyn PublishLocks>,
    lake: Arc<dyn ContentLake>,
    rehomer: AssetRehomer,
    categories: CategoryMap,
}

impl PublishService {
    pub fn new(
        articles: Arc<dyn ArticlesRepo>,
        writers: Arc<dyn WritersRepo>,
        audit: Arc<dyn AuditRepo>,
        locks: Arc<dyn PublishLocks>,
        lake: Arc<dyn ContentLake>,
        rehomer: AssetRehomer,
        categories: CategoryMap,
    ) -> Self {
        Self {
            articles,
            writers,
            audit,
            locks,
            lake,
            rehomer,
            categories,
        }
    }

    /// Run the full publish pipeline for one approved article.
    ///
    /// Steps are strictly sequential. The run must not be aborted once
    /// asset rehoming has started: external mutation has begun and only
    /// the orchestrator knows how far it got. The pipeline therefore runs
    /// on its own task; cancelling the caller (a disconnected HTTP client
    /// dropping the handler future) detaches the run instead of killing
    /// it mid-flight, and the lease is always released when it ends.
    pub async fn publish(
        &self,
        actor: Actor,
        article_id: Uuid,
    ) -> Result<PublishReceipt, PublishError> {
        if !actor.is_editor() {
            return Err(PublishError::Unauthorized);
        }

        let Some(lease) = self.locks.try_lock(article_id).await.map_err(PublishError::Repo)?
        else {
            return Err(PublishError::AlreadyInFlight);
        };

        let worker = {
            let service = self.clone();
            tokio::spawn(async move {
                let result = service.run(actor, article_id).await;
                lease.release().await;
                result
            })
        };

        match worker.await {
            Ok(result) => result,
            Err(join_error) => Err(PublishError::Repo(RepoError::from_persistence(format!(
                "publish task failed: {join_error}"
            )))),
        }
    }

    async fn run(&self, actor: Actor, article_id: Uuid) -> Result<PublishReceipt, PublishError> {
        let article = self.articles.article_by_id(article_id).await?;
        if article.status != ArticleStatus::Approved {
            return Err(PublishError::NotApproved {
                status: article.status.as_str(),
            });
        }

        let writer = self
            .writers
            .writer_profile(article.owner_id)
            .await
            .map_err(PublishError::Repo)?;

        let blocks = transform(&article.body);

        let featured_image = self.rehome_featured(&article).await?;
        let body = self.rehome_inline(article_id, blocks).await;

        let Some(category_ref) = self.categories.resolve(&article.category_slug) else {
            return Err(PublishError::UnmappedCategory {
                slug: article.category_slug.clone(),
            });
        };

        // Editor overrides outrank writer-submitted fields.
        let overrides = article.overrides.clone().unwrap_or_default();
        let title = overrides.meta_title.unwrap_or_else(|| article.title.clone());
        let published_at = OffsetDateTime::now_utc();

        let document = LakeArticle {
            slug: slugify(&title),
            title,
            excerpt: article.excerpt.clone(),
            tags: article.tags.clone(),
            is_breaking: overrides.is_breaking.unwrap_or(article.is_breaking),
            site_context: overrides.site_context.unwrap_or(article.site_context),
            author_ref: writer.lake_author_ref,
            category_ref: category_ref.to_string(),
            featured_image,
            body,
            published_at,
        };

        let lake_document_id = self
            .lake
            .create_article(&document)
            .await
            .map_err(|source| PublishError::LakeWrite { source })?;

        if let Err(source) = self
            .articles
            .mark_published(article_id, &lake_document_id, published_at)
            .await
        {
            counter!("newsdesk_publish_partial_sync_total").increment(1);
            error!(
                target = "application::publish",
                article_id = %article_id,
                lake_document_id,
                error = %source,
                "lake document created but operational store did not catch up"
            );
            return Err(PublishError::PartialSync {
                lake_document_id,
                source,
            });
        }

        self.record_audit(actor, article_id, &lake_document_id).await;
        counter!("newsdesk_publish_total").increment(1);
        info!(
            target = "application::publish",
            article_id = %article_id,
            lake_document_id,
            "article published"
        );

        Ok(PublishReceipt { lake_document_id })
    }

    /// Rehome the featured image, if any. Failure here is fatal: the publish
    /// aborts before any external write has happened.
    async fn rehome_featured(
        &self,
        article: &ArticleRecord,
    ) -> Result<Option<LakeImage>, PublishError> {
        let asset_id = match &article.featured_image {
            None => return Ok(None),
            Some(FeaturedImage::Stable { url }) => self.rehomer.rehome(url).await,
            Some(FeaturedImage::Pending { stored_path }) => {
                self.rehomer.rehome_path(stored_path).await
            }
        }
        .map_err(|source| PublishError::FatalAsset { source })?;

        Ok(Some(LakeImage {
            asset_id,
            alt: article.image_alt.clone(),
            caption: article.image_caption.clone(),
            attribution: article.image_source.clone(),
        }))
    }

    /// Rehome inline images one block at a time, in document order. A block
    /// whose asset cannot be rehomed is dropped from the document; the
    /// publish continues.
    async fn rehome_inline(
        &self,
        article_id: Uuid,
        blocks: Vec<ContentBlock>,
    ) -> Vec<ContentBlock> {
        let mut body = Vec::with_capacity(blocks.len());

        for block in blocks {
            let mut image = match block {
                ContentBlock::Image(image) => image,
                other => {
                    body.push(other);
                    continue;
                }
            };

            let AssetSource::Pending { url } = image.source.clone() else {
                body.push(ContentBlock::Image(image));
                continue;
            };

            match self.rehomer.rehome(&url).await {
                Ok(asset_id) => {
                    image.source = AssetSource::Stable { asset_id };
                    body.push(ContentBlock::Image(image));
                }
                Err(err) => {
                    counter!("newsdesk_publish_inline_asset_dropped_total").increment(1);
                    warn!(
                        target = "application::publish",
                        article_id = %article_id,
                        block_key = %image.key,
                        url = %url,
                        error = %err,
                        "inline image could not be rehomed; block dropped"
                    );
                }
            }
        }

        body
    }

    async fn record_audit(&self, actor: Actor, article_id: Uuid, lake_document_id: &str) {
        let record = AuditLogRecord {
            id: Uuid::new_v4(),
            actor: actor.id.to_string(),
            action: "article.publish".to_string(),
            entity_type: "article".to_string(),
            entity_id: Some(article_id.to_string()),
            payload_text: Some(lake_document_id.to_string()),
            created_at: OffsetDateTime::now_utc(),
        };

        if let Err(err) = self.audit.append_log(record).await {
            error!(
                target = "application::publish",
                error = %err,
                "failed to append audit log"
            );
        }
    }
}
