//! In-memory fakes for the repository and adapter traits, plus fixtures.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use newsdesk::application::ports::{
    ContentLake, ContentLakeError, LakeArticle, ObjectStore, ObjectStoreError,
};
use newsdesk::application::repos::{
    ArticlesRepo, AuditRepo, CreateArticleParams, DraftFields, PublishLease, PublishLocks,
    RepoError, UpdateDraftParams, UpdateStatusParams, WritersRepo,
};
use newsdesk::domain::content::ContentNode;
use newsdesk::domain::entities::{ArticleRecord, AuditLogRecord, FeaturedImage, WriterProfileRecord};
use newsdesk::domain::types::{Actor, ActorRole, ArticleStatus, SiteContext};

pub fn writer() -> Actor {
    Actor {
        id: Uuid::new_v4(),
        role: ActorRole::Writer,
    }
}

pub fn editor() -> Actor {
    Actor {
        id: Uuid::new_v4(),
        role: ActorRole::Editor,
    }
}

pub fn draft_fields() -> DraftFields {
    DraftFields {
        title: "Budget Talks Collapse".to_string(),
        excerpt: "Negotiations broke down overnight.".to_string(),
        category_slug: "politics".to_string(),
        tags: vec!["budget".to_string()],
        body: vec![ContentNode::Paragraph {
            content: vec![ContentNode::Text {
                text: "Talks ended without a deal.".to_string(),
                marks: vec![],
            }],
        }],
        featured_image: Some(FeaturedImage::Stable {
            url: "https://cdn.test/uploads/owner/cover.jpg".to_string(),
        }),
        image_alt: Some("Empty negotiating table".to_string()),
        image_caption: None,
        image_source: None,
        is_breaking: false,
        site_context: SiteContext::Main,
    }
}

pub fn article(owner_id: Uuid, status: ArticleStatus) -> ArticleRecord {
    let fields = draft_fields();
    let now = OffsetDateTime::now_utc();
    ArticleRecord {
        id: Uuid::new_v4(),
        owner_id,
        title: fields.title,
        excerpt: fields.excerpt,
        category_slug: fields.category_slug,
        tags: fields.tags,
        body: fields.body,
        featured_image: fields.featured_image,
        image_alt: fields.image_alt,
        image_caption: fields.image_caption,
        image_source: fields.image_source,
        is_breaking: fields.is_breaking,
        site_context: fields.site_context,
        status,
        editor_notes: None,
        overrides: None,
        lake_document_id: None,
        published_at: None,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
pub struct MemoryArticlesRepo {
    pub articles: Mutex<HashMap<Uuid, ArticleRecord>>,
    pub fail_mark_published: AtomicBool,
}

impl MemoryArticlesRepo {
    pub async fn insert(&self, record: ArticleRecord) {
        self.articles.lock().await.insert(record.id, record);
    }

    pub async fn get(&self, id: Uuid) -> Option<ArticleRecord> {
        self.articles.lock().await.get(&id).cloned()
    }
}

#[async_trait]
impl ArticlesRepo for MemoryArticlesRepo {
    async fn article_by_id(&self, id: Uuid) -> Result<ArticleRecord, RepoError> {
        self.get(id).await.ok_or(RepoError::NotFound)
    }

    async fn articles_by_owner(&self, owner_id: Uuid) -> Result<Vec<ArticleRecord>, RepoError> {
        let mut owned: Vec<ArticleRecord> = self
            .articles
            .lock()
            .await
            .values()
            .filter(|record| record.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(owned)
    }

    async fn review_queue(&self) -> Result<Vec<ArticleRecord>, RepoError> {
        let mut pending: Vec<ArticleRecord> = self
            .articles
            .lock()
            .await
            .values()
            .filter(|record| record.status == ArticleStatus::PendingReview)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        Ok(pending)
    }

    async fn create_article(
        &self,
        params: CreateArticleParams,
    ) -> Result<ArticleRecord, RepoError> {
        let mut record = article(params.owner_id, ArticleStatus::Draft);
        apply_fields(&mut record, params.fields);
        self.insert(record.clone()).await;
        Ok(record)
    }

    async fn update_draft(&self, params: UpdateDraftParams) -> Result<ArticleRecord, RepoError> {
        let mut articles = self.articles.lock().await;
        let record = articles.get_mut(&params.id).ok_or(RepoError::NotFound)?;
        apply_fields(record, params.fields);
        record.updated_at = OffsetDateTime::now_utc();
        Ok(record.clone())
    }

    async fn update_status(&self, params: UpdateStatusParams) -> Result<ArticleRecord, RepoError> {
        let mut articles = self.articles.lock().await;
        let record = articles.get_mut(&params.id).ok_or(RepoError::NotFound)?;
        record.status = params.status;
        if let Some(note) = params.editor_notes {
            record.editor_notes = Some(note);
        }
        if let Some(overrides) = params.overrides {
            record.overrides = if overrides.is_empty() {
                None
            } else {
                Some(overrides)
            };
        }
        record.updated_at = OffsetDateTime::now_utc();
        Ok(record.clone())
    }

    async fn mark_published(
        &self,
        id: Uuid,
        lake_document_id: &str,
        published_at: OffsetDateTime,
    ) -> Result<(), RepoError> {
        if self.fail_mark_published.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        let mut articles = self.articles.lock().await;
        let record = articles.get_mut(&id).ok_or(RepoError::NotFound)?;
        record.status = ArticleStatus::Published;
        record.lake_document_id = Some(lake_document_id.to_string());
        record.published_at = Some(published_at);
        Ok(())
    }
}

fn apply_fields(record: &mut ArticleRecord, fields: DraftFields) {
    record.title = fields.title;
    record.excerpt = fields.excerpt;
    record.category_slug = fields.category_slug;
    record.tags = fields.tags;
    record.body = fields.body;
    record.featured_image = fields.featured_image;
    record.image_alt = fields.image_alt;
    record.image_caption = fields.image_caption;
    record.image_source = fields.image_source;
    record.is_breaking = fields.is_breaking;
    record.site_context = fields.site_context;
}

#[derive(Default)]
pub struct MemoryWritersRepo {
    pub profiles: Mutex<HashMap<Uuid, WriterProfileRecord>>,
}

impl MemoryWritersRepo {
    pub async fn insert_profile(&self, id: Uuid, lake_author_ref: &str) {
        self.profiles.lock().await.insert(
            id,
            WriterProfileRecord {
                id,
                display_name: "Test Writer".to_string(),
                lake_author_ref: lake_author_ref.to_string(),
            },
        );
    }
}

#[async_trait]
impl WritersRepo for MemoryWritersRepo {
    async fn writer_profile(&self, id: Uuid) -> Result<WriterProfileRecord, RepoError> {
        self.profiles
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }
}

#[derive(Default)]
pub struct RecordingAudit {
    pub entries: Mutex<Vec<AuditLogRecord>>,
}

impl RecordingAudit {
    pub async fn actions(&self) -> Vec<String> {
        self.entries
            .lock()
            .await
            .iter()
            .map(|entry| entry.action.clone())
            .collect()
    }
}

#[async_trait]
impl AuditRepo for RecordingAudit {
    async fn append_log(&self, record: AuditLogRecord) -> Result<(), RepoError> {
        self.entries.lock().await.push(record);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPublishLocks {
    held: Arc<std::sync::Mutex<HashSet<Uuid>>>,
}

impl MemoryPublishLocks {
    /// Simulate a publish already in flight for the given article.
    pub fn hold(&self, article_id: Uuid) {
        self.held
            .lock()
            .expect("lock set poisoned")
            .insert(article_id);
    }
}

struct MemoryLease {
    held: Arc<std::sync::Mutex<HashSet<Uuid>>>,
    article_id: Uuid,
}

// Released on drop, like the real lease: a lease that goes away for any
// reason must never leave its article locked.
impl Drop for MemoryLease {
    fn drop(&mut self) {
        self.held
            .lock()
            .expect("lock set poisoned")
            .remove(&self.article_id);
    }
}

#[async_trait]
impl PublishLease for MemoryLease {
    async fn release(self: Box<Self>) {}
}

#[async_trait]
impl PublishLocks for MemoryPublishLocks {
    async fn try_lock(
        &self,
        article_id: Uuid,
    ) -> Result<Option<Box<dyn PublishLease>>, RepoError> {
        let mut held = self.held.lock().expect("lock set poisoned");
        if !held.insert(article_id) {
            return Ok(None);
        }
        Ok(Some(Box::new(MemoryLease {
            held: self.held.clone(),
            article_id,
        })))
    }
}

pub const STORE_BASE: &str = "https://cdn.test/uploads";

/// Object store fake addressed by stored path, issuing URLs under
/// [`STORE_BASE`].
#[derive(Default)]
pub struct MemoryObjectStore {
    pub objects: Mutex<HashMap<String, Bytes>>,
}

impl MemoryObjectStore {
    pub async fn put(&self, stored_path: &str, payload: &'static [u8]) {
        self.objects
            .lock()
            .await
            .insert(stored_path.to_string(), Bytes::from_static(payload));
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn resolve_public_url(&self, url: &str) -> Option<String> {
        let rest = url.strip_prefix(STORE_BASE)?.strip_prefix('/')?;
        (!rest.is_empty()).then(|| rest.to_string())
    }

    fn public_url(&self, stored_path: &str) -> String {
        format!("{STORE_BASE}/{stored_path}")
    }

    async fn fetch(&self, stored_path: &str) -> Result<Bytes, ObjectStoreError> {
        self.objects
            .lock()
            .await
            .get(stored_path)
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound {
                stored_path: stored_path.to_string(),
            })
    }
}

/// Content lake fake that records every write and can be told to fail.
#[derive(Default)]
pub struct RecordingLake {
    pub created: Mutex<Vec<LakeArticle>>,
    pub uploads: AtomicUsize,
    pub fail_create: AtomicBool,
}

impl RecordingLake {
    pub async fn created_documents(&self) -> Vec<LakeArticle> {
        self.created.lock().await.clone()
    }
}

#[async_trait]
impl ContentLake for RecordingLake {
    async fn upload_image(
        &self,
        filename: &str,
        _payload: Bytes,
    ) -> Result<String, ContentLakeError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("image-{filename}"))
    }

    async fn create_article(&self, article: &LakeArticle) -> Result<String, ContentLakeError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ContentLakeError::Rejected {
                status: 500,
                body: "write refused".to_string(),
            });
        }
        let mut created = self.created.lock().await;
        created.push(article.clone());
        Ok(format!("doc-{}", created.len()))
    }
}
