use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::DraftFields;
use crate::domain::content::ContentNode;
use crate::domain::entities::{ArticleRecord, EditorOverrides, FeaturedImage};
use crate::domain::types::{ArticleStatus, SiteContext};

fn default_site_context() -> SiteContext {
    SiteContext::Main
}

/// Writer-submitted draft fields; used for both create and full update.
#[derive(Debug, Deserialize, Serialize)]
pub struct DraftRequest {
    pub title: String,
    pub excerpt: String,
    pub category_slug: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub body: Vec<ContentNode>,
    pub featured_image: Option<FeaturedImage>,
    pub image_alt: Option<String>,
    pub image_caption: Option<String>,
    pub image_source: Option<String>,
    #[serde(default)]
    pub is_breaking: bool,
    #[serde(default = "default_site_context")]
    pub site_context: SiteContext,
}

impl DraftRequest {
    pub fn into_fields(self) -> DraftFields {
        DraftFields {
            title: self.title,
            excerpt: self.excerpt,
            category_slug: self.category_slug,
            tags: self.tags,
            body: self.body,
            featured_image: self.featured_image,
            image_alt: self.image_alt,
            image_caption: self.image_caption,
            image_source: self.image_source,
            is_breaking: self.is_breaking,
            site_context: self.site_context,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ReviewRequest {
    Approve {
        #[serde(default)]
        overrides: EditorOverrides,
    },
    Reject {
        note: String,
    },
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
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
    pub status: ArticleStatus,
    pub editor_notes: Option<String>,
    pub overrides: Option<EditorOverrides>,
    pub lake_document_id: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<ArticleRecord> for ArticleResponse {
    fn from(record: ArticleRecord) -> Self {
        Self {
            id: record.id,
            owner_id: record.owner_id,
            title: record.title,
            excerpt: record.excerpt,
            category_slug: record.category_slug,
            tags: record.tags,
            body: record.body,
            featured_image: record.featured_image,
            image_alt: record.image_alt,
            image_caption: record.image_caption,
            image_source: record.image_source,
            is_breaking: record.is_breaking,
            site_context: record.site_context,
            status: record.status,
            editor_notes: record.editor_notes,
            overrides: record.overrides,
            lake_document_id: record.lake_document_id,
            published_at: record.published_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishResponse {
    pub lake_document_id: String,
}
