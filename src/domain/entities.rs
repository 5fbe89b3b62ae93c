//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{
    content::ContentNode,
    types::{ArticleStatus, SiteContext},
};

/// Maximum number of tags a draft may carry.
pub const MAX_TAGS: usize = 8;

/// A writer's working article in the operational store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleRecord {
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
    pub published_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// The featured image slot. A draft holds either a stable public URL in the
/// transient object store or a stored path still awaiting URL issuance,
/// never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeaturedImage {
    Stable { url: String },
    Pending { stored_path: String },
}

/// Editor-supplied metadata recorded on approval. Each populated field takes
/// precedence over the writer-submitted equivalent at publish time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EditorOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_breaking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_context: Option<SiteContext>,
}

impl EditorOverrides {
    pub fn is_empty(&self) -> bool {
        self.meta_title.is_none() && self.is_breaking.is_none() && self.site_context.is_none()
    }
}

/// Writer profile row joined from the operational store, carrying the
/// stable author reference understood by the content lake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriterProfileRecord {
    pub id: Uuid,
    pub display_name: String,
    pub lake_author_ref: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditLogRecord {
    pub id: Uuid,
    pub actor: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub payload_text: Option<String>,
    pub created_at: OffsetDateTime,
}
