use async_trait::async_trait;
use sqlx::{FromRow, Postgres, QueryBuilder, types::Json};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    ArticlesRepo, CreateArticleParams, DraftFields, RepoError, UpdateDraftParams,
    UpdateStatusParams,
};
use crate::domain::content::ContentNode;
use crate::domain::entities::{ArticleRecord, EditorOverrides, FeaturedImage};
use crate::domain::types::{ArticleStatus, SiteContext};

use super::{PostgresRepositories, map_sqlx_error};

const SELECT_ARTICLE: &str = "\
    SELECT a.id, a.owner_id, a.title, a.excerpt, a.category_slug, \
           COALESCE(array_agg(t.tag ORDER BY t.tag) FILTER (WHERE t.tag IS NOT NULL), '{}') AS tags, \
           a.body, a.featured_image, a.image_alt, a.image_caption, a.image_source, \
           a.is_breaking, a.site_context, a.status, a.editor_notes, a.overrides, \
           a.lake_document_id, a.published_at, a.created_at, a.updated_at \
      FROM articles a \
 LEFT JOIN article_tags t ON t.article_id = a.id";

/// Raw article row shape. Conversion into the domain entity happens in one
/// place so unexpected row content is dropped or rejected deterministically
/// instead of leaking dynamic structure into the core.
#[derive(Debug, FromRow)]
struct ArticleRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    excerpt: String,
    category_slug: String,
    tags: Vec<String>,
    body: serde_json::Value,
    featured_image: Option<serde_json::Value>,
    image_alt: Option<String>,
    image_caption: Option<String>,
    image_source: Option<String>,
    is_breaking: bool,
    site_context: SiteContext,
    status: ArticleStatus,
    editor_notes: Option<String>,
    overrides: Option<serde_json::Value>,
    lake_document_id: Option<String>,
    published_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl ArticleRow {
    fn into_record(self) -> Result<ArticleRecord, RepoError> {
        let body: Vec<ContentNode> =
            serde_json::from_value(self.body).map_err(|err| RepoError::Integrity {
                message: format!("stored article body is not a content tree: {err}"),
            })?;
        let featured_image: Option<FeaturedImage> = self
            .featured_image
            .map(serde_json::from_value)
            .transpose()
            .map_err(|err| RepoError::Integrity {
                message: format!("stored featured image is malformed: {err}"),
            })?;
        let overrides: Option<EditorOverrides> = self
            .overrides
            .map(serde_json::from_value)
            .transpose()
            .map_err(|err| RepoError::Integrity {
                message: format!("stored overrides are malformed: {err}"),
            })?;

        Ok(ArticleRecord {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            excerpt: self.excerpt,
            category_slug: self.category_slug,
            tags: self.tags,
            body,
            featured_image,
            image_alt: self.image_alt,
            image_caption: self.image_caption,
            image_source: self.image_source,
            is_breaking: self.is_breaking,
            site_context: self.site_context,
            status: self.status,
            editor_notes: self.editor_notes,
            overrides,
            lake_document_id: self.lake_document_id,
            published_at: self.published_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl ArticlesRepo for PostgresRepositories {
    async fn article_by_id(&self, id: Uuid) -> Result<ArticleRecord, RepoError> {
        let sql = format!("{SELECT_ARTICLE} WHERE a.id = $1 GROUP BY a.id");
        let row = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;
        row.into_record()
    }

    async fn articles_by_owner(&self, owner_id: Uuid) -> Result<Vec<ArticleRecord>, RepoError> {
        let sql = format!(
            "{SELECT_ARTICLE} WHERE a.owner_id = $1 GROUP BY a.id ORDER BY a.updated_at DESC"
        );
        let rows = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        rows.into_iter().map(ArticleRow::into_record).collect()
    }

    async fn review_queue(&self) -> Result<Vec<ArticleRecord>, RepoError> {
        let sql = format!(
            "{SELECT_ARTICLE} WHERE a.status = $1 GROUP BY a.id ORDER BY a.updated_at ASC"
        );
        let rows = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(ArticleStatus::PendingReview)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        rows.into_iter().map(ArticleRow::into_record).collect()
    }

    async fn create_article(
        &self,
        params: CreateArticleParams,
    ) -> Result<ArticleRecord, RepoError> {
        let CreateArticleParams { owner_id, fields } = params;
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            "INSERT INTO articles ( \
                 id, owner_id, title, excerpt, category_slug, body, featured_image, \
                 image_alt, image_caption, image_source, is_breaking, site_context, \
                 status, created_at, updated_at \
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)",
        )
        .bind(id)
        .bind(owner_id)
        .bind(&fields.title)
        .bind(&fields.excerpt)
        .bind(&fields.category_slug)
        .bind(Json(&fields.body))
        .bind(fields.featured_image.as_ref().map(Json))
        .bind(&fields.image_alt)
        .bind(&fields.image_caption)
        .bind(&fields.image_source)
        .bind(fields.is_breaking)
        .bind(fields.site_context)
        .bind(ArticleStatus::Draft)
        .bind(now)
        .execute(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        replace_tags_tx(&mut tx, id, &fields.tags).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(record_from_fields(id, owner_id, fields, now))
    }

    async fn update_draft(&self, params: UpdateDraftParams) -> Result<ArticleRecord, RepoError> {
        let UpdateDraftParams { id, fields } = params;
        let now = OffsetDateTime::now_utc();

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let updated = sqlx::query(
            "UPDATE articles SET \
                 title = $2, excerpt = $3, category_slug = $4, body = $5, \
                 featured_image = $6, image_alt = $7, image_caption = $8, \
                 image_source = $9, is_breaking = $10, site_context = $11, \
                 updated_at = $12 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.excerpt)
        .bind(&fields.category_slug)
        .bind(Json(&fields.body))
        .bind(fields.featured_image.as_ref().map(Json))
        .bind(&fields.image_alt)
        .bind(&fields.image_caption)
        .bind(&fields.image_source)
        .bind(fields.is_breaking)
        .bind(fields.site_context)
        .bind(now)
        .execute(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

        if updated.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        replace_tags_tx(&mut tx, id, &fields.tags).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        self.article_by_id(id).await
    }

    async fn update_status(&self, params: UpdateStatusParams) -> Result<ArticleRecord, RepoError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("UPDATE articles SET status = ");
        qb.push_bind(params.status);
        if let Some(note) = &params.editor_notes {
            qb.push(", editor_notes = ");
            qb.push_bind(note);
        }
        if let Some(overrides) = &params.overrides {
            if overrides.is_empty() {
                qb.push(", overrides = NULL");
            } else {
                qb.push(", overrides = ");
                qb.push_bind(Json(overrides));
            }
        }
        qb.push(", updated_at = now() WHERE id = ");
        qb.push_bind(params.id);

        let updated = qb
            .build()
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        if updated.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        self.article_by_id(params.id).await
    }

    async fn mark_published(
        &self,
        id: Uuid,
        lake_document_id: &str,
        published_at: OffsetDateTime,
    ) -> Result<(), RepoError> {
        let updated = sqlx::query(
            "UPDATE articles SET status = $2, lake_document_id = $3, \
                 published_at = $4, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(ArticleStatus::Published)
        .bind(lake_document_id)
        .bind(published_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if updated.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

/// Replace the full tag association set for one article.
async fn replace_tags_tx(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    article_id: Uuid,
    tags: &[String],
) -> Result<(), RepoError> {
    sqlx::query("DELETE FROM article_tags WHERE article_id = $1")
        .bind(article_id)
        .execute(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

    for tag in tags {
        sqlx::query("INSERT INTO article_tags (article_id, tag) VALUES ($1, $2)")
            .bind(article_id)
            .bind(tag)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;
    }

    Ok(())
}

fn record_from_fields(
    id: Uuid,
    owner_id: Uuid,
    fields: DraftFields,
    now: OffsetDateTime,
) -> ArticleRecord {
    ArticleRecord {
        id,
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
        status: ArticleStatus::Draft,
        editor_notes: None,
        overrides: None,
        lake_document_id: None,
        published_at: None,
        created_at: now,
        updated_at: now,
    }
}
