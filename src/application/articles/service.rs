use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{error, info};
use uuid::Uuid;

use crate::application::articles::{
    ArticleError, CreateDraftCommand, ReviewDecision, UpdateDraftCommand,
};
use crate::application::repos::{
    ArticlesRepo, AuditRepo, CreateArticleParams, UpdateDraftParams, UpdateStatusParams,
};
use crate::domain::entities::{ArticleRecord, AuditLogRecord, EditorOverrides, MAX_TAGS};
use crate::domain::types::Actor;
use crate::domain::validate::{FieldError, ValidationReport, validate_for_submit};
use crate::domain::workflow::{self, WorkflowAction};

/// Writer and editor operations on drafts in the operational store.
///
/// Every mutation path re-checks ownership and workflow state here, not in
/// the UI: a draft that is under review or beyond is read-only to its
/// writer no matter what the client sends.
#[derive(Clone)]
pub struct ArticleService {
    articles: Arc<dyn ArticlesRepo>,
    audit: Arc<dyn AuditRepo>,
}

impl ArticleService {
    pub fn new(articles: Arc<dyn ArticlesRepo>, audit: Arc<dyn AuditRepo>) -> Self {
        Self { articles, audit }
    }

    pub async fn create_draft(
        &self,
        command: CreateDraftCommand,
    ) -> Result<ArticleRecord, ArticleError> {
        enforce_tag_budget(&command.fields.tags)?;

        let article = self
            .articles
            .create_article(CreateArticleParams {
                owner_id: command.actor.id,
                fields: command.fields,
            })
            .await?;

        info!(
            target = "application::articles",
            article_id = %article.id,
            owner_id = %article.owner_id,
            "draft created"
        );
        Ok(article)
    }

    pub async fn update_draft(
        &self,
        command: UpdateDraftCommand,
    ) -> Result<ArticleRecord, ArticleError> {
        enforce_tag_budget(&command.fields.tags)?;

        let current = self.articles.article_by_id(command.article_id).await?;
        require_owner(&current, command.actor)?;
        if !current.status.is_writer_mutable() {
            return Err(ArticleError::ReadOnly {
                status: current.status.as_str(),
            });
        }

        let article = self
            .articles
            .update_draft(UpdateDraftParams {
                id: command.article_id,
                fields: command.fields,
            })
            .await?;
        Ok(article)
    }

    /// Move a draft into the review queue, validating the full schema
    /// constraints first.
    pub async fn submit_for_review(
        &self,
        actor: Actor,
        article_id: Uuid,
    ) -> Result<ArticleRecord, ArticleError> {
        let current = self.articles.article_by_id(article_id).await?;
        require_owner(&current, actor)?;

        let next = workflow::transition(current.status, actor.role, WorkflowAction::Submit)?;
        validate_for_submit(&current).map_err(ArticleError::Validation)?;

        let article = self
            .articles
            .update_status(UpdateStatusParams {
                id: article_id,
                status: next,
                editor_notes: None,
                overrides: None,
            })
            .await?;

        self.record_audit(actor, "article.submit", article_id, &article.title)
            .await;
        Ok(article)
    }

    /// Apply an editor's review decision to a pending article.
    pub async fn review(
        &self,
        actor: Actor,
        article_id: Uuid,
        decision: ReviewDecision,
    ) -> Result<ArticleRecord, ArticleError> {
        if !actor.is_editor() {
            return Err(ArticleError::Forbidden);
        }

        let current = self.articles.article_by_id(article_id).await?;

        let (action, params) = match decision {
            ReviewDecision::Approve { overrides } => {
                let next =
                    workflow::transition(current.status, actor.role, WorkflowAction::Approve)?;
                (
                    "article.approve",
                    UpdateStatusParams {
                        id: article_id,
                        status: next,
                        editor_notes: None,
                        overrides: Some(overrides),
                    },
                )
            }
            ReviewDecision::Reject { note } => {
                let next =
                    workflow::transition(current.status, actor.role, WorkflowAction::Reject)?;
                workflow::require_feedback(&note)?;
                // Rejection always clears whatever a previous approval
                // pinned; the writer gets the article back unencumbered.
                (
                    "article.reject",
                    UpdateStatusParams {
                        id: article_id,
                        status: next,
                        editor_notes: Some(note),
                        overrides: Some(EditorOverrides::default()),
                    },
                )
            }
        };

        let article = self.articles.update_status(params).await?;
        self.record_audit(actor, action, article_id, &article.title)
            .await;
        Ok(article)
    }

    async fn record_audit(&self, actor: Actor, action: &'static str, id: Uuid, title: &str) {
        let record = AuditLogRecord {
            id: Uuid::new_v4(),
            actor: actor.id.to_string(),
            action: action.to_string(),
            entity_type: "article".to_string(),
            entity_id: Some(id.to_string()),
            payload_text: Some(title.to_string()),
            created_at: OffsetDateTime::now_utc(),
        };

        if let Err(err) = self.audit.append_log(record).await {
            error!(
                target = "application::articles",
                error = %err,
                "failed to append audit log"
            );
        }
    }

    pub(crate) fn articles_repo(&self) -> &Arc<dyn ArticlesRepo> {
        &self.articles
    }
}

fn require_owner(article: &ArticleRecord, actor: Actor) -> Result<(), ArticleError> {
    if article.owner_id != actor.id {
        return Err(ArticleError::Forbidden);
    }
    Ok(())
}

fn enforce_tag_budget(tags: &[String]) -> Result<(), ArticleError> {
    if tags.len() > MAX_TAGS {
        return Err(ArticleError::Validation(ValidationReport {
            fields: vec![FieldError {
                field: "tags",
                message: format!("at most {MAX_TAGS} tags are allowed"),
            }],
        }));
    }
    Ok(())
}
