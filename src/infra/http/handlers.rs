use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::application::articles::{CreateDraftCommand, ReviewDecision, UpdateDraftCommand};
use crate::domain::types::Actor;

use super::error::ApiError;
use super::models::{ArticleResponse, DraftRequest, PublishResponse, ReviewRequest};
use super::state::HttpState;

pub async fn create_article(
    State(state): State<HttpState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<DraftRequest>,
) -> Result<(StatusCode, Json<ArticleResponse>), ApiError> {
    let article = state
        .articles
        .create_draft(CreateDraftCommand {
            actor,
            fields: payload.into_fields(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(article.into())))
}

pub async fn list_articles(
    State(state): State<HttpState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<ArticleResponse>>, ApiError> {
    let articles = state.articles.own_articles(actor).await?;
    Ok(Json(articles.into_iter().map(Into::into).collect()))
}

pub async fn get_article(
    State(state): State<HttpState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article = state.articles.article(actor, id).await?;
    Ok(Json(article.into()))
}

pub async fn update_article(
    State(state): State<HttpState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DraftRequest>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article = state
        .articles
        .update_draft(UpdateDraftCommand {
            actor,
            article_id: id,
            fields: payload.into_fields(),
        })
        .await?;
    Ok(Json(article.into()))
}

pub async fn submit_article(
    State(state): State<HttpState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article = state.articles.submit_for_review(actor, id).await?;
    Ok(Json(article.into()))
}

pub async fn review_article(
    State(state): State<HttpState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let decision = match payload {
        ReviewRequest::Approve { overrides } => ReviewDecision::Approve { overrides },
        ReviewRequest::Reject { note } => ReviewDecision::Reject { note },
    };
    let article = state.articles.review(actor, id, decision).await?;
    Ok(Json(article.into()))
}

pub async fn review_queue(
    State(state): State<HttpState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<ArticleResponse>>, ApiError> {
    let articles = state.articles.review_queue(actor).await?;
    Ok(Json(articles.into_iter().map(Into::into).collect()))
}

pub async fn publish_article(
    State(state): State<HttpState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublishResponse>, ApiError> {
    let receipt = state.publish.publish(actor, id).await?;
    Ok(Json(PublishResponse {
        lake_document_id: receipt.lake_document_id,
    }))
}
