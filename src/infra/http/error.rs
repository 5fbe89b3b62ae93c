use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::articles::ArticleError;
use crate::application::error::ErrorReport;
use crate::application::publish::PublishError;
use crate::application::repos::RepoError;
use crate::domain::workflow::WorkflowError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const FORBIDDEN: &str = "forbidden";
    pub const NOT_FOUND: &str = "not_found";
    pub const READ_ONLY: &str = "read_only";
    pub const INVALID_TRANSITION: &str = "invalid_transition";
    pub const FEEDBACK_REQUIRED: &str = "feedback_required";
    pub const VALIDATION: &str = "validation_failed";
    pub const NOT_APPROVED: &str = "not_approved";
    pub const PUBLISH_IN_FLIGHT: &str = "publish_in_flight";
    pub const ASSET_UNAVAILABLE: &str = "asset_unavailable";
    pub const UNMAPPED_CATEGORY: &str = "unmapped_category";
    pub const LAKE_WRITE: &str = "lake_write_failed";
    pub const PARTIAL_SYNC: &str = "partial_sync";
    pub const DUPLICATE: &str = "duplicate";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Actor identity required",
            None,
        )
    }

    pub fn forbidden() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            codes::FORBIDDEN,
            "Actor lacks the required role",
            None,
        )
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    fn repo(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::not_found("Resource not found"),
            RepoError::Duplicate { constraint } => Self::new(
                StatusCode::CONFLICT,
                codes::DUPLICATE,
                "Duplicate record",
                Some(constraint),
            ),
            RepoError::InvalidInput { message } => Self::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_INPUT,
                "Invalid input",
                Some(message),
            ),
            RepoError::Integrity { message } => Self::new(
                StatusCode::CONFLICT,
                codes::INTEGRITY,
                "Integrity constraint violated",
                Some(message),
            ),
            RepoError::Timeout => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::DB_TIMEOUT,
                "Database timeout",
                None,
            ),
            RepoError::Persistence(message) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::REPO,
                "Persistence error",
                Some(message),
            ),
        }
    }
}

impl From<ArticleError> for ApiError {
    fn from(err: ArticleError) -> Self {
        match err {
            ArticleError::Forbidden => Self::forbidden(),
            ArticleError::NotFound => Self::not_found("Article not found"),
            ArticleError::ReadOnly { status } => Self::new(
                StatusCode::CONFLICT,
                codes::READ_ONLY,
                "Article is read-only in its current status",
                Some(format!("status is `{status}`")),
            ),
            ArticleError::Workflow(WorkflowError::MissingFeedback) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                codes::FEEDBACK_REQUIRED,
                "Rejection requires a feedback note",
                None,
            ),
            ArticleError::Workflow(workflow) => Self::new(
                StatusCode::CONFLICT,
                codes::INVALID_TRANSITION,
                "Workflow transition not allowed",
                Some(workflow.to_string()),
            ),
            ArticleError::Validation(report) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                codes::VALIDATION,
                "Draft failed validation",
                Some(report.to_string()),
            ),
            ArticleError::Repo(repo) => Self::repo(repo),
        }
    }
}

impl From<PublishError> for ApiError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::Unauthorized => Self::forbidden(),
            PublishError::NotFound => Self::not_found("Article not found"),
            PublishError::NotApproved { status } => Self::new(
                StatusCode::CONFLICT,
                codes::NOT_APPROVED,
                "Only approved articles can be published",
                Some(format!("status is `{status}`")),
            ),
            PublishError::AlreadyInFlight => Self::new(
                StatusCode::CONFLICT,
                codes::PUBLISH_IN_FLIGHT,
                "A publish of this article is already in flight",
                None,
            ),
            PublishError::FatalAsset { source } => Self::new(
                StatusCode::BAD_GATEWAY,
                codes::ASSET_UNAVAILABLE,
                "Featured image could not be rehomed; nothing was published",
                Some(source.to_string()),
            ),
            PublishError::UnmappedCategory { slug } => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                codes::UNMAPPED_CATEGORY,
                "Category has no content-lake mapping",
                Some(format!("slug `{slug}`")),
            ),
            PublishError::LakeWrite { source } => Self::new(
                StatusCode::BAD_GATEWAY,
                codes::LAKE_WRITE,
                "Content lake rejected the document write; nothing was published",
                Some(source.to_string()),
            ),
            // Distinct from every other failure: the content is live and a
            // retry would create a second document.
            PublishError::PartialSync {
                lake_document_id,
                source,
            } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::PARTIAL_SYNC,
                "Document is live in the content lake but the operational record is stale; \
                 reconcile manually, do not retry",
                Some(format!(
                    "lake document `{lake_document_id}`; record update failed: {source}"
                )),
            ),
            PublishError::Repo(repo) => Self::repo(repo),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        // Attach a structured report so shared logging middleware can emit rich diagnostics.
        ErrorReport::from_message(
            "infra::http",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
        )
        .attach(&mut response);
        response
    }
}
