//! Draft lifecycle services: writer mutations and editorial review.

mod commands;
mod queries;
mod service;

pub use commands::{CreateDraftCommand, ReviewDecision, UpdateDraftCommand};
pub use service::ArticleService;

use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::validate::ValidationReport;
use crate::domain::workflow::WorkflowError;

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("actor is not permitted to perform this action")]
    Forbidden,
    #[error("article not found")]
    NotFound,
    #[error("article is read-only while in status `{status}`")]
    ReadOnly { status: &'static str },
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("draft validation failed: {0}")]
    Validation(ValidationReport),
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for ArticleError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => ArticleError::NotFound,
            other => ArticleError::Repo(other),
        }
    }
}
