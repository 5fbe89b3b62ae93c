pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::HttpState;

use axum::{
    Router, middleware as axum_middleware,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;
use crate::infra::http::middleware::{log_responses, require_actor, set_request_context};

/// The authenticated API surface. Every route requires an actor identity
/// established by the upstream gateway.
pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route(
            "/api/v1/articles",
            get(handlers::list_articles).post(handlers::create_article),
        )
        .route(
            "/api/v1/articles/{id}",
            get(handlers::get_article).put(handlers::update_article),
        )
        .route("/api/v1/articles/{id}/submit", post(handlers::submit_article))
        .route("/api/v1/articles/{id}/review", post(handlers::review_article))
        .route(
            "/api/v1/articles/{id}/publish",
            post(handlers::publish_article),
        )
        .route("/api/v1/review/queue", get(handlers::review_queue))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(require_actor))
        .layer(axum_middleware::from_fn(set_request_context))
}

pub fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
