use std::str::FromStr;
use std::time::Instant;

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;
use crate::domain::types::{Actor, ActorRole};

use super::error::ApiError;

const ACTOR_ID_HEADER: &str = "x-actor-id";
const ACTOR_ROLE_HEADER: &str = "x-actor-role";

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

/// Resolve the acting identity placed in the request headers by the
/// authenticating gateway. Requests without a valid identity never reach a
/// handler.
pub async fn require_actor(mut request: Request<Body>, next: Next) -> Response {
    let id = request
        .headers()
        .get(ACTOR_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok());

    let role = request
        .headers()
        .get(ACTOR_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| ActorRole::from_str(value).ok());

    let (Some(id), Some(role)) = (id, role) else {
        return ApiError::unauthorized().into_response();
    };

    request.extensions_mut().insert(Actor { id, role });
    next.run(request).await
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let (actor_id, actor_role) = match request.extensions().get::<Actor>() {
        Some(actor) => (Some(actor.id.to_string()), Some(actor.role.as_str())),
        None => (None, None),
    };

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "newsdesk::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                actor_id = actor_id.as_deref().unwrap_or(""),
                actor_role = actor_role.unwrap_or(""),
                "request failed",
            );
        } else {
            warn!(
                target = "newsdesk::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                actor_id = actor_id.as_deref().unwrap_or(""),
                actor_role = actor_role.unwrap_or(""),
                "client request error",
            );
        }
    }

    response
}
