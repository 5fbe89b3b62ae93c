mod support;

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use newsdesk::application::articles::ArticleService;
use newsdesk::application::publish::{CategoryMap, PublishService};
use newsdesk::application::rehome::AssetRehomer;
use newsdesk::domain::types::{Actor, ActorRole, ArticleStatus};
use newsdesk::infra::http::{HttpState, build_router};

use support::{
    MemoryArticlesRepo, MemoryObjectStore, MemoryPublishLocks, MemoryWritersRepo, RecordingAudit,
    RecordingLake, article, editor, writer,
};

struct App {
    articles: Arc<MemoryArticlesRepo>,
    writers: Arc<MemoryWritersRepo>,
    store: Arc<MemoryObjectStore>,
    lake: Arc<RecordingLake>,
    router: Router,
}

fn app() -> App {
    let articles = Arc::new(MemoryArticlesRepo::default());
    let writers = Arc::new(MemoryWritersRepo::default());
    let audit = Arc::new(RecordingAudit::default());
    let locks = Arc::new(MemoryPublishLocks::default());
    let store = Arc::new(MemoryObjectStore::default());
    let lake = Arc::new(RecordingLake::default());

    let article_service = Arc::new(ArticleService::new(articles.clone(), audit.clone()));
    let publish_service = Arc::new(PublishService::new(
        articles.clone(),
        writers.clone(),
        audit,
        locks,
        lake.clone(),
        AssetRehomer::new(store.clone(), lake.clone()),
        CategoryMap::new(HashMap::from([(
            "politics".to_string(),
            "cat-politics".to_string(),
        )])),
    ));

    let router = build_router(HttpState {
        articles: article_service,
        publish: publish_service,
    });

    App {
        articles,
        writers,
        store,
        lake,
        router,
    }
}

fn request(actor: Actor, method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-actor-id", actor.id.to_string())
        .header("x-actor-role", actor.role.as_str());
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request builds")
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}

fn draft_json() -> Value {
    json!({
        "title": "Budget Talks Collapse",
        "excerpt": "Negotiations broke down overnight.",
        "category_slug": "politics",
        "tags": ["budget"],
        "body": [
            { "type": "paragraph", "content": [
                { "type": "text", "text": "Talks ended without a deal." }
            ] }
        ],
        "featured_image": { "kind": "stable", "url": "https://cdn.test/uploads/owner/cover.jpg" },
        "image_alt": "Empty negotiating table"
    })
}

#[tokio::test]
async fn requests_without_an_actor_identity_are_unauthorized() {
    let app = app();
    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/v1/articles")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn creating_a_draft_returns_the_stored_article() {
    let app = app();
    let actor = writer();

    let response = app
        .router
        .oneshot(request(
            actor,
            "POST",
            "/api/v1/articles",
            Some(draft_json()),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["status"], "draft");
    assert_eq!(body["owner_id"], actor.id.to_string());
    assert_eq!(body["featured_image"]["kind"], "stable");
}

#[tokio::test]
async fn unknown_articles_yield_a_stable_not_found_code() {
    let app = app();
    let response = app
        .router
        .oneshot(request(
            writer(),
            "GET",
            &format!("/api/v1/articles/{}", Uuid::new_v4()),
            None,
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn review_queue_is_closed_to_writers() {
    let app = app();
    let response = app
        .router
        .oneshot(request(writer(), "GET", "/api/v1/review/queue", None))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "forbidden");
}

#[tokio::test]
async fn rejecting_without_a_note_is_a_validation_error() {
    let app = app();
    let pending = article(writer().id, ArticleStatus::PendingReview);
    let id = pending.id;
    app.articles.insert(pending).await;

    let response = app
        .router
        .oneshot(request(
            editor(),
            "POST",
            &format!("/api/v1/articles/{id}/review"),
            Some(json!({ "decision": "reject", "note": "  " })),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "feedback_required");
}

#[tokio::test]
async fn approve_then_publish_round_trip() {
    let app = app();
    let owner = Actor {
        id: Uuid::new_v4(),
        role: ActorRole::Writer,
    };
    let pending = article(owner.id, ArticleStatus::PendingReview);
    let id = pending.id;
    app.articles.insert(pending).await;
    app.writers.insert_profile(owner.id, "author-7").await;
    app.store.put("owner/cover.jpg", b"cover-bytes").await;

    let approve = app
        .router
        .clone()
        .oneshot(request(
            editor(),
            "POST",
            &format!("/api/v1/articles/{id}/review"),
            Some(json!({ "decision": "approve", "overrides": { "is_breaking": true } })),
        ))
        .await
        .expect("router responds");
    assert_eq!(approve.status(), StatusCode::OK);
    let approved = response_json(approve).await;
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["overrides"]["is_breaking"], true);

    let publish = app
        .router
        .oneshot(request(
            editor(),
            "POST",
            &format!("/api/v1/articles/{id}/publish"),
            None,
        ))
        .await
        .expect("router responds");
    assert_eq!(publish.status(), StatusCode::OK);
    let receipt = response_json(publish).await;
    assert_eq!(receipt["lake_document_id"], "doc-1");

    let documents = app.lake.created_documents().await;
    assert_eq!(documents.len(), 1);
    assert!(documents[0].is_breaking);
}

#[tokio::test]
async fn publish_partial_sync_surfaces_its_own_error_code() {
    let app = app();
    let owner = writer();
    let approved = article(owner.id, ArticleStatus::Approved);
    let id = approved.id;
    app.articles.insert(approved).await;
    app.writers.insert_profile(owner.id, "author-7").await;
    app.store.put("owner/cover.jpg", b"cover-bytes").await;
    app.articles
        .fail_mark_published
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let response = app
        .router
        .oneshot(request(
            editor(),
            "POST",
            &format!("/api/v1/articles/{id}/publish"),
            None,
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "partial_sync");
    let hint = body["error"]["hint"].as_str().expect("hint present");
    assert!(hint.contains("doc-1"));
}
