mod support;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Semaphore;

use newsdesk::application::blocks::{AssetSource, ContentBlock};
use newsdesk::application::ports::{ContentLake, ContentLakeError, LakeArticle};
use newsdesk::application::publish::{CategoryMap, PublishError, PublishService};
use newsdesk::application::rehome::AssetRehomer;
use newsdesk::domain::content::{ContentNode, ImageAttrs};
use newsdesk::domain::entities::{ArticleRecord, EditorOverrides};
use newsdesk::domain::types::{ArticleStatus, SiteContext};

use support::{
    MemoryArticlesRepo, MemoryObjectStore, MemoryPublishLocks, MemoryWritersRepo, RecordingAudit,
    RecordingLake, STORE_BASE, article, editor, writer,
};

struct Harness {
    articles: Arc<MemoryArticlesRepo>,
    writers: Arc<MemoryWritersRepo>,
    audit: Arc<RecordingAudit>,
    locks: Arc<MemoryPublishLocks>,
    store: Arc<MemoryObjectStore>,
    lake: Arc<RecordingLake>,
    service: PublishService,
}

fn harness() -> Harness {
    let articles = Arc::new(MemoryArticlesRepo::default());
    let writers = Arc::new(MemoryWritersRepo::default());
    let audit = Arc::new(RecordingAudit::default());
    let locks = Arc::new(MemoryPublishLocks::default());
    let store = Arc::new(MemoryObjectStore::default());
    let lake = Arc::new(RecordingLake::default());

    let service = PublishService::new(
        articles.clone(),
        writers.clone(),
        audit.clone(),
        locks.clone(),
        lake.clone(),
        AssetRehomer::new(store.clone(), lake.clone()),
        CategoryMap::new(HashMap::from([(
            "politics".to_string(),
            "cat-politics".to_string(),
        )])),
    );

    Harness {
        articles,
        writers,
        audit,
        locks,
        store,
        lake,
        service,
    }
}

/// An approved article whose featured image and one inline image live in
/// the object store.
async fn seed_approved(harness: &Harness) -> ArticleRecord {
    let owner = writer();
    let mut approved = article(owner.id, ArticleStatus::Approved);
    approved.body.push(ContentNode::Image {
        attrs: ImageAttrs {
            src: format!("{STORE_BASE}/{}/inline.png", owner.id),
            alt: Some("Chart".to_string()),
            caption: None,
            source: None,
        },
    });

    harness.writers.insert_profile(owner.id, "author-7").await;
    harness.store.put("owner/cover.jpg", b"cover-bytes").await;
    harness
        .store
        .objects
        .lock()
        .await
        .insert(
            format!("{}/inline.png", owner.id),
            bytes::Bytes::from_static(b"chart-bytes"),
        );

    harness.articles.insert(approved.clone()).await;
    approved
}

#[tokio::test]
async fn publish_end_to_end_applies_overrides_and_rehomes_assets() {
    let harness = harness();
    let mut approved = seed_approved(&harness).await;
    approved.overrides = Some(EditorOverrides {
        meta_title: Some("Budget Crisis Deepens".to_string()),
        is_breaking: Some(true),
        site_context: Some(SiteContext::Elections),
    });
    harness.articles.insert(approved.clone()).await;

    let receipt = harness
        .service
        .publish(editor(), approved.id)
        .await
        .expect("publish succeeds");
    assert_eq!(receipt.lake_document_id, "doc-1");

    let documents = harness.lake.created_documents().await;
    assert_eq!(documents.len(), 1);
    let document = &documents[0];
    assert_eq!(document.title, "Budget Crisis Deepens");
    assert_eq!(document.slug, "budget-crisis-deepens");
    assert!(document.is_breaking);
    assert_eq!(document.site_context, SiteContext::Elections);
    assert_eq!(document.author_ref, "author-7");
    assert_eq!(document.category_ref, "cat-politics");
    assert_eq!(
        document.featured_image.as_ref().map(|i| i.asset_id.as_str()),
        Some("image-cover.jpg")
    );

    // The inline image reference is stable in the written document.
    let image = document
        .body
        .iter()
        .find_map(|block| match block {
            ContentBlock::Image(image) => Some(image),
            _ => None,
        })
        .expect("inline image kept");
    assert_eq!(
        image.source,
        AssetSource::Stable {
            asset_id: "image-inline.png".to_string()
        }
    );

    // Both stores agree afterwards.
    let stored = harness.articles.get(approved.id).await.expect("stored");
    assert_eq!(stored.status, ArticleStatus::Published);
    assert_eq!(stored.lake_document_id.as_deref(), Some("doc-1"));
    assert!(stored.published_at.is_some());
    assert_eq!(harness.audit.actions().await, vec!["article.publish"]);
}

#[tokio::test]
async fn only_editors_may_publish() {
    let harness = harness();
    let approved = seed_approved(&harness).await;

    let error = harness
        .service
        .publish(writer(), approved.id)
        .await
        .expect_err("writers cannot publish");
    assert!(matches!(error, PublishError::Unauthorized));
    assert!(harness.lake.created_documents().await.is_empty());
}

#[tokio::test]
async fn unapproved_articles_are_refused() {
    let harness = harness();
    let mut pending = seed_approved(&harness).await;
    pending.status = ArticleStatus::PendingReview;
    harness.articles.insert(pending.clone()).await;

    let error = harness
        .service
        .publish(editor(), pending.id)
        .await
        .expect_err("not approved");
    assert!(matches!(
        error,
        PublishError::NotApproved {
            status: "pending_review"
        }
    ));
}

#[tokio::test]
async fn missing_featured_image_aborts_before_any_external_write() {
    let harness = harness();
    let approved = seed_approved(&harness).await;
    harness.store.objects.lock().await.remove("owner/cover.jpg");

    let error = harness
        .service
        .publish(editor(), approved.id)
        .await
        .expect_err("fatal asset failure");
    assert!(matches!(error, PublishError::FatalAsset { .. }));

    assert!(harness.lake.created_documents().await.is_empty());
    assert_eq!(harness.lake.uploads.load(Ordering::SeqCst), 0);
    let stored = harness.articles.get(approved.id).await.expect("stored");
    assert_eq!(stored.status, ArticleStatus::Approved);
}

#[tokio::test]
async fn failed_inline_image_drops_the_block_and_publishes() {
    let harness = harness();
    let approved = seed_approved(&harness).await;
    let inline_key = format!("{}/inline.png", approved.owner_id);
    harness.store.objects.lock().await.remove(&inline_key);

    harness
        .service
        .publish(editor(), approved.id)
        .await
        .expect("publish continues");

    let documents = harness.lake.created_documents().await;
    assert_eq!(documents.len(), 1);
    assert!(
        documents[0]
            .body
            .iter()
            .all(|block| !matches!(block, ContentBlock::Image(_))),
        "dropped inline image must not appear in the document"
    );
}

#[tokio::test]
async fn unmapped_category_fails_before_the_lake_write() {
    let harness = harness();
    let mut approved = seed_approved(&harness).await;
    approved.category_slug = "sports".to_string();
    harness.articles.insert(approved.clone()).await;

    let error = harness
        .service
        .publish(editor(), approved.id)
        .await
        .expect_err("unmapped category");
    let PublishError::UnmappedCategory { slug } = error else {
        panic!("expected unmapped category, got {error:?}");
    };
    assert_eq!(slug, "sports");
    assert!(harness.lake.created_documents().await.is_empty());
}

#[tokio::test]
async fn rejected_lake_write_leaves_the_record_untouched() {
    let harness = harness();
    let approved = seed_approved(&harness).await;
    harness.lake.fail_create.store(true, Ordering::SeqCst);

    let error = harness
        .service
        .publish(editor(), approved.id)
        .await
        .expect_err("lake write fails");
    assert!(matches!(error, PublishError::LakeWrite { .. }));

    let stored = harness.articles.get(approved.id).await.expect("stored");
    assert_eq!(stored.status, ArticleStatus::Approved);
    assert!(stored.lake_document_id.is_none());
}

#[tokio::test]
async fn partial_sync_carries_the_live_document_id() {
    let harness = harness();
    let approved = seed_approved(&harness).await;
    harness
        .articles
        .fail_mark_published
        .store(true, Ordering::SeqCst);

    let error = harness
        .service
        .publish(editor(), approved.id)
        .await
        .expect_err("record update fails");
    let PublishError::PartialSync {
        lake_document_id, ..
    } = error
    else {
        panic!("expected partial sync, got {error:?}");
    };

    // The document IS live; the caller needs its id to reconcile.
    assert_eq!(lake_document_id, "doc-1");
    assert_eq!(harness.lake.created_documents().await.len(), 1);
    let stored = harness.articles.get(approved.id).await.expect("stored");
    assert_eq!(stored.status, ArticleStatus::Approved);
}

#[tokio::test]
async fn concurrent_publishes_of_one_article_are_refused() {
    let harness = harness();
    let approved = seed_approved(&harness).await;
    harness.locks.hold(approved.id);

    let error = harness
        .service
        .publish(editor(), approved.id)
        .await
        .expect_err("already in flight");
    assert!(matches!(error, PublishError::AlreadyInFlight));
    assert!(harness.lake.created_documents().await.is_empty());
}

#[tokio::test]
async fn the_lock_is_released_after_a_failed_run() {
    let harness = harness();
    let mut approved = seed_approved(&harness).await;
    approved.category_slug = "sports".to_string();
    harness.articles.insert(approved.clone()).await;

    let first = harness.service.publish(editor(), approved.id).await;
    assert!(matches!(first, Err(PublishError::UnmappedCategory { .. })));

    // A second attempt reaches the pipeline again instead of the lock.
    let second = harness.service.publish(editor(), approved.id).await;
    assert!(matches!(second, Err(PublishError::UnmappedCategory { .. })));
}

/// Lake wrapper that parks `upload_image` on a gate, signalling `entered`
/// once a caller is inside. Lets a test freeze the pipeline mid-rehome.
struct GatedLake {
    inner: Arc<RecordingLake>,
    entered: Arc<Semaphore>,
    gate: Arc<Semaphore>,
}

#[async_trait]
impl ContentLake for GatedLake {
    async fn upload_image(
        &self,
        filename: &str,
        payload: Bytes,
    ) -> Result<String, ContentLakeError> {
        self.entered.add_permits(1);
        drop(self.gate.acquire().await.expect("gate open"));
        self.inner.upload_image(filename, payload).await
    }

    async fn create_article(&self, article: &LakeArticle) -> Result<String, ContentLakeError> {
        self.inner.create_article(article).await
    }
}

#[tokio::test]
async fn an_abandoned_publish_call_still_completes_and_frees_the_lock() {
    let articles = Arc::new(MemoryArticlesRepo::default());
    let writers = Arc::new(MemoryWritersRepo::default());
    let audit = Arc::new(RecordingAudit::default());
    let locks = Arc::new(MemoryPublishLocks::default());
    let store = Arc::new(MemoryObjectStore::default());
    let recording = Arc::new(RecordingLake::default());
    let entered = Arc::new(Semaphore::new(0));
    let gate = Arc::new(Semaphore::new(0));
    let lake = Arc::new(GatedLake {
        inner: recording.clone(),
        entered: entered.clone(),
        gate: gate.clone(),
    });

    let service = PublishService::new(
        articles.clone(),
        writers.clone(),
        audit,
        locks,
        lake.clone(),
        AssetRehomer::new(store.clone(), lake),
        CategoryMap::new(HashMap::from([(
            "politics".to_string(),
            "cat-politics".to_string(),
        )])),
    );

    let owner = writer();
    let approved = article(owner.id, ArticleStatus::Approved);
    writers.insert_profile(owner.id, "author-7").await;
    store.put("owner/cover.jpg", b"cover-bytes").await;
    articles.insert(approved.clone()).await;

    let caller = {
        let service = service.clone();
        let id = approved.id;
        tokio::spawn(async move { service.publish(editor(), id).await })
    };

    // Wait until the featured-image upload is underway, then drop the
    // caller the way the server drops a handler future when the client
    // disconnects.
    entered.acquire().await.expect("pipeline reached upload").forget();
    caller.abort();
    assert!(caller.await.expect_err("caller aborted").is_cancelled());

    // The pipeline keeps running on its own task; unblock it and let it
    // finish.
    gate.add_permits(8);
    for _ in 0..10_000 {
        if articles.get(approved.id).await.expect("stored").status == ArticleStatus::Published {
            break;
        }
        tokio::task::yield_now().await;
    }

    let stored = articles.get(approved.id).await.expect("stored");
    assert_eq!(stored.status, ArticleStatus::Published);
    assert_eq!(stored.lake_document_id.as_deref(), Some("doc-1"));
    assert_eq!(recording.created_documents().await.len(), 1);

    // The lock was released when the run ended: a retry gets past the
    // lock and is refused on status, not on an in-flight publish.
    let retry = service.publish(editor(), approved.id).await;
    assert!(matches!(
        retry,
        Err(PublishError::NotApproved {
            status: "published"
        })
    ));
}

#[tokio::test]
async fn publish_without_a_featured_image_writes_none() {
    let harness = harness();
    let mut approved = seed_approved(&harness).await;
    approved.featured_image = None;
    approved.body = vec![ContentNode::Paragraph {
        content: vec![ContentNode::Text {
            text: "Short update.".to_string(),
            marks: vec![],
        }],
    }];
    harness.articles.insert(approved.clone()).await;

    harness
        .service
        .publish(editor(), approved.id)
        .await
        .expect("publish succeeds");

    let documents = harness.lake.created_documents().await;
    assert!(documents[0].featured_image.is_none());
}
