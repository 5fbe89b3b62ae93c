//! HTTP client for the headless content lake.
//!
//! The lake exposes the two primitives this backend needs: binary asset
//! upload and document creation. Everything else (queries, rendering)
//! belongs to the public site, not here.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header;
use serde::Deserialize;
use serde_json::{Value, json};
use time::format_description::well_known::Rfc3339;
use tracing::debug;
use url::Url;

use crate::application::blocks::{AssetSource, ContentBlock};
use crate::application::ports::{ContentLake, ContentLakeError, LakeArticle};

#[derive(Clone)]
pub struct HttpContentLake {
    client: reqwest::Client,
    base_url: Url,
    dataset: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    document: AssetDocument,
}

#[derive(Debug, Deserialize)]
struct AssetDocument {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct MutateResponse {
    results: Vec<MutateResult>,
}

#[derive(Debug, Deserialize)]
struct MutateResult {
    id: String,
}

impl HttpContentLake {
    pub fn new(base_url: Url, dataset: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            dataset,
            token,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ContentLakeError> {
        self.base_url
            .join(path)
            .map_err(|err| ContentLakeError::malformed(format!("invalid endpoint path: {err}")))
    }

    async fn read_error(response: reqwest::Response) -> ContentLakeError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ContentLakeError::Rejected { status, body }
    }
}

#[async_trait]
impl ContentLake for HttpContentLake {
    async fn upload_image(
        &self,
        filename: &str,
        payload: Bytes,
    ) -> Result<String, ContentLakeError> {
        let mut endpoint = self.endpoint(&format!("assets/images/{}", self.dataset))?;
        endpoint.query_pairs_mut().append_pair("filename", filename);

        let content_type = mime_guess::from_path(filename).first_or_octet_stream();
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.token)
            .header(header::CONTENT_TYPE, content_type.as_ref())
            .body(payload)
            .send()
            .await
            .map_err(ContentLakeError::transport)?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let parsed: AssetResponse = response
            .json()
            .await
            .map_err(|err| ContentLakeError::malformed(err.to_string()))?;

        debug!(
            target = "infra::content_lake",
            filename,
            asset_id = parsed.document.id,
            "asset uploaded"
        );
        Ok(parsed.document.id)
    }

    async fn create_article(&self, article: &LakeArticle) -> Result<String, ContentLakeError> {
        let mut endpoint = self.endpoint(&format!("data/mutate/{}", self.dataset))?;
        endpoint.query_pairs_mut().append_pair("returnIds", "true");

        let body = json!({
            "mutations": [ { "create": article_to_document(article)? } ],
        });

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(ContentLakeError::transport)?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let parsed: MutateResponse = response
            .json()
            .await
            .map_err(|err| ContentLakeError::malformed(err.to_string()))?;

        parsed
            .results
            .into_iter()
            .next()
            .map(|result| result.id)
            .ok_or_else(|| ContentLakeError::malformed("mutation response carried no ids"))
    }
}

/// Build the lake's wire document from an already-resolved article.
fn article_to_document(article: &LakeArticle) -> Result<Value, ContentLakeError> {
    let published_at = article
        .published_at
        .format(&Rfc3339)
        .map_err(|err| ContentLakeError::malformed(format!("timestamp format: {err}")))?;

    let mut document = json!({
        "_type": "article",
        "title": article.title,
        "slug": { "_type": "slug", "current": article.slug },
        "excerpt": article.excerpt,
        "tags": article.tags,
        "isBreaking": article.is_breaking,
        "siteContext": article.site_context.as_str(),
        "author": { "_type": "reference", "_ref": article.author_ref },
        "category": { "_type": "reference", "_ref": article.category_ref },
        "publishedAt": published_at,
        "body": article.body.iter().filter_map(block_to_value).collect::<Vec<_>>(),
    });

    if let Some(image) = &article.featured_image {
        document["mainImage"] = json!({
            "_type": "image",
            "asset": { "_type": "reference", "_ref": image.asset_id },
            "alt": image.alt,
            "caption": image.caption,
            "attribution": image.attribution,
        });
    }

    Ok(document)
}

fn block_to_value(block: &ContentBlock) -> Option<Value> {
    match block {
        ContentBlock::Text(text) => {
            let mut value = json!({
                "_type": "block",
                "_key": text.key,
                "style": text.style.as_str(),
                "children": text.children.iter().map(|span| json!({
                    "_type": "span",
                    "_key": span.key,
                    "text": span.text,
                    "marks": span.marks,
                })).collect::<Vec<_>>(),
                "markDefs": text.mark_defs.iter().map(|def| json!({
                    "_type": "link",
                    "_key": def.key,
                    "href": def.href,
                })).collect::<Vec<_>>(),
            });
            if let Some(marker) = text.list_item {
                value["listItem"] = json!(marker.as_str());
            }
            Some(value)
        }
        ContentBlock::Image(image) => match &image.source {
            AssetSource::Stable { asset_id } => Some(json!({
                "_type": "embeddedImage",
                "_key": image.key,
                "alt": image.alt,
                "caption": image.caption,
                "attribution": image.attribution,
                "asset": { "_type": "reference", "_ref": asset_id },
            })),
            // An unresolved asset reference cannot be written; the publish
            // pipeline resolves or drops these before the document write.
            AssetSource::Pending { .. } => None,
        },
        ContentBlock::Video(video) => Some(json!({
            "_type": "embeddedVideo",
            "_key": video.key,
            "url": video.url,
            "caption": video.caption,
        })),
    }
}
