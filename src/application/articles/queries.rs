use uuid::Uuid;

use crate::application::articles::{ArticleError, ArticleService};
use crate::domain::entities::ArticleRecord;
use crate::domain::types::Actor;

impl ArticleService {
    /// Fetch one article. Writers see only their own; editors see all.
    pub async fn article(&self, actor: Actor, id: Uuid) -> Result<ArticleRecord, ArticleError> {
        let article = self.articles_repo().article_by_id(id).await?;
        if !actor.is_editor() && article.owner_id != actor.id {
            // Hidden rather than forbidden: writers cannot probe for the
            // existence of other writers' drafts.
            return Err(ArticleError::NotFound);
        }
        Ok(article)
    }

    /// All drafts owned by the acting writer, most recently updated first.
    pub async fn own_articles(&self, actor: Actor) -> Result<Vec<ArticleRecord>, ArticleError> {
        Ok(self.articles_repo().articles_by_owner(actor.id).await?)
    }

    /// The editorial review queue; editors only.
    pub async fn review_queue(&self, actor: Actor) -> Result<Vec<ArticleRecord>, ArticleError> {
        if !actor.is_editor() {
            return Err(ArticleError::Forbidden);
        }
        Ok(self.articles_repo().review_queue().await?)
    }
}
