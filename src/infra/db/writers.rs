use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use crate::application::repos::{RepoError, WritersRepo};
use crate::domain::entities::WriterProfileRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(Debug, FromRow)]
struct WriterRow {
    id: Uuid,
    display_name: String,
    lake_author_ref: String,
}

#[async_trait]
impl WritersRepo for PostgresRepositories {
    async fn writer_profile(&self, id: Uuid) -> Result<WriterProfileRecord, RepoError> {
        let row = sqlx::query_as::<_, WriterRow>(
            "SELECT id, display_name, lake_author_ref FROM writer_profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        Ok(WriterProfileRecord {
            id: row.id,
            display_name: row.display_name,
            lake_author_ref: row.lake_author_ref,
        })
    }
}
