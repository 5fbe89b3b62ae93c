//! Advisory-lock publish leases.
//!
//! Session-level advisory locks tie the lease to a dedicated pooled
//! connection: the lock survives until explicitly released, and a crashed
//! process drops the connection, which releases the lock server-side.

use async_trait::async_trait;
use sqlx::{
    PgPool,
    pool::PoolConnection,
    postgres::Postgres,
};
use tracing::warn;
use uuid::Uuid;

use crate::application::repos::{PublishLease, PublishLocks, RepoError};

use super::map_sqlx_error;

#[derive(Clone)]
pub struct PgPublishLocks {
    pool: PgPool,
}

impl PgPublishLocks {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Advisory lock keyspace is i64; fold the article id down to its first
/// eight bytes. Collisions only over-serialize, never under-serialize.
fn lock_key(article_id: Uuid) -> i64 {
    let bytes = article_id.as_bytes();
    let mut head = [0u8; 8];
    head.copy_from_slice(&bytes[..8]);
    i64::from_be_bytes(head)
}

struct PgPublishLease {
    conn: Option<PoolConnection<Postgres>>,
    key: i64,
}

#[async_trait]
impl PublishLease for PgPublishLease {
    async fn release(mut self: Box<Self>) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };
        let unlocked = sqlx::query_scalar::<_, bool>("SELECT pg_advisory_unlock($1)")
            .bind(self.key)
            .fetch_one(conn.as_mut())
            .await;
        match unlocked {
            Ok(true) => {}
            Ok(false) => warn!(
                target = "infra::db::locks",
                key = self.key,
                "advisory unlock reported no lock held"
            ),
            // The lock may still be held; close the session instead of
            // returning the connection to the pool.
            Err(err) => {
                drop(conn.detach());
                warn!(
                    target = "infra::db::locks",
                    key = self.key,
                    error = %err,
                    "advisory unlock failed; connection detached so the lock dies with it"
                );
            }
        }
    }
}

impl Drop for PgPublishLease {
    fn drop(&mut self) {
        // A lease dropped without release still holds the session lock.
        // Detach the connection so it dies with the lock instead of
        // returning to the pool permanently locked.
        if let Some(conn) = self.conn.take() {
            drop(conn.detach());
            warn!(
                target = "infra::db::locks",
                key = self.key,
                "publish lease dropped without release; connection detached"
            );
        }
    }
}

#[async_trait]
impl PublishLocks for PgPublishLocks {
    async fn try_lock(
        &self,
        article_id: Uuid,
    ) -> Result<Option<Box<dyn PublishLease>>, RepoError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        let key = lock_key(article_id);

        let acquired = sqlx::query_scalar::<_, bool>("SELECT pg_try_advisory_lock($1)")
            .bind(key)
            .fetch_one(conn.as_mut())
            .await
            .map_err(map_sqlx_error)?;

        if acquired {
            Ok(Some(Box::new(PgPublishLease {
                conn: Some(conn),
                key,
            })))
        } else {
            Ok(None)
        }
    }
}
