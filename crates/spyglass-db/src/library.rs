//! Ownership ledger implementation.
//!
//! Many-to-many user ↔ article membership. The composite primary key on
//! `library(user_id, article_id)` makes membership a set: duplicate
//! inserts, concurrent or not, land on `ON CONFLICT DO NOTHING`.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use spyglass_core::{ArticleKind, ArticleSummary, Error, LibraryRepository, Result};

/// SQLite implementation of [`LibraryRepository`].
pub struct SqliteLibraryRepository {
    pool: SqlitePool,
}

impl SqliteLibraryRepository {
    /// Create a new SqliteLibraryRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Transaction-scoped membership upsert, shared with the ingestion
/// pipeline. Returns `true` when the row was newly inserted.
pub(crate) async fn ensure_membership(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    article_id: Uuid,
) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO library (user_id, article_id, added_at_utc)
         VALUES (?, ?, ?)
         ON CONFLICT(user_id, article_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(article_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(Error::Database)?;

    let inserted = result.rows_affected() == 1;
    if !inserted {
        debug!(%user_id, %article_id, "membership already present");
    }
    Ok(inserted)
}

#[async_trait]
impl LibraryRepository for SqliteLibraryRepository {
    async fn ensure_membership(&self, user_id: Uuid, article_id: Uuid) -> Result<bool> {
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        ensure_membership(&mut conn, user_id, article_id).await
    }

    async fn is_member(&self, user_id: Uuid, article_id: Uuid) -> Result<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM library WHERE user_id = ? AND article_id = ?)",
        )
        .bind(user_id)
        .bind(article_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn list_articles(&self, user_id: Uuid) -> Result<Vec<ArticleSummary>> {
        let rows = sqlx::query(
            "SELECT a.id, a.title, a.blurb, a.kind, a.created_at_utc, a.updated_at_utc
             FROM article a
             JOIN library l ON l.article_id = a.id
             WHERE l.user_id = ?
             ORDER BY l.added_at_utc DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter()
            .map(|row| {
                let kind_str: String = row.get("kind");
                let kind = ArticleKind::parse(&kind_str).ok_or_else(|| {
                    Error::Internal(format!("unknown article kind '{}' in store", kind_str))
                })?;
                Ok(ArticleSummary {
                    id: row.get("id"),
                    title: row.get("title"),
                    blurb: row.get("blurb"),
                    kind,
                    created_at_utc: row.get("created_at_utc"),
                    updated_at_utc: row.get("updated_at_utc"),
                })
            })
            .collect()
    }

    async fn owner_count(&self, article_id: Uuid) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM library WHERE article_id = ?")
            .bind(article_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}
