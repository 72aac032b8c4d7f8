//! Canonical article store implementation.
//!
//! One row per distinct content fingerprint. Resolution deliberately
//! matches on fingerprint OR url: the same article captured twice with
//! slightly different extraction output collapses via the url, and the
//! same text reached through two urls collapses via the fingerprint.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use spyglass_core::{
    fingerprint, new_v7, Article, ArticleKind, ArticleRepository, CreateArticleRequest, Error,
    Resolution, Result,
};

/// How many times a losing creator re-queries for the winning row before
/// giving up with [`Error::ConflictRetryExhausted`].
const MAX_CONFLICT_RETRIES: u32 = 3;

const ARTICLE_COLUMNS: &str = "id, title, blurb, content, raw_document, url, kind, fingerprint, \
                               created_at_utc, updated_at_utc";

/// SQLite implementation of [`ArticleRepository`].
pub struct SqliteArticleRepository {
    pool: SqlitePool,
}

impl SqliteArticleRepository {
    /// Create a new SqliteArticleRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

pub(crate) fn map_article_row(row: &SqliteRow) -> Result<Article> {
    let kind_str: String = row.get("kind");
    let kind = ArticleKind::parse(&kind_str)
        .ok_or_else(|| Error::Internal(format!("unknown article kind '{}' in store", kind_str)))?;

    Ok(Article {
        id: row.get("id"),
        title: row.get("title"),
        blurb: row.get("blurb"),
        content: row.get("content"),
        raw_document: row.get("raw_document"),
        url: row.get("url"),
        kind,
        fingerprint: row.get("fingerprint"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
    })
}

/// Look up the canonical row a submission collapses onto, if any.
///
/// When fingerprint and url match two different rows, the exact-content
/// match wins.
pub(crate) async fn find_canonical(
    conn: &mut SqliteConnection,
    content_fingerprint: &str,
    url: Option<&str>,
) -> Result<Option<Article>> {
    let query = format!(
        "SELECT {} FROM article
         WHERE fingerprint = ?1 OR (?2 IS NOT NULL AND url = ?2)
         ORDER BY CASE WHEN fingerprint = ?1 THEN 0 ELSE 1 END, created_at_utc
         LIMIT 1",
        ARTICLE_COLUMNS
    );
    let row = sqlx::query(&query)
        .bind(content_fingerprint)
        .bind(url)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Error::Database)?;

    row.as_ref().map(map_article_row).transpose()
}

/// Transaction-scoped resolve-or-create, shared with the ingestion
/// pipeline so article creation and ownership linking can commit together.
///
/// First committed writer wins: on a resolution hit the request's metadata
/// is discarded and nothing is written. The insert goes through
/// `ON CONFLICT(fingerprint) DO NOTHING`, so a racing duplicate never
/// becomes durable; losing the race means looping back to re-query the
/// winner's row.
pub(crate) async fn resolve_or_create(
    conn: &mut SqliteConnection,
    req: &CreateArticleRequest,
) -> Result<Resolution> {
    let content_fingerprint = fingerprint(&req.content);

    for attempt in 0..=MAX_CONFLICT_RETRIES {
        if attempt > 0 {
            debug!(
                fingerprint = %content_fingerprint,
                attempt,
                "lost creation race, re-resolving"
            );
        }

        if let Some(existing) = find_canonical(conn, &content_fingerprint, req.url.as_deref()).await?
        {
            debug!(
                article_id = %existing.id,
                fingerprint = %content_fingerprint,
                "submission collapsed onto existing article"
            );
            return Ok(Resolution {
                article: existing,
                created: false,
            });
        }

        let id = new_v7();
        let now = Utc::now();
        let inserted = sqlx::query(
            "INSERT INTO article (id, title, blurb, content, raw_document, url, kind, \
                                  fingerprint, created_at_utc, updated_at_utc)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(fingerprint) DO NOTHING",
        )
        .bind(id)
        .bind(&req.title)
        .bind(&req.blurb)
        .bind(&req.content)
        .bind(&req.raw_document)
        .bind(&req.url)
        .bind(req.kind.as_str())
        .bind(&content_fingerprint)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(Error::Database)?;

        if inserted.rows_affected() == 1 {
            info!(article_id = %id, fingerprint = %content_fingerprint, "article created");
            return Ok(Resolution {
                article: Article {
                    id,
                    title: req.title.clone(),
                    blurb: req.blurb.clone(),
                    content: req.content.clone(),
                    raw_document: req.raw_document.clone(),
                    url: req.url.clone(),
                    kind: req.kind,
                    fingerprint: content_fingerprint,
                    created_at_utc: now,
                    updated_at_utc: now,
                },
                created: true,
            });
        }
        // A concurrent writer committed this fingerprint first; the next
        // iteration resolves their row.
    }

    Err(Error::ConflictRetryExhausted(format!(
        "fingerprint {}",
        content_fingerprint
    )))
}

#[async_trait]
impl ArticleRepository for SqliteArticleRepository {
    async fn resolve_or_create(&self, req: CreateArticleRequest) -> Result<Resolution> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let resolution = resolve_or_create(&mut tx, &req).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(resolution)
    }

    async fn fetch(&self, id: Uuid) -> Result<Article> {
        let query = format!("SELECT {} FROM article WHERE id = ?", ARTICLE_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        match row {
            Some(row) => map_article_row(&row),
            None => Err(Error::ArticleNotFound(id)),
        }
    }

    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Article>> {
        let query = format!(
            "SELECT {} FROM article WHERE fingerprint = ?",
            ARTICLE_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(fingerprint)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.as_ref().map(map_article_row).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM article WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::ArticleNotFound(id));
        }
        info!(article_id = %id, "article deleted");
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM article")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}
