//! Ingestion pipeline: fingerprint → resolve → link ownership.
//!
//! State-free orchestration over the canonical article store and the
//! ownership ledger. Resolution and membership linking run inside one
//! sqlx transaction, so a freshly created article never becomes durable
//! without its first owner. Dropping the returned future mid-flight rolls
//! the transaction back (sqlx guard), and the fingerprint UNIQUE
//! constraint remains the backstop either way.

use std::time::{Duration, Instant};

use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use spyglass_core::{
    ArticleKind, CreateArticleRequest, Error, Extractor, Resolution, Result,
};

use crate::articles;
use crate::library;

/// How many times a contended ingest transaction is retried before the
/// storage error is surfaced.
const MAX_CONTENTION_RETRIES: u32 = 5;

/// Submission handed to [`IngestService::ingest`].
///
/// `content` is already extraction-normalized text; raw documents go
/// through [`IngestService::ingest_document`] instead.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub content: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub blurb: Option<String>,
    pub raw_document: Option<String>,
    pub kind: ArticleKind,
}

impl IngestRequest {
    /// Submission of externally-sourced content.
    pub fn external(content: impl Into<String>, url: Option<String>) -> Self {
        Self {
            content: content.into(),
            url,
            title: None,
            blurb: None,
            raw_document: None,
            kind: ArticleKind::External,
        }
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the short summary.
    pub fn blurb(mut self, blurb: impl Into<String>) -> Self {
        self.blurb = Some(blurb.into());
        self
    }
}

/// Ingestion pipeline over a shared connection pool.
pub struct IngestService {
    pool: SqlitePool,
}

impl IngestService {
    /// Create a new IngestService with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ingest already-extracted article content for a user.
    ///
    /// Resolves the content against the canonical store (creating a row
    /// only on a miss) and upserts the user's ownership ledger entry, all
    /// in one transaction. Returns the canonical article plus whether
    /// this call created it.
    pub async fn ingest(&self, user_id: Uuid, req: IngestRequest) -> Result<Resolution> {
        if req.content.is_empty() {
            return Err(Error::EmptyContent);
        }

        let started = Instant::now();
        let mut attempt = 0;
        let resolution = loop {
            match self.try_ingest(user_id, &req).await {
                Ok(resolution) => break resolution,
                Err(Error::Database(e))
                    if is_lock_contention(&e) && attempt < MAX_CONTENTION_RETRIES =>
                {
                    attempt += 1;
                    warn!(%user_id, attempt, "ingest transaction contended, retrying");
                    tokio::time::sleep(Duration::from_millis(20 * attempt as u64)).await;
                }
                Err(e) => return Err(e),
            }
        };

        info!(
            %user_id,
            article_id = %resolution.article.id,
            created = resolution.created,
            duration_ms = started.elapsed().as_millis() as u64,
            "ingest complete"
        );
        Ok(resolution)
    }

    /// Run a raw document through the extraction collaborator, then
    /// ingest the normalized text with the raw capture retained.
    ///
    /// Documents the collaborator rejects are never stored.
    pub async fn ingest_document(
        &self,
        user_id: Uuid,
        raw_document: &str,
        url: Option<String>,
        extractor: &dyn Extractor,
    ) -> Result<Resolution> {
        let extraction = extractor.extract(raw_document).await?;
        if !extraction.is_article {
            return Err(Error::NotAnArticle(
                url.unwrap_or_else(|| "submitted document".to_string()),
            ));
        }

        let mut req = IngestRequest::external(extraction.text, url);
        req.title = extraction.title;
        req.raw_document = Some(raw_document.to_string());
        self.ingest(user_id, req).await
    }

    async fn try_ingest(&self, user_id: Uuid, req: &IngestRequest) -> Result<Resolution> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let user_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM user WHERE id = ?)")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::Database)?;
        if !user_exists {
            return Err(Error::UserNotFound(user_id));
        }

        let resolution = articles::resolve_or_create(
            &mut tx,
            &CreateArticleRequest {
                content: req.content.clone(),
                url: req.url.clone(),
                title: req.title.clone(),
                blurb: req.blurb.clone(),
                raw_document: req.raw_document.clone(),
                kind: req.kind,
            },
        )
        .await?;

        library::ensure_membership(&mut tx, user_id, resolution.article.id).await?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(resolution)
    }
}

/// SQLite write-lock contention: SQLITE_BUSY (5), SQLITE_BUSY_RECOVERY
/// (261), SQLITE_BUSY_SNAPSHOT (517). A deferred transaction that read
/// before writing can hit the snapshot case even with a busy timeout set.
fn is_lock_contention(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            matches!(db.code().as_deref(), Some("5") | Some("261") | Some("517"))
        }
        _ => false,
    }
}
