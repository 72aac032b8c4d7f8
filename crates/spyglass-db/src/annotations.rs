//! Annotation layer: highlights and notes.
//!
//! Annotations are private per-user views over a shared canonical
//! article: listing is always scoped to the authoring user. A note
//! references an article directly or through a highlight; in the latter
//! case the article id is resolved and stored, so cascades and listing
//! never need to walk the highlight.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use spyglass_core::{
    new_v7, AnnotationRepository, CreateHighlightRequest, CreateNoteRequest, Error, Highlight,
    Note, Result,
};

/// SQLite implementation of [`AnnotationRepository`].
pub struct SqliteAnnotationRepository {
    pool: SqlitePool,
}

impl SqliteAnnotationRepository {
    /// Create a new SqliteAnnotationRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_highlight_opt(&self, id: Uuid) -> Result<Option<Highlight>> {
        let row = sqlx::query(
            "SELECT id, article_id, user_id, start_pos, end_pos, created_at_utc
             FROM highlight WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(map_highlight_row))
    }
}

fn map_highlight_row(row: &SqliteRow) -> Highlight {
    Highlight {
        id: row.get("id"),
        article_id: row.get("article_id"),
        user_id: row.get("user_id"),
        start_pos: row.get("start_pos"),
        end_pos: row.get("end_pos"),
        created_at_utc: row.get("created_at_utc"),
    }
}

fn map_note_row(row: &SqliteRow) -> Note {
    Note {
        id: row.get("id"),
        article_id: row.get("article_id"),
        highlight_id: row.get("highlight_id"),
        user_id: row.get("user_id"),
        content: row.get("content"),
        created_at_utc: row.get("created_at_utc"),
    }
}

#[async_trait]
impl AnnotationRepository for SqliteAnnotationRepository {
    async fn create_highlight(&self, req: CreateHighlightRequest) -> Result<Highlight> {
        // Read and insert share one transaction, so the article cannot
        // vanish between the bounds check and the write.
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let content: Option<String> = sqlx::query_scalar("SELECT content FROM article WHERE id = ?")
            .bind(req.article_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;

        let content = content.ok_or(Error::ArticleNotFound(req.article_id))?;
        // Offsets are character positions into the canonical text.
        let content_len = content.chars().count() as i64;

        if req.start_pos < 0 || req.start_pos >= req.end_pos || req.end_pos > content_len {
            return Err(Error::InvalidRange {
                start: req.start_pos,
                end: req.end_pos,
                content_len,
            });
        }

        let highlight = Highlight {
            id: new_v7(),
            article_id: req.article_id,
            user_id: req.user_id,
            start_pos: req.start_pos,
            end_pos: req.end_pos,
            created_at_utc: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO highlight (id, article_id, user_id, start_pos, end_pos, created_at_utc)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(highlight.id)
        .bind(highlight.article_id)
        .bind(highlight.user_id)
        .bind(highlight.start_pos)
        .bind(highlight.end_pos)
        .bind(highlight.created_at_utc)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(highlight)
    }

    async fn fetch_highlight(&self, id: Uuid) -> Result<Highlight> {
        self.fetch_highlight_opt(id)
            .await?
            .ok_or(Error::HighlightNotFound(id))
    }

    async fn list_highlights(&self, article_id: Uuid, user_id: Uuid) -> Result<Vec<Highlight>> {
        let rows = sqlx::query(
            "SELECT id, article_id, user_id, start_pos, end_pos, created_at_utc
             FROM highlight
             WHERE article_id = ? AND user_id = ?
             ORDER BY created_at_utc, id",
        )
        .bind(article_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_highlight_row).collect())
    }

    async fn delete_highlight(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM highlight WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::HighlightNotFound(id));
        }
        info!(highlight_id = %id, "highlight deleted");
        Ok(())
    }

    async fn create_note(&self, req: CreateNoteRequest) -> Result<Note> {
        // Resolve the anchor: exactly one of article/highlight, or a
        // consistent pair. Missing referenced entities are reference
        // errors, not lookups the caller could act on.
        let (article_id, highlight_id) = match (req.article_id, req.highlight_id) {
            (None, None) => {
                return Err(Error::InvalidReference(
                    "a note must reference an article or a highlight".to_string(),
                ))
            }
            (Some(article_id), None) => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM article WHERE id = ?)")
                        .bind(article_id)
                        .fetch_one(&self.pool)
                        .await
                        .map_err(Error::Database)?;
                if !exists {
                    return Err(Error::InvalidReference(format!(
                        "article {} does not exist",
                        article_id
                    )));
                }
                (article_id, None)
            }
            (None, Some(highlight_id)) => {
                let highlight = self.fetch_highlight_opt(highlight_id).await?.ok_or_else(|| {
                    Error::InvalidReference(format!("highlight {} does not exist", highlight_id))
                })?;
                (highlight.article_id, Some(highlight_id))
            }
            (Some(article_id), Some(highlight_id)) => {
                let highlight = self.fetch_highlight_opt(highlight_id).await?.ok_or_else(|| {
                    Error::InvalidReference(format!("highlight {} does not exist", highlight_id))
                })?;
                if highlight.article_id != article_id {
                    return Err(Error::InvalidReference(format!(
                        "highlight {} does not belong to article {}",
                        highlight_id, article_id
                    )));
                }
                (article_id, Some(highlight_id))
            }
        };

        let note = Note {
            id: new_v7(),
            article_id,
            highlight_id,
            user_id: req.user_id,
            content: req.content,
            created_at_utc: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO note (id, article_id, highlight_id, user_id, content, created_at_utc)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(note.id)
        .bind(note.article_id)
        .bind(note.highlight_id)
        .bind(note.user_id)
        .bind(&note.content)
        .bind(note.created_at_utc)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(note)
    }

    async fn list_notes(&self, article_id: Uuid, user_id: Uuid) -> Result<Vec<Note>> {
        let rows = sqlx::query(
            "SELECT id, article_id, highlight_id, user_id, content, created_at_utc
             FROM note
             WHERE article_id = ? AND user_id = ?
             ORDER BY created_at_utc, id",
        )
        .bind(article_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_note_row).collect())
    }

    async fn delete_note(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }
}
