//! Idempotent schema bootstrap.
//!
//! The DDL here carries the invariants the rest of the crate leans on:
//! - `article.fingerprint` is UNIQUE — the dedup backstop for every
//!   lookup-then-insert race, across connections and processes.
//! - `library` has a composite primary key, so membership is a set, not a
//!   multiset.
//! - Deleting an article cascades through its highlights, notes, and
//!   ledger rows; deleting a highlight cascades to its notes.

use sqlx::SqlitePool;

use spyglass_core::{Error, Result};

/// Create all tables and indexes if they do not exist.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user (
            id BLOB PRIMARY KEY,
            external_id TEXT NOT NULL UNIQUE,
            username TEXT NOT NULL UNIQUE,
            display_name TEXT,
            email TEXT,
            created_at_utc TEXT NOT NULL,
            updated_at_utc TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(Error::Database)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS article (
            id BLOB PRIMARY KEY,
            title TEXT,
            blurb TEXT,
            content TEXT NOT NULL,
            raw_document TEXT,
            url TEXT,
            kind TEXT NOT NULL DEFAULT 'external',
            fingerprint TEXT NOT NULL UNIQUE,
            created_at_utc TEXT NOT NULL,
            updated_at_utc TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(Error::Database)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS library (
            user_id BLOB NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            article_id BLOB NOT NULL REFERENCES article(id) ON DELETE CASCADE,
            added_at_utc TEXT NOT NULL,
            PRIMARY KEY (user_id, article_id)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(Error::Database)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS highlight (
            id BLOB PRIMARY KEY,
            article_id BLOB NOT NULL REFERENCES article(id) ON DELETE CASCADE,
            user_id BLOB NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            start_pos INTEGER NOT NULL,
            end_pos INTEGER NOT NULL,
            created_at_utc TEXT NOT NULL,
            CHECK (start_pos >= 0 AND start_pos < end_pos)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(Error::Database)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS note (
            id BLOB PRIMARY KEY,
            article_id BLOB NOT NULL REFERENCES article(id) ON DELETE CASCADE,
            highlight_id BLOB REFERENCES highlight(id) ON DELETE CASCADE,
            user_id BLOB NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            content TEXT NOT NULL,
            created_at_utc TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(Error::Database)?;

    for ddl in [
        "CREATE INDEX IF NOT EXISTS idx_article_url ON article(url)",
        "CREATE INDEX IF NOT EXISTS idx_library_article ON library(article_id)",
        "CREATE INDEX IF NOT EXISTS idx_highlight_article ON highlight(article_id)",
        "CREATE INDEX IF NOT EXISTS idx_note_article ON note(article_id)",
        "CREATE INDEX IF NOT EXISTS idx_note_highlight ON note(highlight_id)",
    ] {
        sqlx::query(ddl).execute(pool).await.map_err(Error::Database)?;
    }

    Ok(())
}
