//! User repository implementation.
//!
//! Accounts are driven by the external identity collaborator: a user row
//! is created the first time an authenticated identity shows up, and only
//! its profile fields are refreshed afterwards.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use spyglass_core::{new_v7, EnsureUserRequest, Error, Result, User, UserRepository};

/// SQLite implementation of [`UserRepository`].
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    /// Create a new SqliteUserRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn map_user_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        external_id: row.get("external_id"),
        username: row.get("username"),
        display_name: row.get("display_name"),
        email: row.get("email"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn ensure_from_identity(&self, req: EnsureUserRequest) -> Result<User> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO user (id, external_id, username, display_name, email, \
                               created_at_utc, updated_at_utc)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(external_id) DO UPDATE SET
                 username = excluded.username,
                 display_name = excluded.display_name,
                 email = excluded.email,
                 updated_at_utc = excluded.updated_at_utc",
        )
        .bind(new_v7())
        .bind(&req.external_id)
        .bind(&req.username)
        .bind(&req.display_name)
        .bind(&req.email)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        let row = sqlx::query(
            "SELECT id, external_id, username, display_name, email, \
                    created_at_utc, updated_at_utc
             FROM user WHERE external_id = ?",
        )
        .bind(&req.external_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let user = map_user_row(&row);
        // Fresh inserts carry identical timestamps; updates touch only
        // updated_at_utc.
        if user.created_at_utc == user.updated_at_utc {
            info!(user_id = %user.id, "user created from external identity");
        }
        Ok(user)
    }

    async fn fetch(&self, id: Uuid) -> Result<User> {
        let row = sqlx::query(
            "SELECT id, external_id, username, display_name, email, \
                    created_at_utc, updated_at_utc
             FROM user WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => Ok(map_user_row(&row)),
            None => Err(Error::UserNotFound(id)),
        }
    }
}
