//! # spyglass-db
//!
//! SQLite database layer for spyglass.
//!
//! This crate provides:
//! - Connection pool management (WAL mode, foreign keys enforced)
//! - Idempotent schema bootstrap
//! - Repository implementations for all core entities
//! - The ingestion pipeline tying fingerprinting, canonical resolution,
//!   and ownership linking into one transaction
//!
//! All dedup exclusion is expressed as storage constraints: the UNIQUE
//! index on `article.fingerprint` and the composite primary key on the
//! `library` ledger are the backstop for every lookup-then-insert race.
//!
//! ## Example
//!
//! ```rust,ignore
//! use spyglass_db::{Database, IngestRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:spyglass.db").await?;
//!
//!     let resolution = db
//!         .ingest
//!         .ingest(user_id, IngestRequest::external("Article text", None))
//!         .await?;
//!
//!     println!("article {} (created: {})", resolution.article.id, resolution.created);
//!     Ok(())
//! }
//! ```

pub mod annotations;
pub mod articles;
pub mod ingest;
pub mod library;
pub mod pool;
pub mod schema;
pub mod users;

// Test fixtures for integration tests.
// Always compiled so integration tests (in tests/) can use TestDatabase.
pub mod test_fixtures;

// Re-export core types
pub use spyglass_core::*;

// Re-export repository implementations
pub use annotations::SqliteAnnotationRepository;
pub use articles::SqliteArticleRepository;
pub use ingest::{IngestRequest, IngestService};
pub use library::SqliteLibraryRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use schema::init_schema;
pub use users::SqliteUserRepository;

use sqlx::SqlitePool;

/// Bundle of the connection pool and one repository per entity.
pub struct Database {
    pub pool: SqlitePool,
    pub users: SqliteUserRepository,
    pub articles: SqliteArticleRepository,
    pub library: SqliteLibraryRepository,
    pub annotations: SqliteAnnotationRepository,
    pub ingest: IngestService,
}

impl Database {
    /// Connect to the database at `url` and ensure the schema exists.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        init_schema(&pool).await?;
        Ok(Self::with_pool(pool))
    }

    /// Build a database handle over an existing pool.
    ///
    /// The caller is responsible for having run [`init_schema`].
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self {
            users: SqliteUserRepository::new(pool.clone()),
            articles: SqliteArticleRepository::new(pool.clone()),
            library: SqliteLibraryRepository::new(pool.clone()),
            annotations: SqliteAnnotationRepository::new(pool.clone()),
            ingest: IngestService::new(pool.clone()),
            pool,
        }
    }
}
