//! Test fixtures for database integration tests.
//!
//! Provides a throwaway SQLite database per test, with the schema
//! initialized and a helper for seeding users.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use spyglass_db::test_fixtures::TestDatabase;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let test_db = TestDatabase::new().await;
//!     let user = test_db.create_user("alice").await;
//!
//!     // Run your tests against test_db.db ...
//!
//!     test_db.cleanup().await;
//! }
//! ```

use std::path::PathBuf;

use uuid::Uuid;

use spyglass_core::logging;
use spyglass_core::{EnsureUserRequest, User, UserRepository};

use crate::Database;

/// A database backed by a unique file under the OS temp dir, removed on
/// cleanup (or best-effort on drop).
pub struct TestDatabase {
    pub db: Database,
    path: PathBuf,
}

impl TestDatabase {
    /// Create a fresh database with the schema initialized.
    pub async fn new() -> Self {
        logging::init();

        let path = std::env::temp_dir().join(format!("spyglass-test-{}.db", Uuid::new_v4()));
        let url = format!("sqlite:{}", path.display());
        let db = Database::connect(&url)
            .await
            .expect("Failed to create test database");

        Self { db, path }
    }

    /// Seed a user as if they had just authenticated externally.
    pub async fn create_user(&self, username: &str) -> User {
        self.db
            .users
            .ensure_from_identity(EnsureUserRequest {
                external_id: format!("test-idp|{}", username),
                username: username.to_string(),
                display_name: None,
                email: Some(format!("{}@example.com", username)),
            })
            .await
            .expect("Failed to seed test user")
    }

    /// Close the pool and remove the database files.
    pub async fn cleanup(self) {
        self.db.pool.close().await;
        remove_db_files(&self.path);
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        // Unlink is safe on still-open handles; tests that skip cleanup()
        // just lose the eager close.
        remove_db_files(&self.path);
    }
}

fn remove_db_files(path: &PathBuf) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}
