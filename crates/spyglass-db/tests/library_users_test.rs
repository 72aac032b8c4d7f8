//! Ownership ledger and user upsert behavior.

use spyglass_db::test_fixtures::TestDatabase;
use spyglass_db::{
    ArticleKind, ArticleRepository, CreateArticleRequest, EnsureUserRequest, Error,
    IngestRequest, LibraryRepository, UserRepository,
};
use uuid::Uuid;

#[tokio::test]
async fn test_ensure_membership_is_idempotent() {
    let test_db = TestDatabase::new().await;
    let user = test_db.create_user("alice").await;

    let article = test_db
        .db
        .articles
        .resolve_or_create(CreateArticleRequest {
            content: "Ledger target".to_string(),
            url: None,
            title: None,
            blurb: None,
            raw_document: None,
            kind: ArticleKind::External,
        })
        .await
        .unwrap()
        .article;

    let first = test_db
        .db
        .library
        .ensure_membership(user.id, article.id)
        .await
        .unwrap();
    let second = test_db
        .db
        .library
        .ensure_membership(user.id, article.id)
        .await
        .unwrap();

    assert!(first, "first call inserts");
    assert!(!second, "second call is a no-op");
    assert_eq!(test_db.db.library.owner_count(article.id).await.unwrap(), 1);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_list_articles_most_recent_first() {
    let test_db = TestDatabase::new().await;
    let user = test_db.create_user("alice").await;

    let first = test_db
        .db
        .ingest
        .ingest(
            user.id,
            IngestRequest::external("Older save", None).title("Older"),
        )
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = test_db
        .db
        .ingest
        .ingest(
            user.id,
            IngestRequest::external("Newer save", None).title("Newer"),
        )
        .await
        .unwrap();

    let library = test_db.db.library.list_articles(user.id).await.unwrap();
    assert_eq!(library.len(), 2);
    assert_eq!(library[0].id, second.article.id);
    assert_eq!(library[0].title.as_deref(), Some("Newer"));
    assert_eq!(library[1].id, first.article.id);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_resolve_or_create_standalone() {
    let test_db = TestDatabase::new().await;

    let req = CreateArticleRequest {
        content: "Standalone canonical text".to_string(),
        url: Some("http://example.com/standalone".to_string()),
        title: Some("Standalone".to_string()),
        blurb: None,
        raw_document: None,
        kind: ArticleKind::Private,
    };

    let first = test_db.db.articles.resolve_or_create(req.clone()).await.unwrap();
    assert!(first.created);
    assert!(first.article.fingerprint.starts_with("sha256:"));
    assert_eq!(first.article.kind, ArticleKind::Private);

    let second = test_db.db.articles.resolve_or_create(req).await.unwrap();
    assert!(!second.created);
    assert_eq!(second.article.id, first.article.id);
    assert_eq!(
        test_db.db.library.owner_count(first.article.id).await.unwrap(),
        0,
        "the store alone never writes ledger rows"
    );

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_user_upsert_refreshes_profile_only() {
    let test_db = TestDatabase::new().await;

    let created = test_db
        .db
        .users
        .ensure_from_identity(EnsureUserRequest {
            external_id: "idp|alice".to_string(),
            username: "alice".to_string(),
            display_name: None,
            email: None,
        })
        .await
        .unwrap();

    let updated = test_db
        .db
        .users
        .ensure_from_identity(EnsureUserRequest {
            external_id: "idp|alice".to_string(),
            username: "alice".to_string(),
            display_name: Some("Alice A.".to_string()),
            email: Some("alice@example.com".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(created.id, updated.id, "identity maps to one stable account");
    assert_eq!(updated.display_name.as_deref(), Some("Alice A."));
    assert_eq!(updated.email.as_deref(), Some("alice@example.com"));
    assert_eq!(created.created_at_utc, updated.created_at_utc);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_fetch_user_not_found() {
    let test_db = TestDatabase::new().await;

    let ghost = Uuid::new_v4();
    let result = test_db.db.users.fetch(ghost).await;
    assert!(matches!(result, Err(Error::UserNotFound(id)) if id == ghost));

    test_db.cleanup().await;
}
