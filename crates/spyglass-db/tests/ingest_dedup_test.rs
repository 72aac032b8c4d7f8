//! Ingestion pipeline and canonical dedup behavior.

use async_trait::async_trait;
use spyglass_db::test_fixtures::TestDatabase;
use spyglass_db::{
    fingerprint, ArticleRepository, Error, Extraction, Extractor, IngestRequest,
    LibraryRepository, Result,
};
use uuid::Uuid;

#[tokio::test]
async fn test_ingest_is_idempotent_for_same_user() {
    let test_db = TestDatabase::new().await;
    let user = test_db.create_user("alice").await;

    let first = test_db
        .db
        .ingest
        .ingest(user.id, IngestRequest::external("Some article text", None))
        .await
        .expect("first ingest should succeed");
    assert!(first.created);

    let second = test_db
        .db
        .ingest
        .ingest(user.id, IngestRequest::external("Some article text", None))
        .await
        .expect("second ingest should succeed");

    assert!(!second.created, "identical content must not create again");
    assert_eq!(first.article.id, second.article.id);
    assert_eq!(
        test_db.db.articles.count().await.unwrap(),
        1,
        "exactly one canonical row per fingerprint"
    );
    assert_eq!(
        test_db.db.library.owner_count(first.article.id).await.unwrap(),
        1,
        "membership is a set, not a multiset"
    );

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_two_users_same_text_share_one_article() {
    let test_db = TestDatabase::new().await;
    let u1 = test_db.create_user("alice").await;
    let u2 = test_db.create_user("bob").await;

    let p1 = test_db
        .db
        .ingest
        .ingest(
            u1.id,
            IngestRequest::external("The quick fox", Some("http://a".to_string())),
        )
        .await
        .expect("u1 ingest should succeed");
    assert!(p1.created);
    assert!(test_db.db.library.is_member(u1.id, p1.article.id).await.unwrap());

    let p2 = test_db
        .db
        .ingest
        .ingest(
            u2.id,
            IngestRequest::external("The quick fox", Some("http://b".to_string())),
        )
        .await
        .expect("u2 ingest should succeed");

    assert!(!p2.created, "identical text from another url must collapse");
    assert_eq!(p1.article.id, p2.article.id);
    assert_eq!(test_db.db.articles.count().await.unwrap(), 1);
    assert_eq!(test_db.db.library.owner_count(p1.article.id).await.unwrap(), 2);
    assert!(test_db.db.library.is_member(u2.id, p1.article.id).await.unwrap());

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_first_writer_metadata_wins() {
    let test_db = TestDatabase::new().await;
    let user = test_db.create_user("alice").await;

    let first = test_db
        .db
        .ingest
        .ingest(
            user.id,
            IngestRequest::external("Shared text", None).title("Original title"),
        )
        .await
        .unwrap();

    let second = test_db
        .db
        .ingest
        .ingest(
            user.id,
            IngestRequest::external("Shared text", None)
                .title("Replacement title")
                .blurb("Replacement blurb"),
        )
        .await
        .unwrap();

    assert_eq!(second.article.title.as_deref(), Some("Original title"));
    assert_eq!(second.article.blurb, None, "loser's metadata is discarded");

    let stored = test_db.db.articles.fetch(first.article.id).await.unwrap();
    assert_eq!(stored.title.as_deref(), Some("Original title"));

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_same_url_different_text_collapses() {
    let test_db = TestDatabase::new().await;
    let user = test_db.create_user("alice").await;

    let url = Some("http://example.com/story".to_string());
    let first = test_db
        .db
        .ingest
        .ingest(user.id, IngestRequest::external("Capture one", url.clone()))
        .await
        .unwrap();

    // Same page, slightly different extraction output.
    let second = test_db
        .db
        .ingest
        .ingest(user.id, IngestRequest::external("Capture one.", url))
        .await
        .unwrap();

    assert!(!second.created, "matching url must collapse the capture");
    assert_eq!(first.article.id, second.article.id);
    assert_eq!(
        second.article.content, "Capture one",
        "canonical content stays the first committed capture"
    );

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_fingerprint_wins_over_url_when_both_match() {
    let test_db = TestDatabase::new().await;
    let user = test_db.create_user("alice").await;

    let a = test_db
        .db
        .ingest
        .ingest(
            user.id,
            IngestRequest::external("Alpha body", Some("http://a".to_string())),
        )
        .await
        .unwrap();
    let b = test_db
        .db
        .ingest
        .ingest(
            user.id,
            IngestRequest::external("Beta body", Some("http://b".to_string())),
        )
        .await
        .unwrap();
    assert_ne!(a.article.id, b.article.id);

    // a's exact text captured from b's url: the fingerprint points at a,
    // the url at b. Exact content takes precedence.
    let resolved = test_db
        .db
        .ingest
        .ingest(
            user.id,
            IngestRequest::external("Alpha body", Some("http://b".to_string())),
        )
        .await
        .unwrap();

    assert!(!resolved.created);
    assert_eq!(resolved.article.id, a.article.id);
    assert_eq!(test_db.db.articles.count().await.unwrap(), 2);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_distinct_content_creates_distinct_articles() {
    let test_db = TestDatabase::new().await;
    let user = test_db.create_user("alice").await;

    let a = test_db
        .db
        .ingest
        .ingest(user.id, IngestRequest::external("First article", None))
        .await
        .unwrap();
    let b = test_db
        .db
        .ingest
        .ingest(user.id, IngestRequest::external("Second article", None))
        .await
        .unwrap();

    assert!(a.created && b.created);
    assert_ne!(a.article.id, b.article.id);
    assert_eq!(test_db.db.articles.count().await.unwrap(), 2);

    let by_fp = test_db
        .db
        .articles
        .find_by_fingerprint(&fingerprint("First article"))
        .await
        .unwrap()
        .expect("fingerprint lookup should hit");
    assert_eq!(by_fp.id, a.article.id);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_empty_content_rejected() {
    let test_db = TestDatabase::new().await;
    let user = test_db.create_user("alice").await;

    let result = test_db
        .db
        .ingest
        .ingest(user.id, IngestRequest::external("", None))
        .await;

    assert!(matches!(result, Err(Error::EmptyContent)));
    assert_eq!(test_db.db.articles.count().await.unwrap(), 0);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_unknown_user_rejected() {
    let test_db = TestDatabase::new().await;

    let ghost = Uuid::new_v4();
    let result = test_db
        .db
        .ingest
        .ingest(ghost, IngestRequest::external("Orphan text", None))
        .await;

    assert!(matches!(result, Err(Error::UserNotFound(id)) if id == ghost));
    assert_eq!(
        test_db.db.articles.count().await.unwrap(),
        0,
        "rejected ingest must not leave an article behind"
    );

    test_db.cleanup().await;
}

struct StubExtractor {
    classify_as_article: bool,
}

#[async_trait]
impl Extractor for StubExtractor {
    async fn extract(&self, raw_document: &str) -> Result<Extraction> {
        Ok(Extraction {
            is_article: self.classify_as_article,
            text: raw_document.trim().to_string(),
            title: Some("Extracted title".to_string()),
        })
    }
}

#[tokio::test]
async fn test_ingest_document_rejects_non_article() {
    let test_db = TestDatabase::new().await;
    let user = test_db.create_user("alice").await;
    let extractor = StubExtractor {
        classify_as_article: false,
    };

    let result = test_db
        .db
        .ingest
        .ingest_document(
            user.id,
            "<html>nav nav nav</html>",
            Some("http://example.com/nav".to_string()),
            &extractor,
        )
        .await;

    assert!(matches!(result, Err(Error::NotAnArticle(_))));
    assert_eq!(
        test_db.db.articles.count().await.unwrap(),
        0,
        "rejected documents are never stored"
    );

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_ingest_document_stores_raw_capture() {
    let test_db = TestDatabase::new().await;
    let user = test_db.create_user("alice").await;
    let extractor = StubExtractor {
        classify_as_article: true,
    };

    let raw = "  A proper article body  ";
    let resolution = test_db
        .db
        .ingest
        .ingest_document(user.id, raw, None, &extractor)
        .await
        .expect("document ingest should succeed");

    assert!(resolution.created);
    assert_eq!(resolution.article.content, "A proper article body");
    assert_eq!(resolution.article.raw_document.as_deref(), Some(raw));
    assert_eq!(resolution.article.title.as_deref(), Some("Extracted title"));

    test_db.cleanup().await;
}
