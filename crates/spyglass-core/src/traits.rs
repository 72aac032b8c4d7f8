//! Core traits for spyglass abstractions.
//!
//! These traits define the interfaces the storage layer must satisfy,
//! plus the contracts of external collaborators (extraction, identity).
//! Every method may block on I/O with no implicit timeout; callers that
//! need a deadline should wrap the future (e.g. `tokio::time::timeout`).

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Request for resolving or creating a canonical article.
///
/// When the content (or URL) resolves to an existing row, all metadata in
/// this request is discarded: the first committed writer wins.
#[derive(Debug, Clone)]
pub struct CreateArticleRequest {
    pub content: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub blurb: Option<String>,
    pub raw_document: Option<String>,
    pub kind: ArticleKind,
}

/// Request for creating a highlight.
#[derive(Debug, Clone)]
pub struct CreateHighlightRequest {
    pub article_id: Uuid,
    pub user_id: Uuid,
    /// Start offset, in characters.
    pub start_pos: i64,
    /// End offset (exclusive), in characters.
    pub end_pos: i64,
}

/// Request for creating a note.
///
/// Exactly one of `article_id`/`highlight_id` must be supplied; supplying
/// both is accepted only when the highlight belongs to that article.
#[derive(Debug, Clone)]
pub struct CreateNoteRequest {
    pub user_id: Uuid,
    pub content: String,
    pub article_id: Option<Uuid>,
    pub highlight_id: Option<Uuid>,
}

/// Request for upserting a user from an authenticated identity.
#[derive(Debug, Clone)]
pub struct EnsureUserRequest {
    /// Stable identity reference from the auth provider.
    pub external_id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// REPOSITORY TRAITS
// =============================================================================

/// Repository for the canonical article store.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Resolve the request against existing canonical rows, creating one
    /// only when neither the fingerprint nor the URL matches.
    ///
    /// Concurrent calls with identical content converge on exactly one
    /// persisted row; a losing creator observes the winner's row.
    async fn resolve_or_create(&self, req: CreateArticleRequest) -> Result<Resolution>;

    /// Fetch an article by id.
    async fn fetch(&self, id: Uuid) -> Result<Article>;

    /// Look up an article by its exact fingerprint value.
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Article>>;

    /// Delete an article. Cascades to its highlights, notes, and ledger rows.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Total number of canonical articles.
    async fn count(&self) -> Result<i64>;
}

/// Repository for the ownership ledger (user ↔ article membership).
#[async_trait]
pub trait LibraryRepository: Send + Sync {
    /// Idempotent membership upsert. Returns `true` when a row was newly
    /// inserted, `false` when the pair was already present.
    async fn ensure_membership(&self, user_id: Uuid, article_id: Uuid) -> Result<bool>;

    /// Whether a membership row exists for the pair.
    async fn is_member(&self, user_id: Uuid, article_id: Uuid) -> Result<bool>;

    /// Articles in a user's library, most recently added first.
    async fn list_articles(&self, user_id: Uuid) -> Result<Vec<ArticleSummary>>;

    /// Number of users holding an article.
    async fn owner_count(&self, article_id: Uuid) -> Result<i64>;
}

/// Repository for per-user annotations (highlights and notes).
#[async_trait]
pub trait AnnotationRepository: Send + Sync {
    /// Create a highlight after validating its range against the article
    /// content length.
    async fn create_highlight(&self, req: CreateHighlightRequest) -> Result<Highlight>;

    /// Fetch a highlight by id.
    async fn fetch_highlight(&self, id: Uuid) -> Result<Highlight>;

    /// Highlights a user authored on an article, in creation order.
    async fn list_highlights(&self, article_id: Uuid, user_id: Uuid) -> Result<Vec<Highlight>>;

    /// Delete a highlight. Cascades to its notes.
    async fn delete_highlight(&self, id: Uuid) -> Result<()>;

    /// Create a note attached to an article or to a highlight.
    async fn create_note(&self, req: CreateNoteRequest) -> Result<Note>;

    /// Notes a user authored on an article, in creation order.
    ///
    /// Annotations are private per-user views over a shared article, so
    /// only notes authored by `user_id` are returned.
    async fn list_notes(&self, article_id: Uuid, user_id: Uuid) -> Result<Vec<Note>>;

    /// Delete a note.
    async fn delete_note(&self, id: Uuid) -> Result<()>;
}

/// Repository for reader accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Upsert a user from an authenticated identity: created on first
    /// authentication, profile fields refreshed on subsequent ones.
    async fn ensure_from_identity(&self, req: EnsureUserRequest) -> Result<User>;

    /// Fetch a user by id.
    async fn fetch(&self, id: Uuid) -> Result<User>;
}

// =============================================================================
// COLLABORATOR CONTRACTS
// =============================================================================

/// Outcome of running a raw document through the extraction collaborator.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Whether the document was classified as an article at all.
    pub is_article: bool,
    /// Extraction-normalized text, ready for fingerprinting.
    pub text: String,
    pub title: Option<String>,
}

/// Article-likeness classification and text extraction.
///
/// Implemented outside the core; the ingestion pipeline treats
/// `is_article == false` as a hard rejection and never stores the content.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, raw_document: &str) -> Result<Extraction>;
}
