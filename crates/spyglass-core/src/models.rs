//! Core data models for spyglass.
//!
//! These types are shared across all spyglass crates and represent the
//! core domain entities: readers, canonical articles, the ownership
//! ledger, and per-user annotations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// USER TYPES
// =============================================================================

/// A reader account.
///
/// Created on first successful external authentication; `external_id` is
/// the stable reference into the identity provider and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Stable identity reference from the external auth provider.
    pub external_id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

// =============================================================================
// ARTICLE TYPES
// =============================================================================

/// Category tag for an article.
///
/// A closed set with exactly three cases. The store records the tag but
/// never branches its dedup behavior on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleKind {
    /// Self-authored, visible to other readers.
    Public,
    /// Self-authored, visible only to the author.
    Private,
    /// Saved from an external source.
    External,
}

impl ArticleKind {
    /// Wire/storage string for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleKind::Public => "public",
            ArticleKind::Private => "private",
            ArticleKind::External => "external",
        }
    }

    /// Parse a stored kind string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(ArticleKind::Public),
            "private" => Some(ArticleKind::Private),
            "external" => Some(ArticleKind::External),
            _ => None,
        }
    }
}

/// Canonical article record: exactly one row exists per distinct
/// fingerprint value.
///
/// `content` and the other fingerprinted fields are write-once. There is
/// deliberately no update operation for them; replacing content would
/// require creating a new canonical record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: Option<String>,
    /// Short summary shown in list views.
    pub blurb: Option<String>,
    /// Canonical extraction-normalized text. Participates in the fingerprint.
    pub content: String,
    /// Original document as captured, before extraction.
    pub raw_document: Option<String>,
    pub url: Option<String>,
    pub kind: ArticleKind,
    /// Content fingerprint, the dedup key (`sha256:<hex>`).
    pub fingerprint: String,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

impl Article {
    /// Length of the canonical content in characters.
    ///
    /// Highlight offsets are character positions, not byte offsets.
    pub fn content_len(&self) -> i64 {
        self.content.chars().count() as i64
    }
}

/// Outcome of a resolve-or-create: the canonical row plus whether this
/// call created it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub article: Article,
    pub created: bool,
}

/// Summary view of an article for listing (no content body).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: Uuid,
    pub title: Option<String>,
    pub blurb: Option<String>,
    pub kind: ArticleKind,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

// =============================================================================
// OWNERSHIP LEDGER TYPES
// =============================================================================

/// Ownership ledger row: reader ↔ canonical article membership.
///
/// At most one row exists per (user, article) pair. Articles are shared by
/// reference; no user exclusively owns an article's content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub user_id: Uuid,
    pub article_id: Uuid,
    pub added_at_utc: DateTime<Utc>,
}

// =============================================================================
// ANNOTATION TYPES
// =============================================================================

/// A user-authored span reference into one article's text.
///
/// Invariant at creation: `0 <= start_pos < end_pos <= content_len`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    pub id: Uuid,
    pub article_id: Uuid,
    pub user_id: Uuid,
    /// Start offset, in characters.
    pub start_pos: i64,
    /// End offset (exclusive), in characters.
    pub end_pos: i64,
    pub created_at_utc: DateTime<Utc>,
}

/// Free-text annotation on an article or on one of its highlights.
///
/// `article_id` is always stored resolved: a note attached to a highlight
/// is transitively attached to that highlight's article. Immutable once
/// created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub article_id: Uuid,
    pub highlight_id: Option<Uuid>,
    pub user_id: Uuid,
    pub content: String,
    pub created_at_utc: DateTime<Utc>,
}
