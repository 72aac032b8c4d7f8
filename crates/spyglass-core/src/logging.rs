//! Structured logging setup for spyglass.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue (e.g. write-lock contention, retry applied) |
//! | INFO  | Lifecycle events, operation completions (ingest, delete) |
//! | DEBUG | Decision points (dedup hit/miss, race re-resolution) |
//!
//! Common structured fields: `user_id`, `article_id`, `fingerprint`,
//! `created`, `attempt`, `duration_ms`.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG`; defaults to `info`. Safe to call more than once
/// (subsequent calls are no-ops), so tests can call it freely.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
