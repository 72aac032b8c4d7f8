//! # spyglass-core
//!
//! Core types, traits, and abstractions for spyglass, a shared read-later
//! store with content-addressable article deduplication.
//!
//! This crate defines:
//! - Domain models ([`Article`], [`User`], [`Highlight`], [`Note`], ...)
//! - Repository traits implemented by the storage layer
//! - The [`fingerprint`] function used as the canonical dedup key
//! - The error taxonomy shared across all crates
//!
//! No storage code lives here; see `spyglass-db` for the SQLite layer.

pub mod error;
pub mod fingerprint;
pub mod ids;
pub mod logging;
pub mod models;
pub mod traits;

pub use error::{Error, Result};
pub use fingerprint::fingerprint;
pub use ids::new_v7;
pub use models::*;
pub use traits::*;
