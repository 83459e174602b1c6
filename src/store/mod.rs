//! # Versioned Universe Store
//!
//! Pluggable persistence for topology documents with optimistic
//! compare-and-swap-by-version semantics. `save` commits only when the stored
//! version still matches the version the caller loaded; a losing writer gets
//! [`StoreError::VersionConflict`] and must reload, reapply its updater, and
//! try again.
//!
//! This is the sole mutation path for a topology document. Backings exist for
//! in-process testing ([`InMemoryUniverseStore`]) and PostgreSQL
//! ([`PgUniverseStore`], behind the `postgres` feature).

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryUniverseStore;
#[cfg(feature = "postgres")]
pub use postgres::PgUniverseStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::UniverseTopology;

/// A document snapshot paired with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub document: T,
}

/// Errors from versioned store operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Another mutation committed since the caller's load
    #[error("version conflict: expected {expected}, stored {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("universe {0} not found")]
    UniverseNotFound(Uuid),

    #[error("universe {0} already exists")]
    AlreadyExists(Uuid),

    /// The backing store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The document failed invariant checks at commit time
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Check whether a retry against fresh state can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::VersionConflict { .. } | StoreError::Unavailable(_)
        )
    }

    /// Check whether the retry should back off before the next attempt
    pub fn wants_backoff(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Atomic read-modify-write persistence for topology documents, keyed by
/// universe identifier.
#[async_trait]
pub trait UniverseStore: Send + Sync {
    /// Load the current document snapshot and its version.
    async fn load(&self, universe_uuid: Uuid) -> Result<Versioned<UniverseTopology>, StoreError>;

    /// Commit a replacement document iff the stored version still equals
    /// `expected_version`. Returns the new version on success.
    async fn save(
        &self,
        universe_uuid: Uuid,
        expected_version: u64,
        topology: &UniverseTopology,
    ) -> Result<u64, StoreError>;

    /// Create the document for a newly provisioned universe at version 1.
    async fn create(
        &self,
        universe_uuid: Uuid,
        topology: &UniverseTopology,
    ) -> Result<u64, StoreError>;

    /// Drop the document for a deleted universe.
    async fn remove(&self, universe_uuid: Uuid) -> Result<(), StoreError>;
}
