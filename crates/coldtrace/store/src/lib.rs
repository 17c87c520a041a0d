//! Coldtrace off-chain content store.
//!
//! The ledger never reads provenance documents. It keeps only their
//! [`ContentHash`] and the [`StorageRef`] returned by [`ContentStore::put`].
//! Buyers fetch the bytes back and recompute the hash to check them against
//! the ledger.

#![deny(unsafe_code)]

mod document;
mod memory;

pub use document::ProvenanceDocument;
pub use memory::InMemoryContentStore;

use async_trait::async_trait;
use coldtrace_types::{ContentHash, StorageRef};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("content not found: {0}")]
    NotFound(StorageRef),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Content-addressable document store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store bytes and return their locator.
    async fn put(&self, document: Vec<u8>) -> StoreResult<StorageRef>;

    /// Byte-exact retrieval of what was stored under `locator`.
    async fn get(&self, locator: &StorageRef) -> StoreResult<Vec<u8>>;
}

/// Store a provenance document, returning the hash to record on the ledger
/// and the locator of the stored bytes.
pub async fn publish<S: ContentStore + ?Sized>(
    store: &S,
    document: &ProvenanceDocument,
) -> StoreResult<(ContentHash, StorageRef)> {
    let bytes = document.to_bytes()?;
    let hash = ContentHash::hash(&bytes);
    let locator = store.put(bytes).await?;
    Ok((hash, locator))
}

/// Fetch the bytes under `locator` and check them against an expected hash.
pub async fn matches_hash<S: ContentStore + ?Sized>(
    store: &S,
    locator: &StorageRef,
    expected: &ContentHash,
) -> StoreResult<bool> {
    let bytes = store.get(locator).await?;
    Ok(ContentHash::hash(&bytes) == *expected)
}
