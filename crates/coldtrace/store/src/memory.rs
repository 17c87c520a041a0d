//! In-memory content store.
//!
//! Locators are `b3:<hex digest>` of the stored bytes, so storing the same
//! document twice yields the same locator.

use crate::{ContentStore, StoreError, StoreResult};
use async_trait::async_trait;
use coldtrace_types::StorageRef;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    documents: RwLock<HashMap<StorageRef, Vec<u8>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locator_for(bytes: &[u8]) -> StorageRef {
        StorageRef::new(format!("b3:{}", blake3::hash(bytes).to_hex()))
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put(&self, document: Vec<u8>) -> StoreResult<StorageRef> {
        let locator = Self::locator_for(&document);
        let mut documents = self
            .documents
            .write()
            .map_err(|_| StoreError::Backend("documents lock poisoned".to_string()))?;
        debug!(locator = %locator, bytes = document.len(), "Document stored");
        documents.insert(locator.clone(), document);
        Ok(locator)
    }

    async fn get(&self, locator: &StorageRef) -> StoreResult<Vec<u8>> {
        let documents = self
            .documents
            .read()
            .map_err(|_| StoreError::Backend("documents lock poisoned".to_string()))?;
        documents
            .get(locator)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(locator.clone()))
    }
}
