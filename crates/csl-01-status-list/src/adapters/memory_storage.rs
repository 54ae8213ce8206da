//! In-memory registry storage, for tests and single-process deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::ports::RegistryStorage;

/// `RegistryStorage` backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryRegistryStorage {
    documents: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryRegistryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

#[async_trait]
impl RegistryStorage for InMemoryRegistryStorage {
    async fn get(&self, reference: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.documents.read().await.get(reference).cloned())
    }

    async fn put(&self, reference: &str, document: Vec<u8>) -> Result<String, StorageError> {
        self.documents
            .write()
            .await
            .insert(reference.to_string(), document);
        Ok(reference.to_string())
    }
}
