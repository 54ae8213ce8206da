//! Outbound Ports (Driven Ports)
//!
//! Persistence the registry service depends on. Adapters store opaque
//! documents; the service owns their format.

use async_trait::async_trait;

use crate::error::StorageError;

/// Registry document storage (Driven Port)
#[async_trait]
pub trait RegistryStorage: Send + Sync {
    /// Fetch the document stored under `reference`, if any.
    async fn get(&self, reference: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store `document` under `reference` and return the reference.
    async fn put(&self, reference: &str, document: Vec<u8>) -> Result<String, StorageError>;
}
