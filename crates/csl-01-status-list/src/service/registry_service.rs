//! Status Registry Service
//!
//! Implements `StatusRegistryApi` on top of any `RegistryStorage`. Lists are
//! persisted as a small JSON document recording the stride next to the
//! encoded registry: `{"stride":2,"encoded":"..."}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{CredentialStatus, StatusCodec, StatusList, StatusStride};
use crate::error::{StatusListError, StorageError};
use crate::ports::{RegistryStorage, StatusRegistryApi};

/// Persisted form of a status list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRegistry {
    pub stride: StatusStride,
    pub encoded: String,
}

/// Status Registry Service implementation
pub struct StatusRegistryService<S: RegistryStorage> {
    storage: Arc<S>,
    codec: StatusCodec,
}

impl<S: RegistryStorage> StatusRegistryService<S> {
    /// Create a service using the default codec.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            codec: StatusCodec::default(),
        }
    }

    pub fn with_codec(storage: Arc<S>, codec: StatusCodec) -> Self {
        Self { storage, codec }
    }

    pub fn codec(&self) -> &StatusCodec {
        &self.codec
    }

    fn decode_document(&self, document: &[u8]) -> Result<StatusList, StatusListError> {
        let stored: StoredRegistry = serde_json::from_slice(document)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        StatusList::from_encoded_with(&self.codec, stored.stride, &stored.encoded)
    }
}

impl<S: RegistryStorage + 'static> StatusRegistryService<S> {
    async fn update(
        &self,
        reference: &str,
        index: usize,
        status: CredentialStatus,
    ) -> Result<(), StatusListError> {
        let mut list = self.load(reference).await?;
        list.set(index, status)?;
        self.store(reference, &list).await?;

        info!(reference, index, %status, "Status updated");
        Ok(())
    }
}

#[async_trait]
impl<S: RegistryStorage + 'static> StatusRegistryApi for StatusRegistryService<S> {
    async fn create(&self, reference: &str, stride: StatusStride) -> Result<String, StatusListError> {
        if self.storage.get(reference).await?.is_some() {
            return Err(StatusListError::AlreadyExists(reference.to_string()));
        }
        let reference = self.store(reference, &StatusList::new(stride)).await?;

        info!(%reference, stride = stride.bits(), "Status list created");
        Ok(reference)
    }

    async fn issue(&self, reference: &str, index: usize) -> Result<(), StatusListError> {
        self.update(reference, index, CredentialStatus::Active).await
    }

    async fn revoke(&self, reference: &str, index: usize) -> Result<(), StatusListError> {
        self.update(reference, index, CredentialStatus::Revoked).await
    }

    async fn suspend(&self, reference: &str, index: usize) -> Result<(), StatusListError> {
        self.update(reference, index, CredentialStatus::Suspended).await
    }

    async fn resume(&self, reference: &str, index: usize) -> Result<(), StatusListError> {
        self.update(reference, index, CredentialStatus::Resumed).await
    }

    async fn resolve(
        &self,
        reference: &str,
        index: usize,
    ) -> Result<CredentialStatus, StatusListError> {
        self.load(reference).await?.get(index)
    }

    async fn load(&self, reference: &str) -> Result<StatusList, StatusListError> {
        let document = self
            .storage
            .get(reference)
            .await?
            .ok_or_else(|| StatusListError::NotFound(reference.to_string()))?;
        let list = self.decode_document(&document)?;

        debug!(reference, bits = list.physical_len_bits(), "Status list loaded");
        Ok(list)
    }

    async fn store(&self, reference: &str, list: &StatusList) -> Result<String, StatusListError> {
        let stored = StoredRegistry {
            stride: list.stride(),
            encoded: list.serialize_with(&self.codec)?,
        };
        let document = serde_json::to_vec(&stored)
            .map_err(|e| StatusListError::Storage(e.to_string()))?;

        Ok(self.storage.put(reference, document).await?)
    }
}
