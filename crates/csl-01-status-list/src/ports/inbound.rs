//! Inbound Ports (Driving Ports)
//!
//! The API callers use to manage persisted status lists by reference.

use async_trait::async_trait;

use crate::domain::{CredentialStatus, StatusList, StatusStride};
use crate::error::StatusListError;

/// Status registry API (Driving Port)
///
/// Every mutation is load, set, store. There is no locking across those
/// steps; callers keep a single writer per reference.
#[async_trait]
pub trait StatusRegistryApi: Send + Sync {
    /// Create and persist an empty list. Fails if `reference` exists.
    async fn create(&self, reference: &str, stride: StatusStride) -> Result<String, StatusListError>;

    async fn issue(&self, reference: &str, index: usize) -> Result<(), StatusListError>;

    async fn revoke(&self, reference: &str, index: usize) -> Result<(), StatusListError>;

    /// Fails with `UnsupportedStatus` for 1-bit lists.
    async fn suspend(&self, reference: &str, index: usize) -> Result<(), StatusListError>;

    async fn resume(&self, reference: &str, index: usize) -> Result<(), StatusListError>;

    /// Current status of one entry.
    async fn resolve(&self, reference: &str, index: usize)
        -> Result<CredentialStatus, StatusListError>;

    async fn load(&self, reference: &str) -> Result<StatusList, StatusListError>;

    /// Persist `list` under `reference`, replacing any previous version.
    async fn store(&self, reference: &str, list: &StatusList) -> Result<String, StatusListError>;
}
