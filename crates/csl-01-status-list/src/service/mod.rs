//! Service layer: orchestration over the storage port.

pub mod registry_service;

pub use registry_service::{StatusRegistryService, StoredRegistry};
