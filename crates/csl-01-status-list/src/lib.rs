//! # CSL-01 Status List
//!
//! Compact credential status registries: a bit-packed vector of fixed-width
//! status entries, compressed and base64-encoded for publication.
//!
//! ## Architecture
//!
//! Hexagonal layout (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): pure logic, no I/O
//!   - `StatusList`: the registry with get/set and lifecycle helpers
//!   - `StatusCodec`: `base64(DEFLATE(packed bits))` wire format
//!   - `CodecConfig` / `CodecConfigBuilder`: framing, level, alphabet
//!   - `CredentialStatus` / `StatusStride`: states and their bit codes
//!
//! - **Ports Layer** (`ports/`)
//!   - `StatusRegistryApi`: driving port
//!   - `RegistryStorage`: driven port for persistence
//!
//! - **Service Layer** (`service/`)
//!   - `StatusRegistryService`: load, set, store per mutation
//!
//! - **Adapters Layer** (`adapters/`)
//!   - `InMemoryRegistryStorage`
//!
//! ## Invariants
//!
//! - Entries are `stride` bits wide; indices must be multiples of `stride`.
//! - Reads past the stored length return `ACTIVE`; storage grows to the
//!   shortest byte-aligned length on write.
//! - `decode(encode(bits))` equals `bits` zero-padded to a byte boundary.
//!
//! ## Usage Example
//!
//! ```ignore
//! use csl_01_status_list::{CredentialStatus, StatusList, StatusStride};
//!
//! let mut list = StatusList::new(StatusStride::TwoBit);
//! list.suspend(4)?;
//! let encoded = list.serialize()?;
//!
//! let restored = StatusList::from_encoded(StatusStride::TwoBit, &encoded)?;
//! assert_eq!(restored.get(4)?, CredentialStatus::Suspended);
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::InMemoryRegistryStorage;
pub use domain::{
    Base64Alphabet, CodecConfig, CodecConfigBuilder, Compression, CredentialStatus, StatusCodec,
    StatusList, StatusStride,
};
pub use error::{StatusListError, StorageError};
pub use ports::{RegistryStorage, StatusRegistryApi};
pub use service::{StatusRegistryService, StoredRegistry};
