//! Adapters layer: concrete storage backends.

pub mod memory_storage;

pub use memory_storage::InMemoryRegistryStorage;
