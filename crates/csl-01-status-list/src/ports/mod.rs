//! Ports layer: trait definitions for the status registry.

pub mod inbound;
pub mod outbound;

pub use inbound::StatusRegistryApi;
pub use outbound::RegistryStorage;
