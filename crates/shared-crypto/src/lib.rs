//! # Shared Crypto - Signing Collaborator
//!
//! Ed25519 implementation of the envelope signing ports defined in
//! `shared-types` (`MessageSigner`, `SignatureVerifier`).
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency when signing
//! - **Strict verification**: rejects malleable signatures

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
