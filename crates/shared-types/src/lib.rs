//! # Shared Types Crate
//!
//! Types shared by every crate in the workspace: identifiers and timestamps,
//! the signed [`MessageEnvelope`], the accumulate-then-raise
//! [`ValidationGate`], and the signing collaborator ports.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-crate types are defined here once.
//! - **Canonical Bytes**: the envelope's signed bytes are deterministic and
//!   never include the signature itself.
//! - **Report Everything**: precondition checks collect every violation
//!   before failing.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod signing;
pub mod validation;

pub use entities::*;
pub use envelope::{MessageEnvelope, MessageMode, ENVELOPE_VERSION};
pub use errors::*;
pub use signing::{MessageSigner, SignatureVerifier};
pub use validation::ValidationGate;
