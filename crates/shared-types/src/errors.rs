//! # Error Types
//!
//! Errors shared by the envelope, the validation gate and the signing ports.

use thiserror::Error;

/// Aggregated precondition failure raised by [`crate::ValidationGate`].
///
/// Every failed requirement of one operation is reported together, joined by
/// `", "` after the operation's prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{}", .prefix, .failures.join(", "))]
pub struct ValidationError {
    /// Operation-specific prefix, e.g. `"Invalid message envelope: "`.
    pub prefix: String,
    /// Failed requirement messages, in the order they were checked.
    pub failures: Vec<String>,
}

/// Failure reported by a signing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("signing failed: {0}")]
pub struct SigningError(pub String);

/// Errors produced while building, signing or parsing a `MessageEnvelope`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Envelope preconditions failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A signature is already attached; envelopes are signed at most once.
    #[error("Message is already signed")]
    AlreadySigned,

    /// The signing collaborator failed.
    #[error("Signature error: {0}")]
    Signing(#[from] SigningError),

    /// Canonical or wire serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A malformed argument (topic id, wire bytes, ...).
    #[error("Invalid argument: {0}")]
    Argument(String),
}

impl From<serde_json::Error> for EnvelopeError {
    fn from(e: serde_json::Error) -> Self {
        EnvelopeError::Serialization(e.to_string())
    }
}
