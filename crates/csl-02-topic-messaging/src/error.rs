//! Error types for topic messaging

use shared_log::LogError;
use shared_types::{EnvelopeError, ValidationError};
use thiserror::Error;

/// Errors raised by the submitter and the listener.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MessagingError {
    /// Malformed envelope or topic reference at construction.
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Aggregated precondition failure. Never reaches the network.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Already signed, or the signing collaborator failed.
    #[error("Signature error: {0}")]
    Signature(String),

    /// The log rejected the submission.
    #[error("Submission failed: {0}")]
    Submission(LogError),

    /// The listener observed an invalid record carrying the submitted bytes.
    #[error("Confirmation failed: {reason}")]
    Confirmation { reason: String, contents: Vec<u8> },

    /// Stream-level fault on a subscription.
    #[error("Listener error: {0}")]
    Listener(LogError),
}

impl From<EnvelopeError> for MessagingError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Validation(e) => MessagingError::Validation(e),
            EnvelopeError::AlreadySigned => {
                MessagingError::Signature("message is already signed".to_string())
            }
            EnvelopeError::Signing(e) => MessagingError::Signature(e.to_string()),
            EnvelopeError::Serialization(reason) => {
                MessagingError::Argument(format!("message serialization failed: {reason}"))
            }
            EnvelopeError::Argument(reason) => MessagingError::Argument(reason),
        }
    }
}
