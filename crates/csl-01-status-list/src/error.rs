//! Error types for the status list subsystem

use thiserror::Error;

use crate::domain::status::CredentialStatus;

/// Errors that can occur while encoding, decoding or mutating a status list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatusListError {
    /// Index is not a multiple of the bit-width stride.
    #[error("index must be Multiples of {stride} OR 0. e.g. {}", alignment_examples(.stride))]
    Alignment { index: usize, stride: usize },

    /// Index so large that the backing storage cannot address it.
    #[error("Index out of range: {index}")]
    IndexOutOfRange { index: usize },

    /// Malformed encoded registry (bad base64, bad compressed stream, too large).
    #[error("Malformed encoded status list: {0}")]
    Format(String),

    /// The status cannot be represented with this stride.
    #[error("Status {status} is not representable with a {stride}-bit stride")]
    UnsupportedStatus {
        status: CredentialStatus,
        stride: usize,
    },

    /// Stride other than 1 or 2 bits.
    #[error("Invalid stride: {0} (must be 1 or 2)")]
    InvalidStride(u8),

    #[error("Invalid codec configuration: {0}")]
    Config(String),

    /// Storage collaborator failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// No registry stored under the reference.
    #[error("Status list not found: {0}")]
    NotFound(String),

    #[error("Status list already exists: {0}")]
    AlreadyExists(String),
}

/// Errors raised by registry storage adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Stored document is corrupt: {0}")]
    Corrupt(String),
}

impl From<StorageError> for StatusListError {
    fn from(err: StorageError) -> Self {
        StatusListError::Storage(err.to_string())
    }
}

/// First eight valid indices for a stride, e.g. `0, 2, 4, 6, 8, 10, 12, 14`.
fn alignment_examples(stride: &usize) -> String {
    (0..8)
        .map(|k| (k * stride).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
