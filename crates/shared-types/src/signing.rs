//! # Signing Ports
//!
//! Call contracts for the signing collaborator. The envelope only needs
//! "bytes in, signature out" and "bytes + signature in, verdict out"; the
//! actual primitives live behind these traits (see `shared-crypto`).

use crate::errors::SigningError;

/// Produces a signature over canonical message bytes.
///
/// Any `Fn(&[u8]) -> Result<Vec<u8>, SigningError>` closure is a signer.
pub trait MessageSigner: Send + Sync {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError>;
}

impl<F> MessageSigner for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>, SigningError> + Send + Sync,
{
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
        self(message)
    }
}

/// Checks a signature over message bytes against a known public key.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, message: &[u8], signature: &[u8]) -> bool;
}
