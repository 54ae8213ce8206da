//! # `MessageEnvelope`
//!
//! Signed, versioned wrapper around a payload that is published to the
//! ordered log.
//!
//! ## Serialization
//!
//! - **Canonical bytes** (what gets signed): compact JSON
//!   `{"version":1,"mode":"plain","message":<payload>}`, fields in that order.
//! - **Wire bytes** (what gets transmitted): the canonical fields followed by
//!   `"signature":"<base64>"`. An unsigned envelope omits the signature.
//!
//! Payload types must serialize deterministically (structs, `BTreeMap`),
//! otherwise independently computed signatures will not verify.
//!
//! ## Invariants
//!
//! - A signature is attached at most once; a second `sign` fails.
//! - Canonical bytes never include the signature.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::EnvelopeError;
use crate::signing::{MessageSigner, SignatureVerifier};
use crate::validation::ValidationGate;

/// Current envelope format version.
pub const ENVELOPE_VERSION: u16 = 1;

/// Transport mode of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageMode {
    /// Payload travels as cleartext JSON.
    #[default]
    Plain,
}

/// The envelope submitted to the ordered log.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEnvelope<T> {
    version: u16,
    mode: MessageMode,
    message: T,
    signature: Option<Vec<u8>>,
}

#[derive(Serialize)]
struct CanonicalView<'a, T> {
    version: u16,
    mode: MessageMode,
    message: &'a T,
}

#[derive(Serialize)]
struct WireView<'a, T> {
    version: u16,
    mode: MessageMode,
    message: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
}

#[derive(Deserialize)]
struct WireOwned<T> {
    version: u16,
    mode: MessageMode,
    message: T,
    #[serde(default)]
    signature: Option<String>,
}

impl<T> MessageEnvelope<T> {
    /// Wrap a payload in an unsigned envelope.
    pub fn new(message: T) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            mode: MessageMode::Plain,
            message,
            signature: None,
        }
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn mode(&self) -> MessageMode {
        self.mode
    }

    pub fn message(&self) -> &T {
        &self.message
    }

    /// The attached signature, if any.
    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

impl<T: Serialize> MessageEnvelope<T> {
    /// Deterministic bytes covered by the signature.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        let view = CanonicalView {
            version: self.version,
            mode: self.mode,
            message: &self.message,
        };
        Ok(serde_json::to_vec(&view)?)
    }

    /// Canonical fields plus the base64 signature, as transmitted to the log.
    pub fn to_wire_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        let view = WireView {
            version: self.version,
            mode: self.mode,
            message: &self.message,
            signature: self.signature.as_ref().map(|sig| BASE64.encode(sig)),
        };
        Ok(serde_json::to_vec(&view)?)
    }

    /// Sign the canonical bytes and attach the signature.
    ///
    /// # Errors
    ///
    /// - [`EnvelopeError::AlreadySigned`] if a signature is already attached
    /// - [`EnvelopeError::Signing`] if the collaborator fails
    pub fn sign(&mut self, signer: &dyn MessageSigner) -> Result<Vec<u8>, EnvelopeError> {
        if self.signature.is_some() {
            return Err(EnvelopeError::AlreadySigned);
        }

        let canonical = self.to_canonical_bytes()?;
        let signature = signer.sign(&canonical)?;
        self.signature = Some(signature.clone());

        tracing::debug!(
            canonical_len = canonical.len(),
            signature_len = signature.len(),
            "Message envelope signed"
        );

        Ok(signature)
    }

    /// Re-verify the attached signature over the canonical bytes.
    ///
    /// Unsigned envelopes never verify.
    pub fn verify(&self, verifier: &dyn SignatureVerifier) -> bool {
        let Some(signature) = self.signature.as_deref() else {
            return false;
        };
        match self.to_canonical_bytes() {
            Ok(canonical) => verifier.verify(&canonical, signature),
            Err(_) => false,
        }
    }

    /// Check structural preconditions, reporting all violations together.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        let mut gate = ValidationGate::new();

        gate.require(
            self.version == ENVELOPE_VERSION,
            format!(
                "unsupported envelope version {} (supported: {})",
                self.version, ENVELOPE_VERSION
            ),
        );

        match serde_json::to_value(&self.message) {
            Ok(value) => {
                gate.require(!value.is_null(), "message payload must not be empty");
            }
            Err(e) => {
                gate.require(false, format!("message payload is not serializable: {e}"));
            }
        }

        gate.require(
            self.signature.as_ref().map_or(true, |sig| !sig.is_empty()),
            "attached signature must not be empty",
        );

        gate.raise_if_any("Invalid message envelope: ")?;
        Ok(())
    }
}

impl<T: DeserializeOwned> MessageEnvelope<T> {
    /// Parse an envelope from wire bytes.
    pub fn from_wire_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let wire: WireOwned<T> = serde_json::from_slice(bytes)?;
        let signature = wire
            .signature
            .map(|sig| {
                BASE64
                    .decode(sig.as_bytes())
                    .map_err(|e| EnvelopeError::Argument(format!("signature is not base64: {e}")))
            })
            .transpose()?;

        Ok(Self {
            version: wire.version,
            mode: wire.mode,
            message: wire.message,
            signature,
        })
    }
}
