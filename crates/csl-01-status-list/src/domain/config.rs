//! Codec configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use csl_01_status_list::domain::{CodecConfigBuilder, Compression};
//!
//! let config = CodecConfigBuilder::new()
//!     .compression(Compression::Gzip)
//!     .level(9)
//!     .build()
//!     .expect("Valid config");
//! ```

use crate::error::StatusListError;
use serde::{Deserialize, Serialize};

/// Default upper bound on decompressed payload size (16 MiB).
pub const DEFAULT_MAX_DECODED_BYTES: usize = 16 * 1024 * 1024;

/// Default DEFLATE level.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Framing written around the DEFLATE stream on encode.
///
/// Decoding always sniffs the framing, so this only affects output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// RFC 1950 zlib wrapper
    #[default]
    Zlib,
    /// RFC 1952 gzip wrapper
    Gzip,
    /// Bare RFC 1951 deflate stream
    Raw,
}

/// Base64 alphabet used on encode. Decoding accepts both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Base64Alphabet {
    /// `+` and `/`, padded with `=`
    #[default]
    Standard,
    /// `-` and `_`, no padding
    UrlSafeNoPad,
}

/// Status list codec configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    pub compression: Compression,
    /// DEFLATE level, 0 to 9
    pub level: u32,
    pub alphabet: Base64Alphabet,
    /// Reject payloads that inflate past this many bytes
    pub max_decoded_bytes: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            compression: Compression::Zlib,
            level: DEFAULT_COMPRESSION_LEVEL,
            alphabet: Base64Alphabet::Standard,
            max_decoded_bytes: DEFAULT_MAX_DECODED_BYTES,
        }
    }
}

impl CodecConfig {
    pub fn validate(&self) -> Result<(), StatusListError> {
        if self.level > 9 {
            return Err(StatusListError::Config(format!(
                "compression level {} out of range 0..=9",
                self.level
            )));
        }

        if self.max_decoded_bytes == 0 {
            return Err(StatusListError::Config(
                "max_decoded_bytes cannot be 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder-style method to set the framing
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Builder-style method to set the base64 alphabet
    pub fn with_alphabet(mut self, alphabet: Base64Alphabet) -> Self {
        self.alphabet = alphabet;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_max_decoded_bytes(mut self, max: usize) -> Self {
        self.max_decoded_bytes = max;
        self
    }
}

/// Builder for CodecConfig with validation
#[derive(Default)]
pub struct CodecConfigBuilder {
    compression: Option<Compression>,
    level: Option<u32>,
    alphabet: Option<Base64Alphabet>,
    max_decoded_bytes: Option<usize>,
}

impl CodecConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Set DEFLATE level (0-9)
    pub fn level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn alphabet(mut self, alphabet: Base64Alphabet) -> Self {
        self.alphabet = Some(alphabet);
        self
    }

    /// Set the decompression bomb limit
    pub fn max_decoded_bytes(mut self, max: usize) -> Self {
        self.max_decoded_bytes = Some(max);
        self
    }

    /// Build the CodecConfig, validating all parameters
    pub fn build(self) -> Result<CodecConfig, StatusListError> {
        let defaults = CodecConfig::default();

        let config = CodecConfig {
            compression: self.compression.unwrap_or(defaults.compression),
            level: self.level.unwrap_or(defaults.level),
            alphabet: self.alphabet.unwrap_or(defaults.alphabet),
            max_decoded_bytes: self.max_decoded_bytes.unwrap_or(defaults.max_decoded_bytes),
        };

        config.validate()?;
        Ok(config)
    }
}
