//! # Status List Codec
//!
//! `EncodedRegistry = base64(DEFLATE(packed bits))`.
//!
//! Bits are packed most significant bit first: byte `i` holds logical bits
//! `[8i, 8i + 8)` and bit `8i` is `0x80`. Decoding sniffs the compression
//! framing (gzip, zlib or bare DEFLATE) and accepts both base64 alphabets,
//! padded or not, so registries produced elsewhere decode unchanged.
//!
//! Encode-side byte parity with other DEFLATE implementations is not
//! guaranteed: identical logical content may compress to different bytes.

use std::io::{Read, Write};

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use bitvec::prelude::*;
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use tracing::{debug, trace};

use super::config::{Base64Alphabet, CodecConfig, Compression};
use crate::error::StatusListError;

/// Packed status bits, MSB-first within each byte.
pub type StatusBits = BitVec<u8, Msb0>;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression framing recognised on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Gzip,
    Zlib,
    Raw,
}

/// Encoder/decoder for the compressed status list wire format.
#[derive(Debug, Clone, Default)]
pub struct StatusCodec {
    config: CodecConfig,
}

impl StatusCodec {
    /// Create a codec, validating the configuration.
    pub fn new(config: CodecConfig) -> Result<Self, StatusListError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Pack, compress and base64-encode a bit vector.
    ///
    /// Trailing bits are zero-padded to the byte boundary.
    pub fn encode(&self, bits: &BitSlice<u8, Msb0>) -> Result<String, StatusListError> {
        self.encode_bytes(&pack(bits))
    }

    /// Compress and base64-encode already packed bytes.
    pub fn encode_bytes(&self, bytes: &[u8]) -> Result<String, StatusListError> {
        let compressed = self.compress(bytes)?;
        let encoded = match self.config.alphabet {
            Base64Alphabet::Standard => STANDARD.encode(&compressed),
            Base64Alphabet::UrlSafeNoPad => URL_SAFE_NO_PAD.encode(&compressed),
        };

        trace!(
            packed = bytes.len(),
            compressed = compressed.len(),
            "Encoded status list"
        );
        Ok(encoded)
    }

    /// Decode to bits. Length is always a multiple of 8.
    pub fn decode(&self, encoded: &str) -> Result<StatusBits, StatusListError> {
        Ok(StatusBits::from_vec(self.decode_bytes(encoded)?))
    }

    /// Decode to the packed byte buffer.
    pub fn decode_bytes(&self, encoded: &str) -> Result<Vec<u8>, StatusListError> {
        let compressed = decode_base64(encoded)?;
        if compressed.is_empty() {
            return Err(StatusListError::Format("empty encoded status list".into()));
        }

        let framing = sniff(&compressed);
        let limit = self.config.max_decoded_bytes;
        let bytes = match framing {
            Framing::Gzip => inflate(GzDecoder::new(compressed.as_slice()), limit),
            // A raw stream can start with bytes that pass the zlib header check.
            Framing::Zlib => match inflate(ZlibDecoder::new(compressed.as_slice()), limit) {
                Err(Inflate::Corrupt(reason)) => {
                    debug!(%reason, "zlib framing rejected, retrying as raw deflate");
                    inflate(DeflateDecoder::new(compressed.as_slice()), limit)
                }
                other => other,
            },
            Framing::Raw => inflate(DeflateDecoder::new(compressed.as_slice()), limit),
        }
        .map_err(|e| match e {
            Inflate::Corrupt(reason) => {
                StatusListError::Format(format!("invalid compressed stream: {reason}"))
            }
            Inflate::TooLarge => {
                StatusListError::Format(format!("decoded status list exceeds {limit} bytes"))
            }
        })?;

        trace!(?framing, packed = bytes.len(), "Decoded status list");
        Ok(bytes)
    }

    fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>, StatusListError> {
        let level = flate2::Compression::new(self.config.level);
        let result = match self.config.compression {
            Compression::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), level);
                encoder.write_all(bytes).and_then(|()| encoder.finish())
            }
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), level);
                encoder.write_all(bytes).and_then(|()| encoder.finish())
            }
            Compression::Raw => {
                let mut encoder = DeflateEncoder::new(Vec::new(), level);
                encoder.write_all(bytes).and_then(|()| encoder.finish())
            }
        };
        result.map_err(|e| StatusListError::Format(format!("compression failed: {e}")))
    }
}

/// Pack bits into bytes, MSB first, zero-padding the final byte.
pub fn pack(bits: &BitSlice<u8, Msb0>) -> Vec<u8> {
    let mut out = vec![0u8; bits.len().div_ceil(8)];
    for i in bits.iter_ones() {
        out[i / 8] |= 0x80 >> (i % 8);
    }
    out
}

/// Accept standard or URL-safe alphabets, with or without padding.
fn decode_base64(encoded: &str) -> Result<Vec<u8>, StatusListError> {
    let normalized: String = encoded
        .trim()
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    STANDARD_NO_PAD
        .decode(normalized.trim_end_matches('='))
        .map_err(|e| StatusListError::Format(format!("invalid base64: {e}")))
}

fn sniff(bytes: &[u8]) -> Framing {
    if bytes.len() >= 2 && bytes[..2] == GZIP_MAGIC {
        return Framing::Gzip;
    }
    if bytes.len() >= 2 && is_zlib_header(bytes[0], bytes[1]) {
        return Framing::Zlib;
    }
    Framing::Raw
}

/// RFC 1950: CM = 8, CINFO <= 7, FCHECK makes the header a multiple of 31,
/// no preset dictionary.
fn is_zlib_header(cmf: u8, flg: u8) -> bool {
    cmf & 0x0f == 8
        && cmf >> 4 <= 7
        && ((u16::from(cmf) << 8) | u16::from(flg)) % 31 == 0
        && flg & 0x20 == 0
}

enum Inflate {
    Corrupt(std::io::Error),
    TooLarge,
}

fn inflate<R: Read>(decoder: R, limit: usize) -> Result<Vec<u8>, Inflate> {
    let mut out = Vec::new();
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    decoder
        .take(cap)
        .read_to_end(&mut out)
        .map_err(Inflate::Corrupt)?;

    if out.len() > limit {
        return Err(Inflate::TooLarge);
    }
    Ok(out)
}
