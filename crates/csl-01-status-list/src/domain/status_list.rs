//! # Status List
//!
//! A logically unbounded vector of fixed-width status entries. Physically
//! only the shortest byte-aligned prefix covering every written entry is
//! stored; anything past it reads as [`CredentialStatus::Active`].
//!
//! Entry `i` occupies bits `[i, i + stride)`, so indices must be multiples of
//! the stride. There is no internal locking: one writer at a time.

use bitvec::prelude::*;

use super::codec::{StatusBits, StatusCodec};
use super::status::{CredentialStatus, StatusStride};
use crate::error::StatusListError;

/// Bit-packed credential status registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusList {
    bits: StatusBits,
    stride: StatusStride,
}

impl StatusList {
    /// Empty registry.
    pub fn new(stride: StatusStride) -> Self {
        Self {
            bits: StatusBits::new(),
            stride,
        }
    }

    /// Registry pre-sized for `entries` entries, all ACTIVE.
    pub fn with_capacity(stride: StatusStride, entries: usize) -> Self {
        let len = entries.saturating_mul(stride.bits()).div_ceil(8) * 8;
        Self {
            bits: StatusBits::repeat(false, len),
            stride,
        }
    }

    /// Wrap an already packed buffer.
    pub fn from_bytes(stride: StatusStride, bytes: Vec<u8>) -> Self {
        Self {
            bits: StatusBits::from_vec(bytes),
            stride,
        }
    }

    /// Decode an encoded registry with the default codec.
    pub fn from_encoded(stride: StatusStride, encoded: &str) -> Result<Self, StatusListError> {
        Self::from_encoded_with(&StatusCodec::default(), stride, encoded)
    }

    pub fn from_encoded_with(
        codec: &StatusCodec,
        stride: StatusStride,
        encoded: &str,
    ) -> Result<Self, StatusListError> {
        Ok(Self::from_bytes(stride, codec.decode_bytes(encoded)?))
    }

    /// Encode with the default codec.
    pub fn serialize(&self) -> Result<String, StatusListError> {
        self.serialize_with(&StatusCodec::default())
    }

    pub fn serialize_with(&self, codec: &StatusCodec) -> Result<String, StatusListError> {
        codec.encode(&self.bits)
    }

    pub fn stride(&self) -> StatusStride {
        self.stride
    }

    /// Stored length in bits (always a multiple of 8).
    pub fn physical_len_bits(&self) -> usize {
        self.bits.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }

    /// Status at `index`; ACTIVE past the physical end.
    pub fn get(&self, index: usize) -> Result<CredentialStatus, StatusListError> {
        self.check_alignment(index)?;

        let width = self.stride.bits();
        let Some(field) = index
            .checked_add(width)
            .and_then(|end| self.bits.get(index..end))
        else {
            return Ok(CredentialStatus::Active);
        };

        Ok(self.stride.decode(field.load_be::<u8>()))
    }

    /// Overwrite the entry at `index`, growing storage if needed.
    pub fn set(&mut self, index: usize, status: CredentialStatus) -> Result<(), StatusListError> {
        self.check_alignment(index)?;
        let code = self.stride.encode(status)?;

        let width = self.stride.bits();
        let end = index
            .checked_add(width)
            .ok_or(StatusListError::IndexOutOfRange { index })?;

        if end > self.bits.len() {
            self.bits.resize(end.div_ceil(8) * 8, false);
        }

        self.bits[index..end].store_be::<u8>(code);
        Ok(())
    }

    pub fn issue(&mut self, index: usize) -> Result<(), StatusListError> {
        self.set(index, CredentialStatus::Active)
    }

    pub fn revoke(&mut self, index: usize) -> Result<(), StatusListError> {
        self.set(index, CredentialStatus::Revoked)
    }

    /// Fails with `UnsupportedStatus` on a 1-bit list.
    pub fn suspend(&mut self, index: usize) -> Result<(), StatusListError> {
        self.set(index, CredentialStatus::Suspended)
    }

    pub fn resume(&mut self, index: usize) -> Result<(), StatusListError> {
        self.set(index, CredentialStatus::Resumed)
    }

    /// Alias of [`StatusList::get`].
    pub fn resolve(&self, index: usize) -> Result<CredentialStatus, StatusListError> {
        self.get(index)
    }

    /// Number of stored entries in `status`. Entries past the physical end
    /// are not counted.
    pub fn count(&self, status: CredentialStatus) -> usize {
        self.bits
            .chunks_exact(self.stride.bits())
            .filter(|field| self.stride.decode(field.load_be::<u8>()) == status)
            .count()
    }

    fn check_alignment(&self, index: usize) -> Result<(), StatusListError> {
        let stride = self.stride.bits();
        if index % stride != 0 {
            return Err(StatusListError::Alignment { index, stride });
        }
        Ok(())
    }
}
