//! Credential lifecycle states and the stride policy that packs them.
//!
//! One `CredentialStatus` type serves both registry flavours; the
//! [`StatusStride`] chosen at construction decides how many bits an entry
//! takes and which states it can hold.
//!
//! | Status    | 1-bit | 2-bit |
//! |-----------|-------|-------|
//! | ACTIVE    | `0`   | `00`  |
//! | RESUMED   |  n/a  | `01`  |
//! | SUSPENDED |  n/a  | `10`  |
//! | REVOKED   | `1`   | `11`  |
//!
//! For 2-bit entries the first bit of the field is the high bit of the code.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StatusListError;

/// Lifecycle state of one credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CredentialStatus {
    /// Issued and in good standing. Default for every unset entry.
    Active,
    Revoked,
    Suspended,
    /// Re-activated after a suspension.
    Resumed,
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialStatus::Active => write!(f, "ACTIVE"),
            CredentialStatus::Revoked => write!(f, "REVOKED"),
            CredentialStatus::Suspended => write!(f, "SUSPENDED"),
            CredentialStatus::Resumed => write!(f, "RESUMED"),
        }
    }
}

/// Bit-width stride of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum StatusStride {
    /// Revocation list: revoked or not.
    OneBit,
    /// Four-state status list.
    TwoBit,
}

impl StatusStride {
    /// Bits per entry.
    #[must_use]
    pub const fn bits(self) -> usize {
        match self {
            StatusStride::OneBit => 1,
            StatusStride::TwoBit => 2,
        }
    }

    /// Code stored for `status`.
    pub fn encode(self, status: CredentialStatus) -> Result<u8, StatusListError> {
        match (self, status) {
            (_, CredentialStatus::Active) => Ok(0b00),
            (StatusStride::OneBit, CredentialStatus::Revoked) => Ok(0b1),
            (StatusStride::OneBit, CredentialStatus::Resumed) => Ok(0b0),
            (StatusStride::OneBit, CredentialStatus::Suspended) => {
                Err(StatusListError::UnsupportedStatus {
                    status,
                    stride: self.bits(),
                })
            }
            (StatusStride::TwoBit, CredentialStatus::Resumed) => Ok(0b01),
            (StatusStride::TwoBit, CredentialStatus::Suspended) => Ok(0b10),
            (StatusStride::TwoBit, CredentialStatus::Revoked) => Ok(0b11),
        }
    }

    /// Status represented by `code` (only the low `bits()` bits are read).
    #[must_use]
    pub fn decode(self, code: u8) -> CredentialStatus {
        match self {
            StatusStride::OneBit => {
                if code & 0b1 == 1 {
                    CredentialStatus::Revoked
                } else {
                    CredentialStatus::Active
                }
            }
            StatusStride::TwoBit => match code & 0b11 {
                0b00 => CredentialStatus::Active,
                0b01 => CredentialStatus::Resumed,
                0b10 => CredentialStatus::Suspended,
                _ => CredentialStatus::Revoked,
            },
        }
    }
}

impl From<StatusStride> for u8 {
    fn from(stride: StatusStride) -> Self {
        stride.bits() as u8
    }
}

impl TryFrom<u8> for StatusStride {
    type Error = StatusListError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            1 => Ok(StatusStride::OneBit),
            2 => Ok(StatusStride::TwoBit),
            other => Err(StatusListError::InvalidStride(other)),
        }
    }
}
