//! Domain layer: pure status list logic, no I/O.

pub mod codec;
pub mod config;
pub mod status;
pub mod status_list;

pub use codec::{pack, StatusBits, StatusCodec};
pub use config::{
    Base64Alphabet, CodecConfig, CodecConfigBuilder, Compression, DEFAULT_COMPRESSION_LEVEL,
    DEFAULT_MAX_DECODED_BYTES,
};
pub use status::{CredentialStatus, StatusStride};
pub use status_list::StatusList;
