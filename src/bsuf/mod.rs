//! SolarEdge `.bsuf` firmware update containers.
//!
//! ## Layout
//! ```text
//! [0x00] Magic 0x663919145fab6655      (u64 LE)
//! [0x08] Version                       (u32 LE)
//! [0x0C] DeclaredSize                  (u32 LE, file size - 0x12)
//! [0x10] Entries, until DeclaredSize + 0x10:
//!        Size     (u32 LE, payload only)
//!        Type     (u16 LE)
//!        Payload  (Size bytes)
//!        Checksum (u16 LE)
//! [....] FileChecksum                  (u16 LE)
//! ```
//!
//! Checksums are stored but not verified.

mod container;
mod entry;
mod save;

pub use container::*;
pub use entry::*;
pub use save::*;

use crate::reader::ReadError;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors that abort decoding or extraction of a file.
#[derive(Error, Debug)]
pub enum BsufError {
    #[error("Invalid header magic: 0x{found:016x}")]
    InvalidMagic { found: u64 },

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No free file name for {prefix}-NNN.dat after {attempts} attempts")]
    ResourceExhausted { prefix: String, attempts: u32 },
}

/// Problems found while decoding that do not stop it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodeWarning {
    #[error("unexpected filesize stored:{declared:08x} != real:{actual:08x}")]
    SizeMismatch { declared: u32, actual: u64 },
}

/// Serialize bytes as a lowercase hex string.
pub(crate) fn serialize_hex<T: AsRef<[u8]>, S: Serializer>(
    bytes: T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}
