//! Fully decoded view of a container, shared by the report formats.

use crate::bsuf::{BsufError, BsufFile, DecodeWarning, DecodedEntry};
use crate::reader::StreamReader;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub version: u32,
    pub declared_size: u32,
    pub file_checksum: u16,
    pub warnings: Vec<DecodeWarning>,
    pub entries: Vec<DecodedEntry>,
}

impl Report {
    /// Decode every entry of `bsuf`.
    pub fn from_file<R: StreamReader>(bsuf: &mut BsufFile<R>) -> Result<Self, BsufError> {
        let entries = bsuf.decoded().collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            version: bsuf.version,
            declared_size: bsuf.declared_size,
            file_checksum: bsuf.file_checksum,
            warnings: bsuf.warnings.clone(),
            entries,
        })
    }
}
