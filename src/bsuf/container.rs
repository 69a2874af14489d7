//! Container header and entry framing.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Serialize;

use super::{BsufError, DecodeWarning, EntryBody};
use crate::reader::{DataReader, FileReader, ReadError, StreamReader, Window};

/// Header magic.
pub const MAGIC: u64 = 0x663919145fab6655;
/// Magic, version and declared size.
pub const HEADER_SIZE: u64 = 0x10;
/// Trailing file checksum.
pub const TRAILER_SIZE: u64 = 2;

/// A byte range of the container, in the coordinates of its reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PayloadRange {
    pub start: u64,
    pub len: u64,
}

impl PayloadRange {
    /// Open a bounded window over this range, positioned at its start.
    pub fn open<'a, R: StreamReader>(&self, reader: &'a mut R) -> Result<Window<'a, R>, ReadError> {
        Window::at(reader, self.start, Some(self.len))
    }
}

/// Framing of one container entry. The payload is not read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Payload length in bytes.
    pub size: u32,
    #[serde(rename = "type")]
    pub tag: u16,
    /// Container offset of the first payload byte.
    pub offset: u64,
    pub checksum: u16,
}

impl Entry {
    /// Read one entry's framing and step over its payload.
    pub fn parse<R: StreamReader>(r: &mut R) -> Result<Self, ReadError> {
        let size = r.read_u32_le()?;
        let tag = r.read_u16_le()?;
        let offset = r.tell();

        r.skip(size as i64)?;
        let checksum = r.read_u16_le()?;

        Ok(Self {
            size,
            tag,
            offset,
            checksum,
        })
    }

    pub fn payload_range(&self) -> PayloadRange {
        PayloadRange {
            start: self.offset,
            len: self.size as u64,
        }
    }

    /// Window over the payload, positioned at its first byte.
    pub fn payload<'a, R: StreamReader>(&self, reader: &'a mut R) -> Result<Window<'a, R>, ReadError> {
        self.payload_range().open(reader)
    }
}

/// An entry together with its decoded contents.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedEntry {
    #[serde(flatten)]
    pub entry: Entry,
    pub body: EntryBody,
}

/// A parsed `.bsuf` container.
///
/// Parsing reads the header and the framing of every entry. Entry
/// contents are decoded on demand through [`decode`](Self::decode) or
/// [`decoded`](Self::decoded), each time from a freshly positioned window.
#[derive(Debug)]
pub struct BsufFile<R> {
    reader: R,
    pub version: u32,
    /// Payload size from the header; the file should be 0x12 bytes longer.
    pub declared_size: u32,
    /// Entries in file order.
    pub entries: Vec<Entry>,
    pub file_checksum: u16,
    pub warnings: Vec<DecodeWarning>,
}

impl<R: StreamReader> BsufFile<R> {
    /// Parse the container starting at the reader's current position.
    ///
    /// The size check and the entry bounds are relative to that position;
    /// entry offsets stay in the reader's coordinates.
    pub fn parse(mut reader: R) -> Result<Self, BsufError> {
        let base = reader.tell();
        let magic = reader.read_u64_le()?;
        if magic != MAGIC {
            return Err(BsufError::InvalidMagic { found: magic });
        }
        let version = reader.read_u32_le()?;
        let declared_size = reader.read_u32_le()?;

        let mut warnings = Vec::new();
        let expected = declared_size as u64 + HEADER_SIZE + TRAILER_SIZE;
        if let Some(actual) = reader.size().map(|size| size.saturating_sub(base)) {
            if actual != expected {
                warnings.push(DecodeWarning::SizeMismatch {
                    declared: declared_size,
                    actual,
                });
            }
        }

        let end = base + declared_size as u64 + HEADER_SIZE;
        let mut entries = Vec::new();
        while reader.tell() < end {
            entries.push(Entry::parse(&mut reader)?);
        }

        let file_checksum = reader.read_u16_le()?;

        Ok(Self {
            reader,
            version,
            declared_size,
            entries,
            file_checksum,
            warnings,
        })
    }

    /// Decode one entry's contents.
    pub fn decode(&mut self, entry: &Entry) -> Result<DecodedEntry, BsufError> {
        decode_entry(&mut self.reader, entry)
    }

    /// Decode every entry, in file order.
    pub fn decoded(&mut self) -> Decoded<'_, R> {
        Decoded {
            reader: &mut self.reader,
            entries: self.entries.iter(),
        }
    }

    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl BsufFile<DataReader<Vec<u8>>> {
    /// Parse from an in-memory copy of the file.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, BsufError> {
        Self::parse(DataReader::new(bytes))
    }
}

impl BsufFile<FileReader<BufReader<File>>> {
    /// Open and parse a file.
    pub fn open(path: &Path) -> Result<Self, BsufError> {
        let file = File::open(path)?;
        Self::parse(FileReader::new(BufReader::new(file))?)
    }
}

fn decode_entry<R: StreamReader>(reader: &mut R, entry: &Entry) -> Result<DecodedEntry, BsufError> {
    let mut payload = entry.payload(reader)?;
    let body = EntryBody::decode(entry.tag, &mut payload)?;
    Ok(DecodedEntry {
        entry: *entry,
        body,
    })
}

/// Iterator returned by [`BsufFile::decoded`].
pub struct Decoded<'a, R> {
    reader: &'a mut R,
    entries: std::slice::Iter<'a, Entry>,
}

impl<R: StreamReader> Iterator for Decoded<'_, R> {
    type Item = Result<DecodedEntry, BsufError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        Some(decode_entry(&mut *self.reader, entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}
