//! Extraction of entry payloads to files.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{BsufError, BsufFile, DecodedEntry, EntryBody, FirmwareEntry, PayloadRange, Version};
use crate::reader::{StreamReader, Whence};

/// Candidate indices tried for `{prefix}-NNN.dat` names.
pub const UNIQUE_ATTEMPTS: u32 = 100;
const COPY_CHUNK: usize = 0x10000;

/// Result of saving one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written(PathBuf),
    /// A firmware file with the same name exists and was left alone.
    AlreadySaved(PathBuf),
    /// The entry type is not extracted.
    Skipped,
}

/// `fw{type}-{a}.{b}.{c}.bin`
pub fn firmware_file_name(fw_type: u16, version: Version) -> String {
    format!(
        "fw{:04x}-{}.{}.{}.bin",
        fw_type, version[0], version[1], version[2]
    )
}

/// Copy `src` to `dst` until a read comes back empty.
///
/// `src` should be a bounded window; an unbounded reader fails on its last
/// partial chunk.
pub fn copy_stream<R: StreamReader, W: Write>(src: &mut R, dst: &mut W) -> Result<u64, BsufError> {
    let mut total = 0;
    loop {
        let chunk = src.read(Some(COPY_CHUNK))?;
        if chunk.is_empty() {
            break;
        }
        dst.write_all(&chunk)?;
        total += chunk.len() as u64;
    }
    Ok(total)
}

/// Create `path`, or `None` if it already exists.
fn create_new(path: &Path) -> io::Result<Option<File>> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(e),
    }
}

fn write_range<R: StreamReader>(
    reader: &mut R,
    range: PayloadRange,
    skip: u64,
    file: File,
) -> Result<(), BsufError> {
    let mut window = range.open(reader)?;
    window.seek(skip as i64, Whence::Start)?;
    let mut writer = BufWriter::new(file);
    copy_stream(&mut window, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// [`write_range`] into a freshly created `path`, removing it again if the
/// copy fails so a later run does not mistake it for a finished file.
fn write_new<R: StreamReader>(
    reader: &mut R,
    range: PayloadRange,
    skip: u64,
    file: File,
    path: &Path,
) -> Result<(), BsufError> {
    let result = write_range(reader, range, skip, file);
    if result.is_err() {
        fs::remove_file(path).ok();
    }
    result
}

/// Save a firmware image under its type and primary version.
pub fn save_firmware<R: StreamReader>(
    reader: &mut R,
    dir: &Path,
    fw: &FirmwareEntry,
) -> Result<SaveOutcome, BsufError> {
    let path = dir.join(firmware_file_name(fw.fw_type, fw.primary_version()));
    let Some(file) = create_new(&path)? else {
        return Ok(SaveOutcome::AlreadySaved(path));
    };
    write_new(reader, fw.payload, fw.image_skip(), file, &path)?;
    Ok(SaveOutcome::Written(path))
}

/// Save a range to the first free `{prefix}-NNN.dat` in `dir`.
pub fn save_unique<R: StreamReader>(
    reader: &mut R,
    dir: &Path,
    prefix: &str,
    range: PayloadRange,
) -> Result<SaveOutcome, BsufError> {
    for index in 0..UNIQUE_ATTEMPTS {
        let path = dir.join(format!("{prefix}-{index:03}.dat"));
        if let Some(file) = create_new(&path)? {
            write_new(reader, range, 0, file, &path)?;
            return Ok(SaveOutcome::Written(path));
        }
    }
    Err(BsufError::ResourceExhausted {
        prefix: prefix.to_string(),
        attempts: UNIQUE_ATTEMPTS,
    })
}

impl EntryBody {
    /// Extract this entry into `dir`, reading its data from `reader`.
    pub fn save<R: StreamReader>(&self, reader: &mut R, dir: &Path) -> Result<SaveOutcome, BsufError> {
        match self {
            EntryBody::LegacyFirmware(fw) | EntryBody::Firmware(fw) => save_firmware(reader, dir, fw),
            EntryBody::TarArchive { payload } | EntryBody::ThumbCode { payload } => {
                save_unique(reader, dir, &format!("t{}", self.tag()), *payload)
            }
            _ => Ok(SaveOutcome::Skipped),
        }
    }
}

impl<R: StreamReader> BsufFile<R> {
    /// Extract one decoded entry into `dir`.
    pub fn save(&mut self, decoded: &DecodedEntry, dir: &Path) -> Result<SaveOutcome, BsufError> {
        decoded.body.save(self.reader_mut(), dir)
    }

    /// Decode and extract every entry, in file order.
    pub fn save_all(&mut self, dir: &Path) -> Result<Vec<(DecodedEntry, SaveOutcome)>, BsufError> {
        let mut results = Vec::with_capacity(self.entries.len());
        for entry in self.entries.clone() {
            let decoded = self.decode(&entry)?;
            let outcome = self.save(&decoded, dir)?;
            results.push((decoded, outcome));
        }
        Ok(results)
    }
}
