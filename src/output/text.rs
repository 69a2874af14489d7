//! Plain text report.

use super::Report;
use crate::bsuf::{DecodedEntry, EntryBody, FirmwareEntry, FirmwareHeader};
use std::io::{self, Write};

/// Write a report as text, one line per header, entry and body.
///
/// Format:
/// ```text
/// file v00000001 c:1a2b
/// ENT  00000008 t0000 c:0000  @00000016
/// T0 02160801ffffffff
/// ENT  000000a4 t0006 c:5c3e  @00000024
/// t0d00 v(1, 2, 3)        v(4, 5, 6)        v(7, 8, 9)
/// fwdata     00112233...
/// ```
pub fn write_text<W: Write>(report: &Report, mut writer: W) -> io::Result<()> {
    writeln!(
        writer,
        "file v{:08x} c:{:04x}",
        report.version, report.file_checksum
    )?;

    for decoded in &report.entries {
        write_entry(decoded, &mut writer)?;
    }

    Ok(())
}

/// Write a report as a text string.
pub fn to_text_string(report: &Report) -> io::Result<String> {
    let mut buf = Vec::new();
    write_text(report, &mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn write_entry<W: Write>(decoded: &DecodedEntry, writer: &mut W) -> io::Result<()> {
    let entry = &decoded.entry;
    writeln!(
        writer,
        "ENT  {:08x} t{:04x} c:{:04x}  @{:08x}",
        entry.size, entry.tag, entry.checksum, entry.offset
    )?;

    match &decoded.body {
        EntryBody::LegacyFirmware(fw) => {
            writeln!(writer, "t{:04x} v{}", fw.fw_type, tuple(&fw.primary_version()))?;
            write_image(fw, writer)
        }
        EntryBody::Firmware(fw) => {
            write!(writer, "t{:04x}", fw.fw_type)?;
            for version in &fw.versions {
                write!(writer, " v{:<16}", tuple(version))?;
            }
            writeln!(writer)?;
            write_image(fw, writer)
        }
        EntryBody::TarArchive { .. } | EntryBody::ThumbCode { .. } => Ok(()),
        EntryBody::Unknown { tag, payload } => {
            writeln!(writer, "UNK{} {}", tag, hex::encode(payload))
        }
        body => {
            let payload = body.raw_payload().unwrap_or_default();
            writeln!(writer, "T{} {}", body.tag(), hex::encode(payload))
        }
    }
}

fn write_image<W: Write>(fw: &FirmwareEntry, writer: &mut W) -> io::Result<()> {
    match &fw.header {
        Some(header) => write_header(header, writer),
        None => writeln!(writer, "fwdata     {}", hex::encode(&fw.preview)),
    }
}

fn write_header<W: Write>(header: &FirmwareHeader, writer: &mut W) -> io::Result<()> {
    writeln!(
        writer,
        "fw: z:{},{} c:{:04x} s:{:08x} v:{}  {}",
        header.zero,
        header.zero2,
        header.checksum,
        header.image_size,
        tuple(&header.version),
        hex::encode(&header.data)
    )
}

/// `(a, b, c)`
fn tuple(parts: &[i16]) -> String {
    let parts: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
    format!("({})", parts.join(", "))
}
