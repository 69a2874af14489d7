//! Typed entry contents.

use serde::Serialize;

use super::{serialize_hex, PayloadRange};
use crate::reader::{ReadError, StreamReader, Whence, Window};

/// Firmware subtype of the main ARM CPU image, the only one that starts
/// with a [`FirmwareHeader`].
pub const CPU_FIRMWARE: u16 = 0x0300;
/// Bytes of [`FirmwareHeader`] before its opaque data block.
pub const FIRMWARE_HEADER_FIELDS: u64 = 0x10;
/// Bytes of the firmware payload shown when there is no header.
pub const FIRMWARE_PREVIEW_LEN: usize = 128;

/// Firmware version as stored: three signed 16-bit parts.
pub type Version = [i16; 3];

/// Decoded contents of an entry, indexed by its type tag.
///
/// Payloads kept as bytes are the whole entry payload; tags 13 and 20 keep
/// only the payload range, since they are large and only ever extracted.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryBody {
    /// Tag 0: eight-byte date records.
    Type0 {
        #[serde(serialize_with = "serialize_hex")]
        payload: Vec<u8>,
    },
    /// Tag 1: modem configuration, including AT commands.
    Type1 {
        #[serde(serialize_with = "serialize_hex")]
        payload: Vec<u8>,
    },
    /// Tag 3: firmware image with a single version.
    LegacyFirmware(FirmwareEntry),
    /// Tag 6: firmware image with three versions.
    Firmware(FirmwareEntry),
    /// Tag 7: parameter writes (integer, float or string values).
    Type7 {
        #[serde(serialize_with = "serialize_hex")]
        payload: Vec<u8>,
    },
    /// Tag 13: tar archive of DSP images.
    TarArchive { payload: PayloadRange },
    /// Tag 14: a single 32-bit value.
    Type14 {
        #[serde(serialize_with = "serialize_hex")]
        payload: Vec<u8>,
    },
    Type15 {
        #[serde(serialize_with = "serialize_hex")]
        payload: Vec<u8>,
    },
    /// Tag 20: ARM thumb binary.
    ThumbCode { payload: PayloadRange },
    Type21 {
        #[serde(serialize_with = "serialize_hex")]
        payload: Vec<u8>,
    },
    Unknown {
        tag: u16,
        #[serde(serialize_with = "serialize_hex")]
        payload: Vec<u8>,
    },
}

impl EntryBody {
    /// Decode an entry's payload.
    ///
    /// `payload` must be positioned at its start; [`Entry::payload`]
    /// returns windows that are.
    ///
    /// [`Entry::payload`]: super::Entry::payload
    pub fn decode<P: StreamReader>(tag: u16, payload: &mut Window<'_, P>) -> Result<Self, ReadError> {
        let body = match tag {
            0 => EntryBody::Type0 {
                payload: payload.read(None)?,
            },
            1 => EntryBody::Type1 {
                payload: payload.read(None)?,
            },
            3 => EntryBody::LegacyFirmware(FirmwareEntry::decode(payload, 1)?),
            6 => EntryBody::Firmware(FirmwareEntry::decode(payload, 3)?),
            7 => EntryBody::Type7 {
                payload: payload.read(None)?,
            },
            13 => EntryBody::TarArchive {
                payload: window_range(payload),
            },
            14 => EntryBody::Type14 {
                payload: payload.read(None)?,
            },
            15 => EntryBody::Type15 {
                payload: payload.read(None)?,
            },
            20 => EntryBody::ThumbCode {
                payload: window_range(payload),
            },
            21 => EntryBody::Type21 {
                payload: payload.read(None)?,
            },
            tag => EntryBody::Unknown {
                tag,
                payload: payload.read(None)?,
            },
        };
        Ok(body)
    }

    /// The type tag this body was decoded from.
    pub fn tag(&self) -> u16 {
        match self {
            EntryBody::Type0 { .. } => 0,
            EntryBody::Type1 { .. } => 1,
            EntryBody::LegacyFirmware(_) => 3,
            EntryBody::Firmware(_) => 6,
            EntryBody::Type7 { .. } => 7,
            EntryBody::TarArchive { .. } => 13,
            EntryBody::Type14 { .. } => 14,
            EntryBody::Type15 { .. } => 15,
            EntryBody::ThumbCode { .. } => 20,
            EntryBody::Type21 { .. } => 21,
            EntryBody::Unknown { tag, .. } => *tag,
        }
    }

    /// Raw payload bytes, for bodies that keep them.
    pub fn raw_payload(&self) -> Option<&[u8]> {
        match self {
            EntryBody::Type0 { payload }
            | EntryBody::Type1 { payload }
            | EntryBody::Type7 { payload }
            | EntryBody::Type14 { payload }
            | EntryBody::Type15 { payload }
            | EntryBody::Type21 { payload }
            | EntryBody::Unknown { payload, .. } => Some(payload.as_slice()),
            _ => None,
        }
    }
}

/// Range from the window's current position to its end.
fn window_range<P: StreamReader>(window: &Window<'_, P>) -> PayloadRange {
    PayloadRange {
        start: window.start() + window.tell(),
        len: window.remaining().unwrap_or(0),
    }
}

/// A firmware image entry (tags 3 and 6).
#[derive(Debug, Clone, Serialize)]
pub struct FirmwareEntry {
    /// Target of the image: `0x0300` CPU, `0x0200`/`0x0800`/`0x1400`/`0x1800`
    /// DSP1, `0x0d00`/`0x0e00`/`0x1900` DSP2.
    pub fw_type: u16,
    pub versions: Vec<Version>,
    /// Image header, present for [`CPU_FIRMWARE`] images long enough to
    /// hold one.
    pub header: Option<FirmwareHeader>,
    /// Leading bytes of the image when it has no header.
    #[serde(serialize_with = "serialize_hex")]
    pub preview: Vec<u8>,
    /// The image: everything after the version fields.
    pub payload: PayloadRange,
}

impl FirmwareEntry {
    fn decode<P: StreamReader>(r: &mut Window<'_, P>, version_count: usize) -> Result<Self, ReadError> {
        let fw_type = r.read_u16_le()?;
        let versions = (0..version_count)
            .map(|_| read_version(r))
            .collect::<Result<Vec<_>, _>>()?;
        let payload = window_range(r);

        let mut image = Window::new(r, None);
        let header = if fw_type == CPU_FIRMWARE {
            match FirmwareHeader::parse(&mut image) {
                Ok(header) => Some(header),
                // too short for a header: shown and saved like any other image
                Err(ReadError::EndOfStream) => None,
                Err(e) => return Err(e),
            }
        } else {
            None
        };
        let preview = match header {
            Some(_) => Vec::new(),
            None => {
                image.seek(0, Whence::Start)?;
                image.read(Some(FIRMWARE_PREVIEW_LEN))?
            }
        };

        Ok(Self {
            fw_type,
            versions,
            header,
            preview,
            payload,
        })
    }

    /// The version used to name extracted images.
    pub fn primary_version(&self) -> Version {
        self.versions.first().copied().unwrap_or_default()
    }

    /// Offset into [`payload`](Self::payload) where the extracted image
    /// starts: CPU images drop the header fields.
    pub fn image_skip(&self) -> u64 {
        if self.fw_type == CPU_FIRMWARE {
            FIRMWARE_HEADER_FIELDS
        } else {
            0
        }
    }
}

fn read_version<R: StreamReader>(r: &mut R) -> Result<Version, ReadError> {
    Ok([r.read_i16_le()?, r.read_i16_le()?, r.read_i16_le()?])
}

/// Header at the start of CPU firmware images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirmwareHeader {
    pub zero: u32,
    pub checksum: u16,
    pub zero2: u16,
    pub image_size: u32,
    pub version: [i16; 2],
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
}

impl FirmwareHeader {
    pub const DATA_LEN: usize = 128;

    /// Parse a header at local offset 0 of `r`.
    pub fn parse<R: StreamReader>(r: &mut R) -> Result<Self, ReadError> {
        r.seek(0, Whence::Start)?;
        Ok(Self {
            zero: r.read_u32_le()?,
            checksum: r.read_u16_le()?,
            zero2: r.read_u16_le()?,
            image_size: r.read_u32_le()?,
            version: [r.read_i16_le()?, r.read_i16_le()?],
            data: r.read_exact(Self::DATA_LEN)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsuf::{build, BsufFile};
    use crate::reader::DataReader;

    fn decode_single(tag: u16, payload: &[u8]) -> EntryBody {
        let bytes = build::container(&[build::entry(tag, payload)]);
        let mut bsuf = BsufFile::from_bytes(bytes).unwrap();
        let entry = bsuf.entries[0];
        bsuf.decode(&entry).unwrap().body
    }

    #[test]
    fn test_firmware_header() {
        let bytes = build::firmware_header(0x1234, 0x100, [1, 2], &[0u8; 128]);
        let header = FirmwareHeader::parse(&mut DataReader::new(bytes)).unwrap();
        assert_eq!(header.version, [1, 2]);
        assert_eq!(header.image_size, 256);
        assert_eq!(header.checksum, 0x1234);
        assert_eq!((header.zero, header.zero2), (0, 0));
        assert_eq!(header.data, vec![0u8; 128]);
    }

    #[test]
    fn test_firmware_header_too_short() {
        let bytes = build::firmware_header(0, 0, [0, 0], &[0u8; 128]);
        let mut parent = DataReader::new(bytes);
        let mut window = Window::at(&mut parent, 0, Some(0x50)).unwrap();
        assert!(matches!(
            FirmwareHeader::parse(&mut window),
            Err(ReadError::EndOfStream)
        ));
    }

    #[test]
    fn test_legacy_cpu_firmware() {
        let mut data = [0u8; 128];
        data[0] = 0xee;
        let mut image = build::firmware_header(0xbeef, 0x200, [3, -1], &data);
        image.extend_from_slice(b"CODE");
        let payload = build::firmware_payload(CPU_FIRMWARE, &[[4, 5, 6]], &image);

        match decode_single(3, &payload) {
            EntryBody::LegacyFirmware(fw) => {
                assert_eq!(fw.fw_type, CPU_FIRMWARE);
                assert_eq!(fw.versions, vec![[4, 5, 6]]);
                let header = fw.header.unwrap();
                assert_eq!(header.version, [3, -1]);
                assert_eq!(header.image_size, 0x200);
                assert_eq!(header.data[0], 0xee);
                assert!(fw.preview.is_empty());
                // payload starts after subtype and one version
                assert_eq!(fw.payload.start, 0x16 + 8);
                assert_eq!(fw.payload.len, image.len() as u64);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_dsp_firmware_preview() {
        let image: Vec<u8> = (0..=199).collect();
        let payload = build::firmware_payload(0x0d00, &[[1, 2, 3], [4, 5, 6], [-7, 8, 9]], &image);

        match decode_single(6, &payload) {
            EntryBody::Firmware(fw) => {
                assert_eq!(fw.fw_type, 0x0d00);
                assert_eq!(fw.versions, vec![[1, 2, 3], [4, 5, 6], [-7, 8, 9]]);
                assert_eq!(fw.primary_version(), [1, 2, 3]);
                assert!(fw.header.is_none());
                assert_eq!(fw.preview, image[..128]);
                assert_eq!(fw.payload.len, 200);
                assert_eq!(fw.image_skip(), 0);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_short_image_preview_is_clamped() {
        let payload = build::firmware_payload(0x0200, &[[0, 0, 1]], b"tiny");
        match decode_single(3, &payload) {
            EntryBody::LegacyFirmware(fw) => assert_eq!(fw.preview, b"tiny"),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_cpu_firmware_without_room_for_header() {
        let image: Vec<u8> = (0..20).collect();
        let payload = build::firmware_payload(CPU_FIRMWARE, &[[1, 1, 1]; 3], &image);
        match decode_single(6, &payload) {
            EntryBody::Firmware(fw) => {
                assert!(fw.header.is_none());
                assert_eq!(fw.preview, image);
                assert_eq!(fw.payload.len, 20);
                assert_eq!(fw.image_skip(), FIRMWARE_HEADER_FIELDS);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_opaque_and_unknown() {
        match decode_single(13, b"tar data") {
            EntryBody::TarArchive { payload } => {
                assert_eq!(payload, PayloadRange { start: 0x16, len: 8 })
            }
            other => panic!("unexpected body {other:?}"),
        }

        let body = decode_single(20, b"thumb");
        assert_eq!(body.tag(), 20);
        assert!(body.raw_payload().is_none());

        let body = decode_single(99, b"\x01\x02");
        assert_eq!(body.tag(), 99);
        assert_eq!(body.raw_payload(), Some(&[1u8, 2][..]));

        for tag in [0, 1, 7, 14, 15, 21] {
            let body = decode_single(tag, b"raw");
            assert_eq!(body.tag(), tag);
            assert_eq!(body.raw_payload(), Some(&b"raw"[..]));
        }
    }
}
